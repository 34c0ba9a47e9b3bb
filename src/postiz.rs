/// Defines the Postiz installation: where it is served, where it
/// is cloned to, and the ports its containers listen on.
///
/// # Example
///
/// ```
/// use postiz_deploy::Postiz;
///
/// let postiz = Postiz::new("postiz.example.com", "admin@example.com")
///     .install_dir("/srv/postiz")
///     .branch("v1.40.0");
///
/// assert_eq!(postiz.frontend_url(), "https://postiz.example.com");
/// assert_eq!(postiz.backend_url(), "https://api.postiz.example.com");
/// assert_eq!(postiz.env_path(), "/srv/postiz/.env.production");
/// ```
#[derive(Debug, Clone)]
pub struct Postiz {
    pub domain: String,
    pub email: String,
    pub install_dir: String,
    pub repository: String,
    pub branch: String,
    pub frontend_port: u16,
    pub backend_port: u16,
    pub upload_dir: String,
    pub db_name: String,
    pub db_user: String,
}

pub const DEFAULT_REPOSITORY: &str = "https://github.com/gitroomhq/postiz-app.git";
pub const DEFAULT_INSTALL_DIR: &str = "/opt/postiz";
pub const ENV_FILE_NAME: &str = ".env.production";

impl Postiz {
    #[must_use]
    pub fn new(domain: &str, email: &str) -> Self {
        Self {
            domain: domain.to_string(),
            email: email.to_string(),
            install_dir: DEFAULT_INSTALL_DIR.to_string(),
            repository: DEFAULT_REPOSITORY.to_string(),
            branch: "main".to_string(),
            frontend_port: 4200,
            backend_port: 3000,
            upload_dir: "/uploads".to_string(),
            db_name: "postiz".to_string(),
            db_user: "postiz".to_string(),
        }
    }

    #[must_use]
    pub fn install_dir(mut self, dir: &str) -> Self {
        self.install_dir = dir.trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn repository(mut self, url: &str) -> Self {
        self.repository = url.to_string();
        self
    }

    #[must_use]
    pub fn branch(mut self, branch: &str) -> Self {
        self.branch = branch.to_string();
        self
    }

    #[must_use]
    pub const fn frontend_port(mut self, port: u16) -> Self {
        self.frontend_port = port;
        self
    }

    #[must_use]
    pub const fn backend_port(mut self, port: u16) -> Self {
        self.backend_port = port;
        self
    }

    #[must_use]
    pub fn upload_dir(mut self, dir: &str) -> Self {
        self.upload_dir = dir.to_string();
        self
    }

    #[must_use]
    pub fn api_domain(&self) -> String {
        format!("api.{}", self.domain)
    }

    #[must_use]
    pub fn frontend_url(&self) -> String {
        format!("https://{}", self.domain)
    }

    #[must_use]
    pub fn backend_url(&self) -> String {
        format!("https://{}", self.api_domain())
    }

    #[must_use]
    pub fn backend_internal_url(&self) -> String {
        format!("http://localhost:{}", self.backend_port)
    }

    #[must_use]
    pub fn env_path(&self) -> String {
        format!("{}/{ENV_FILE_NAME}", self.install_dir)
    }

    #[must_use]
    pub fn update_script_path(&self) -> String {
        format!("{}/update-postiz.sh", self.install_dir)
    }
}
