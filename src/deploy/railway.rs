use crate::cmd::Runner;
use crate::deploy::Deployer;
use crate::error::{DeployError, DeployResult};
use crate::postiz::Postiz;
use crate::secrets::Secrets;

/// Railway reference to the managed Postgres connection string.
pub const POSTGRES_URL_REF: &str = "${{Postgres.DATABASE_URL}}";

/// Railway reference to the managed Redis connection string.
pub const REDIS_URL_REF: &str = "${{Redis.REDIS_URL}}";

/// Deploy Postiz to Railway with managed Postgres and Redis.
///
/// The backend and frontend services must already exist in the
/// linked project under the configured names.
///
/// # Example
///
/// ```
/// use postiz_deploy::Railway;
///
/// let railway = Railway::new().backend_service("api");
///
/// assert_eq!(railway.backend_service, "api");
/// assert_eq!(railway.frontend_service, "postiz-frontend");
/// ```
pub struct Railway {
    pub backend_service: String,
    pub frontend_service: String,
}

impl Railway {
    #[must_use]
    pub fn new() -> Self {
        Self {
            backend_service: "postiz-backend".to_string(),
            frontend_service: "postiz-frontend".to_string(),
        }
    }

    #[must_use]
    pub fn backend_service(mut self, name: &str) -> Self {
        self.backend_service = name.to_string();
        self
    }

    #[must_use]
    pub fn frontend_service(mut self, name: &str) -> Self {
        self.frontend_service = name.to_string();
        self
    }

    /// Variables set on the backend service.
    #[must_use]
    pub fn backend_variables(postiz: &Postiz, jwt_secret: &str) -> Vec<(String, String)> {
        vec![
            ("DATABASE_URL".into(), POSTGRES_URL_REF.into()),
            ("REDIS_URL".into(), REDIS_URL_REF.into()),
            ("JWT_SECRET".into(), jwt_secret.to_string()),
            ("FRONTEND_URL".into(), postiz.frontend_url()),
            ("NEXT_PUBLIC_BACKEND_URL".into(), postiz.backend_url()),
            ("BACKEND_INTERNAL_URL".into(), postiz.backend_internal_url()),
            ("STORAGE_PROVIDER".into(), "local".into()),
            ("UPLOAD_DIRECTORY".into(), postiz.upload_dir.clone()),
            ("IS_GENERAL".into(), "true".into()),
        ]
    }

    /// Variables set on the frontend service.
    #[must_use]
    pub fn frontend_variables(postiz: &Postiz) -> Vec<(String, String)> {
        vec![
            ("FRONTEND_URL".into(), postiz.frontend_url()),
            ("NEXT_PUBLIC_BACKEND_URL".into(), postiz.backend_url()),
            ("BACKEND_INTERNAL_URL".into(), postiz.backend_internal_url()),
        ]
    }

    /// Link the working directory to a project unless it already
    /// is.
    fn link(runner: &dyn Runner) -> DeployResult<()> {
        if let Some(project) = runner
            .run("railway", &["status", "--json"])
            .ok()
            .and_then(|out| linked_project(&out))
        {
            tracing::info!("Already linked to Railway project '{project}'");
            return Ok(());
        }

        tracing::info!("Linking Railway project...");
        runner.run_interactive("railway", &["link"])
    }

    /// Add a managed database. Failure only warns: the database
    /// may already exist in the project.
    fn add_database(runner: &dyn Runner, kind: &str) {
        tracing::info!("Adding {kind} database...");
        if let Err(e) = runner.run_interactive("railway", &["add", "--database", kind]) {
            tracing::warn!("{kind} database may already exist ({e}), continuing");
        }
    }

    fn set_variables(
        runner: &dyn Runner,
        service: &str,
        variables: &[(String, String)],
    ) -> DeployResult<()> {
        tracing::info!("Setting {} variables on {service}...", variables.len());
        for (key, value) in variables {
            let pair = format!("{key}={value}");
            runner
                .run("railway", &["variables", "--service", service, "set", &pair])
                .map_err(|e| {
                    DeployError::Railway(format!("failed to set {key} on {service}: {e}"))
                })?;
        }
        Ok(())
    }
}

impl Default for Railway {
    fn default() -> Self {
        Self::new()
    }
}

impl Deployer for Railway {
    fn name(&self) -> &'static str {
        "railway"
    }

    fn check_prerequisites(&self, runner: &dyn Runner) -> DeployResult<()> {
        tracing::info!("Checking prerequisites...");

        if !runner.command_exists("railway") {
            return Err(DeployError::PrerequisiteMissing(
                "railway CLI is not installed. \
                 Install with: npm install -g @railway/cli"
                    .into(),
            ));
        }

        runner.run("railway", &["whoami"]).map_err(|_| {
            DeployError::PrerequisiteMissing(
                "railway CLI is not logged in. \
                 Run: railway login"
                    .into(),
            )
        })?;

        tracing::info!("Prerequisites OK");
        Ok(())
    }

    fn deploy(&self, runner: &dyn Runner, postiz: &Postiz, secrets: &Secrets) -> DeployResult<()> {
        Self::link(runner)?;

        Self::add_database(runner, "postgresql");
        Self::add_database(runner, "redis");

        Self::set_variables(
            runner,
            &self.backend_service,
            &Self::backend_variables(postiz, &secrets.jwt_secret),
        )?;
        Self::set_variables(
            runner,
            &self.frontend_service,
            &Self::frontend_variables(postiz),
        )?;

        tracing::info!("Deploying...");
        runner.run_interactive("railway", &["up", "--detach"])?;

        eprintln!();
        eprintln!("Deployment started on Railway.");
        eprintln!("Frontend: {}", postiz.frontend_url());
        eprintln!("API: {}", postiz.backend_url());
        eprintln!(
            "Point {} at '{}' and {} at '{}' in the Railway dashboard.",
            postiz.domain,
            self.frontend_service,
            postiz.api_domain(),
            self.backend_service
        );
        eprintln!();

        Ok(())
    }

    fn plan(&self, postiz: &Postiz) -> Vec<String> {
        vec![
            "railway link (unless already linked)".to_string(),
            "railway add --database postgresql".to_string(),
            "railway add --database redis".to_string(),
            format!(
                "Set {} on {}",
                keys(&Self::backend_variables(postiz, "<generated>")),
                self.backend_service
            ),
            format!(
                "Set {} on {}",
                keys(&Self::frontend_variables(postiz)),
                self.frontend_service
            ),
            "railway up --detach".to_string(),
        ]
    }
}

fn keys(variables: &[(String, String)]) -> String {
    variables
        .iter()
        .map(|(k, _)| k.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Project name from `railway status --json` output, if the
/// directory is linked.
#[must_use]
pub fn linked_project(status_json: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(status_json).ok()?;
    value
        .get("name")
        .and_then(serde_json::Value::as_str)
        .filter(|name| !name.is_empty())
        .map(ToString::to_string)
}
