use crate::error::{DeployError, DeployResult};
use crate::postiz::Postiz;
use crate::secrets::Secrets;

/// Optional keys written commented out so operators can fill them
/// in later without looking up the names.
const OPTIONAL_SECTIONS: &[(&str, &[&str])] = &[
    (
        "Social media providers",
        &[
            "X_API_KEY",
            "X_API_SECRET",
            "LINKEDIN_CLIENT_ID",
            "LINKEDIN_CLIENT_SECRET",
            "REDDIT_CLIENT_ID",
            "REDDIT_CLIENT_SECRET",
            "GITHUB_CLIENT_ID",
            "GITHUB_CLIENT_SECRET",
            "FACEBOOK_APP_ID",
            "FACEBOOK_APP_SECRET",
            "YOUTUBE_CLIENT_ID",
            "YOUTUBE_CLIENT_SECRET",
        ],
    ),
    (
        "Cloudflare R2 storage (set STORAGE_PROVIDER=cloudflare)",
        &[
            "CLOUDFLARE_ACCOUNT_ID",
            "CLOUDFLARE_ACCESS_KEY",
            "CLOUDFLARE_SECRET_ACCESS_KEY",
            "CLOUDFLARE_BUCKETNAME",
            "CLOUDFLARE_BUCKET_URL",
            "CLOUDFLARE_REGION",
        ],
    ),
    ("Email", &["RESEND_API_KEY", "EMAIL_FROM_ADDRESS", "EMAIL_FROM_NAME"]),
    ("AI features", &["OPENAI_API_KEY"]),
];

/// One group of entries, rendered with a `# title` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: String,
    pub entries: Vec<(String, String)>,
    /// Keys emitted as `# KEY=`.
    pub commented: Vec<String>,
}

/// An ordered dotenv file.
///
/// # Example
///
/// ```
/// use postiz_deploy::EnvFile;
///
/// let env = EnvFile::new("Example")
///     .section("Database")
///     .set("POSTGRES_DB", "postiz")
///     .optional("POSTGRES_PORT");
///
/// assert_eq!(
///     env.render(),
///     "# Example\n\n# Database\nPOSTGRES_DB=postiz\n# POSTGRES_PORT=\n"
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvFile {
    pub header: Option<String>,
    pub sections: Vec<Section>,
}

impl EnvFile {
    #[must_use]
    pub fn new(header: &str) -> Self {
        Self {
            header: Some(header.to_string()),
            sections: Vec::new(),
        }
    }

    /// The `.env.production` file consumed by the Postiz
    /// containers.
    #[must_use]
    pub fn production(postiz: &Postiz, secrets: &Secrets) -> Self {
        let database_url = format!(
            "postgresql://{}:{}@postgres:5432/{}",
            postiz.db_user, secrets.postgres_password, postiz.db_name
        );
        let redis_url = format!("redis://:{}@redis:6379", secrets.redis_password);

        let mut env = Self::new("Postiz production environment")
            .section("Database")
            .set("POSTGRES_DB", &postiz.db_name)
            .set("POSTGRES_USER", &postiz.db_user)
            .set("POSTGRES_PASSWORD", &secrets.postgres_password)
            .set("DATABASE_URL", &database_url)
            .section("Redis")
            .set("REDIS_PASSWORD", &secrets.redis_password)
            .set("REDIS_URL", &redis_url)
            .section("Application")
            .set("JWT_SECRET", &secrets.jwt_secret)
            .set("FRONTEND_URL", &postiz.frontend_url())
            .set("NEXT_PUBLIC_BACKEND_URL", &postiz.backend_url())
            .set("BACKEND_INTERNAL_URL", &postiz.backend_internal_url())
            .set("IS_GENERAL", "true")
            .section("Storage")
            .set("STORAGE_PROVIDER", "local")
            .set("UPLOAD_DIRECTORY", &postiz.upload_dir)
            .set("NEXT_PUBLIC_UPLOAD_DIRECTORY", &postiz.upload_dir);

        for (title, keys) in OPTIONAL_SECTIONS {
            env = env.section(title);
            for key in *keys {
                env = env.optional(key);
            }
        }

        env
    }

    /// Start a new section; later `set`/`optional` calls land in it.
    #[must_use]
    pub fn section(mut self, title: &str) -> Self {
        self.sections.push(Section {
            title: title.to_string(),
            entries: Vec::new(),
            commented: Vec::new(),
        });
        self
    }

    #[must_use]
    pub fn set(mut self, key: &str, value: &str) -> Self {
        self.current().entries.push((key.to_string(), value.to_string()));
        self
    }

    #[must_use]
    pub fn optional(mut self, key: &str) -> Self {
        self.current().commented.push(key.to_string());
        self
    }

    /// Look up the value of an uncommented key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.sections
            .iter()
            .flat_map(|s| s.entries.iter())
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn render(&self) -> String {
        let mut blocks = Vec::new();

        if let Some(header) = &self.header {
            blocks.push(format!("# {header}\n"));
        }

        for section in &self.sections {
            let mut block = String::new();
            if !section.title.is_empty() {
                block.push_str(&format!("# {}\n", section.title));
            }
            for (key, value) in &section.entries {
                block.push_str(&format!("{key}={value}\n"));
            }
            for key in &section.commented {
                block.push_str(&format!("# {key}=\n"));
            }
            blocks.push(block);
        }

        blocks.join("\n")
    }

    /// Parse dotenv text. Blank lines and comments are skipped;
    /// all entries land in a single untitled section.
    pub fn parse(text: &str) -> DeployResult<Self> {
        let mut section = Section {
            title: String::new(),
            entries: Vec::new(),
            commented: Vec::new(),
        };

        for (number, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (key, value) = line.split_once('=').ok_or_else(|| {
                DeployError::InvalidInput(format!(
                    "line {}: expected KEY=value, got '{line}'",
                    number + 1
                ))
            })?;
            let key = key.trim();
            if key.is_empty() {
                return Err(DeployError::InvalidInput(format!(
                    "line {}: empty key",
                    number + 1
                )));
            }
            section
                .entries
                .push((key.to_string(), unquote(value.trim()).to_string()));
        }

        Ok(Self {
            header: None,
            sections: vec![section],
        })
    }

    fn current(&mut self) -> &mut Section {
        if self.sections.is_empty() {
            self.sections.push(Section {
                title: String::new(),
                entries: Vec::new(),
                commented: Vec::new(),
            });
        }
        let last = self.sections.len() - 1;
        &mut self.sections[last]
    }
}

fn unquote(value: &str) -> &str {
    for q in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(q) && value.ends_with(q) {
            return &value[1..value.len() - 1];
        }
    }
    value
}
