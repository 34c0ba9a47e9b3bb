use std::path::Path;

use serde::Deserialize;

use crate::backup::BackupSettings;
use crate::nginx::Nginx;
use crate::deploy::railway::Railway;
use crate::error::{DeployError, DeployResult};
use crate::postiz::Postiz;

/// Optional installer settings read from a YAML file. Every field
/// may be omitted; command-line flags take precedence.
///
/// ```yaml
/// domain: postiz.example.com
/// email: admin@example.com
/// install_dir: /opt/postiz
/// branch: main
/// backup_dir: /opt/postiz-backups
/// ssh_key: ~/.ssh/id_ed25519
/// nginx:
///   client_max_body_size: 250M
///   hsts: true
/// retention:
///   compress_after_days: 7
///   delete_after_days: 30
/// railway:
///   backend_service: postiz-backend
///   frontend_service: postiz-frontend
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub domain: Option<String>,
    pub email: Option<String>,
    pub install_dir: Option<String>,
    pub repository: Option<String>,
    pub branch: Option<String>,
    pub frontend_port: Option<u16>,
    pub backend_port: Option<u16>,
    pub upload_dir: Option<String>,
    pub backup_dir: Option<String>,
    /// Private key for `--host` connections.
    pub ssh_key: Option<String>,
    #[serde(default)]
    pub nginx: NginxConfig,
    #[serde(default)]
    pub retention: RetentionConfig,
    #[serde(default)]
    pub railway: RailwayConfig,
}

/// Reverse-proxy overrides, see [`Nginx`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NginxConfig {
    pub cert_dir: Option<String>,
    pub client_max_body_size: Option<String>,
    pub proxy_read_timeout_secs: Option<u32>,
    pub hsts: Option<bool>,
    /// Raw directives added to both HTTPS servers.
    #[serde(default)]
    pub directives: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetentionConfig {
    pub compress_after_days: Option<u64>,
    pub delete_after_days: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RailwayConfig {
    pub backend_service: Option<String>,
    pub frontend_service: Option<String>,
}

impl Config {
    /// Read and parse a config file.
    pub fn load(path: &Path) -> DeployResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DeployError::FileNotFound(path.display().to_string())
            } else {
                DeployError::Io(e)
            }
        })?;
        Self::from_yaml(&text)
            .map_err(|e| DeployError::Config(format!("{}: {e}", path.display())))
    }

    /// Parse YAML text. An empty document yields the defaults.
    pub fn from_yaml(text: &str) -> DeployResult<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Build the installation settings for `domain`/`email`,
    /// applying every override present in the file.
    #[must_use]
    pub fn postiz(&self, domain: &str, email: &str) -> Postiz {
        let mut postiz = Postiz::new(domain, email);
        if let Some(dir) = &self.install_dir {
            postiz = postiz.install_dir(dir);
        }
        if let Some(url) = &self.repository {
            postiz = postiz.repository(url);
        }
        if let Some(branch) = &self.branch {
            postiz = postiz.branch(branch);
        }
        if let Some(port) = self.frontend_port {
            postiz = postiz.frontend_port(port);
        }
        if let Some(port) = self.backend_port {
            postiz = postiz.backend_port(port);
        }
        if let Some(dir) = &self.upload_dir {
            postiz = postiz.upload_dir(dir);
        }
        postiz
    }

    #[must_use]
    pub fn backup_settings(&self) -> BackupSettings {
        let mut settings = BackupSettings::default();
        if let Some(dir) = &self.backup_dir {
            settings.dir = dir.trim_end_matches('/').to_string();
        }
        if let Some(days) = self.retention.compress_after_days {
            settings.retention.compress_after_days = days;
        }
        if let Some(days) = self.retention.delete_after_days {
            settings.retention.delete_after_days = days;
        }
        settings
    }

    /// Reverse-proxy settings with the `nginx:` overrides applied.
    #[must_use]
    pub fn nginx(&self) -> Nginx {
        let overrides = &self.nginx;
        let mut nginx = Nginx::new();
        if let Some(dir) = &overrides.cert_dir {
            nginx = nginx.cert_dir(dir);
        }
        if let Some(size) = &overrides.client_max_body_size {
            nginx = nginx.client_max_body_size(size);
        }
        if let Some(secs) = overrides.proxy_read_timeout_secs {
            nginx = nginx.proxy_read_timeout_secs(secs);
        }
        if overrides.hsts == Some(true) {
            nginx = nginx.hsts();
        }
        for raw in &overrides.directives {
            nginx = nginx.directive(raw);
        }
        nginx
    }

    #[must_use]
    pub fn railway(&self) -> Railway {
        let mut railway = Railway::new();
        if let Some(name) = &self.railway.backend_service {
            railway = railway.backend_service(name);
        }
        if let Some(name) = &self.railway.frontend_service {
            railway = railway.frontend_service(name);
        }
        railway
    }
}
