use std::time::Duration;

use crate::backup::{self, BackupSettings};
use crate::cmd::Runner;
use crate::compose;
use crate::deploy::Deployer;
use crate::env_file::EnvFile;
use crate::error::{DeployError, DeployResult};
use crate::nginx::{ACME_WEBROOT, DEFAULT_SITE, Nginx, SITES_AVAILABLE, SITES_ENABLED};
use crate::nginx_conf;
use crate::packages;
use crate::postiz::Postiz;
use crate::secrets::Secrets;
use crate::update;

/// Install Postiz on a Debian/Ubuntu machine: Docker Compose for
/// the application, Nginx in front, Certbot for TLS.
pub struct Vps {
    pub nginx: Nginx,
    pub backup: BackupSettings,
    /// Fixed wait after starting containers before checking status.
    pub startup_wait: Duration,
}

impl Vps {
    #[must_use]
    pub fn new() -> Self {
        Self {
            nginx: Nginx::new(),
            backup: BackupSettings::default(),
            startup_wait: Duration::from_secs(30),
        }
    }

    #[must_use]
    pub fn nginx(mut self, nginx: Nginx) -> Self {
        self.nginx = nginx;
        self
    }

    #[must_use]
    pub fn backup(mut self, settings: BackupSettings) -> Self {
        self.backup = settings;
        self
    }

    #[must_use]
    pub const fn startup_wait(mut self, wait: Duration) -> Self {
        self.startup_wait = wait;
        self
    }

    fn clone_repository(runner: &dyn Runner, postiz: &Postiz) -> DeployResult<()> {
        let dir = &postiz.install_dir;
        if runner.path_exists(dir) {
            tracing::warn!("{dir} already exists, removing it for a fresh clone");
            runner.remove_dir_all(dir)?;
        }

        tracing::info!("Cloning {} ({})...", postiz.repository, postiz.branch);
        runner.run_interactive(
            "git",
            &["clone", "--branch", &postiz.branch, &postiz.repository, dir],
        )
    }

    fn write_env(runner: &dyn Runner, postiz: &Postiz, secrets: &Secrets) -> DeployResult<()> {
        let path = postiz.env_path();
        tracing::info!("Writing {path}");
        let env = EnvFile::production(postiz, secrets);
        runner.write_file(&path, &env.render())?;
        runner.run("chmod", &["600", &path])?;
        Ok(())
    }

    fn obtain_certificate(runner: &dyn Runner, postiz: &Postiz) -> DeployResult<()> {
        let api = postiz.api_domain();
        tracing::info!("Requesting certificate for {} and {api}...", postiz.domain);

        // Standalone mode needs port 80.
        runner.run("systemctl", &["stop", "nginx"])?;
        runner.run_interactive(
            "certbot",
            &[
                "certonly",
                "--standalone",
                "--non-interactive",
                "--agree-tos",
                "--keep-until-expiring",
                "--expand",
                "--email",
                &postiz.email,
                "-d",
                &postiz.domain,
                "-d",
                &api,
                "--pre-hook",
                "systemctl stop nginx",
                "--post-hook",
                "systemctl start nginx",
            ],
        )
    }

    fn configure_nginx(&self, runner: &dyn Runner, postiz: &Postiz) -> DeployResult<()> {
        tracing::info!("Writing Nginx site {SITES_AVAILABLE}");
        let conf = nginx_conf::render(&self.nginx, postiz);
        runner.run("mkdir", &["-p", ACME_WEBROOT])?;
        runner.write_file(SITES_AVAILABLE, &conf)?;
        runner.run("ln", &["-sf", SITES_AVAILABLE, SITES_ENABLED])?;

        if runner.path_exists(DEFAULT_SITE) {
            runner.remove_file(DEFAULT_SITE)?;
        }

        runner.run("nginx", &["-t"]).map_err(|e| {
            DeployError::Other(format!("generated Nginx configuration is invalid: {e}"))
        })?;
        runner.run("systemctl", &["restart", "nginx"])?;
        Ok(())
    }

    fn start_containers(&self, runner: &dyn Runner, postiz: &Postiz) -> DeployResult<()> {
        tracing::info!("Building and starting containers...");
        compose::up(runner, postiz)?;

        tracing::info!(
            "Waiting {}s for services to start...",
            self.startup_wait.as_secs()
        );
        runner.sleep(self.startup_wait);

        compose::ps(runner, postiz)
    }
}

impl Default for Vps {
    fn default() -> Self {
        Self::new()
    }
}

impl Deployer for Vps {
    fn name(&self) -> &'static str {
        "vps"
    }

    fn check_prerequisites(&self, runner: &dyn Runner) -> DeployResult<()> {
        tracing::info!("Checking prerequisites...");

        if !runner.command_exists("apt-get") {
            return Err(DeployError::PrerequisiteMissing(
                "apt-get not found. \
                 Only Debian and Ubuntu hosts are supported"
                    .into(),
            ));
        }

        let uid = runner.run("id", &["-u"])?;
        if uid.trim() != "0" {
            return Err(DeployError::PrerequisiteMissing(
                "installation must run as root. \
                 Re-run with sudo"
                    .into(),
            ));
        }

        tracing::info!("Prerequisites OK");
        Ok(())
    }

    fn deploy(&self, runner: &dyn Runner, postiz: &Postiz, secrets: &Secrets) -> DeployResult<()> {
        packages::ensure_all(runner)?;
        Self::clone_repository(runner, postiz)?;
        Self::write_env(runner, postiz, secrets)?;
        Self::obtain_certificate(runner, postiz)?;
        self.configure_nginx(runner, postiz)?;
        self.start_containers(runner, postiz)?;
        backup::install(runner, postiz, &self.backup)?;
        update::install(runner, postiz)?;

        eprintln!();
        eprintln!("========================================");
        eprintln!("Postiz installed successfully!");
        eprintln!("========================================");
        eprintln!();
        eprintln!("Frontend: {}", postiz.frontend_url());
        eprintln!("API: {}", postiz.backend_url());
        eprintln!("Install dir: {}", postiz.install_dir);
        eprintln!("Environment: {}", postiz.env_path());
        eprintln!();
        eprintln!("Back up the database with:");
        eprintln!("  {}", self.backup.script_path);
        eprintln!("Update with:");
        eprintln!("  {}", postiz.update_script_path());
        eprintln!();

        Ok(())
    }

    fn plan(&self, postiz: &Postiz) -> Vec<String> {
        vec![
            "Install curl, git, nginx, certbot if missing".to_string(),
            "Install Docker and Docker Compose if missing".to_string(),
            format!(
                "Clone {} ({}) into {} (replacing any existing directory)",
                postiz.repository, postiz.branch, postiz.install_dir
            ),
            format!("Write {} with generated secrets", postiz.env_path()),
            format!(
                "Obtain a certificate for {} and {}",
                postiz.domain,
                postiz.api_domain()
            ),
            format!("Write {SITES_AVAILABLE}, enable it, run nginx -t, restart Nginx"),
            "Build and start containers with docker-compose".to_string(),
            format!("Wait {}s, then show container status", self.startup_wait.as_secs()),
            format!(
                "Install {} and {}",
                self.backup.script_path,
                postiz.update_script_path()
            ),
        ]
    }
}
