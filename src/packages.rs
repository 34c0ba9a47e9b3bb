//! System package installation. Every step checks what is
//! already present first, so re-running an install is safe.

use crate::cmd::Runner;
use crate::error::DeployResult;

pub const DOCKER_INSTALL_SCRIPT: &str = "https://get.docker.com";
pub const DOCKER_COMPOSE_PATH: &str = "/usr/local/bin/docker-compose";

/// Packages installed with `apt-get`, paired with the command
/// that proves each one is already there.
pub const APT_PACKAGES: &[(&str, &str)] = &[
    ("curl", "curl"),
    ("git", "git"),
    ("nginx", "nginx"),
    ("certbot", "certbot"),
];

/// Whether a step did work or found it already done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Installed,
    AlreadyPresent,
}

/// Install Docker through the upstream convenience script unless
/// `docker` is already on `PATH`.
pub fn ensure_docker(runner: &dyn Runner) -> DeployResult<Outcome> {
    if runner.command_exists("docker") {
        tracing::info!("Docker already installed, skipping");
        return Ok(Outcome::AlreadyPresent);
    }

    tracing::info!("Installing Docker...");
    runner.run_shell(&format!("curl -fsSL {DOCKER_INSTALL_SCRIPT} | sh"))?;
    runner.run_interactive("systemctl", &["enable", "--now", "docker"])?;
    Ok(Outcome::Installed)
}

/// Install the standalone `docker-compose` binary unless it is
/// already on `PATH`.
pub fn ensure_docker_compose(runner: &dyn Runner) -> DeployResult<Outcome> {
    if runner.command_exists("docker-compose") {
        tracing::info!("Docker Compose already installed, skipping");
        return Ok(Outcome::AlreadyPresent);
    }

    tracing::info!("Installing Docker Compose...");
    runner.run_shell(&format!(
        "curl -fsSL \
         \"https://github.com/docker/compose/releases/latest/download/docker-compose-$(uname -s)-$(uname -m)\" \
         -o {DOCKER_COMPOSE_PATH}"
    ))?;
    runner.run("chmod", &["+x", DOCKER_COMPOSE_PATH])?;
    Ok(Outcome::Installed)
}

/// Install the missing packages from [`APT_PACKAGES`] and return
/// the names that were installed.
pub fn ensure_apt_packages(runner: &dyn Runner) -> DeployResult<Vec<String>> {
    let missing: Vec<&str> = APT_PACKAGES
        .iter()
        .filter(|(_, probe)| !runner.command_exists(probe))
        .map(|(package, _)| *package)
        .collect();

    if missing.is_empty() {
        tracing::info!("System packages already installed, skipping");
        return Ok(Vec::new());
    }

    tracing::info!("Installing {}...", missing.join(", "));
    runner.run_interactive("apt-get", &["update"])?;

    let mut args = vec!["install", "-y"];
    args.extend(&missing);
    if missing.contains(&"certbot") {
        args.push("python3-certbot-nginx");
    }
    runner.run_interactive("apt-get", &args)?;

    Ok(missing.into_iter().map(ToString::to_string).collect())
}

/// Install everything the VPS target needs.
pub fn ensure_all(runner: &dyn Runner) -> DeployResult<()> {
    ensure_apt_packages(runner)?;
    ensure_docker(runner)?;
    ensure_docker_compose(runner)?;
    Ok(())
}
