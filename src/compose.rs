//! `docker-compose` invocations against the cloned checkout. The
//! compose file itself ships with the Postiz repository.

use crate::cmd::Runner;
use crate::error::DeployResult;
use crate::postiz::Postiz;

/// Compose file names probed in order.
const COMPOSE_FILES: &[&str] = &["docker-compose.yaml", "docker-compose.yml", "compose.yaml"];

/// Path of the compose file inside the checkout. Falls back to
/// `docker-compose.yml` when none exists yet (dry runs).
#[must_use]
pub fn file(runner: &dyn Runner, postiz: &Postiz) -> String {
    COMPOSE_FILES
        .iter()
        .map(|name| format!("{}/{name}", postiz.install_dir))
        .find(|path| runner.path_exists(path))
        .unwrap_or_else(|| format!("{}/docker-compose.yml", postiz.install_dir))
}

/// Run `docker-compose <args>` in the install directory with the
/// production env file.
pub fn run(runner: &dyn Runner, postiz: &Postiz, args: &[&str]) -> DeployResult<()> {
    let full = full_args(runner, postiz, args);
    let refs: Vec<&str> = full.iter().map(String::as_str).collect();
    runner.run_interactive("docker-compose", &refs)
}

/// Build and start all services in the background.
pub fn up(runner: &dyn Runner, postiz: &Postiz) -> DeployResult<()> {
    run(runner, postiz, &["up", "-d", "--build"])
}

/// Show container status.
pub fn ps(runner: &dyn Runner, postiz: &Postiz) -> DeployResult<()> {
    run(runner, postiz, &["ps"])
}

fn full_args(runner: &dyn Runner, postiz: &Postiz, args: &[&str]) -> Vec<String> {
    let mut full = vec![
        "--project-directory".to_string(),
        postiz.install_dir.clone(),
        "-f".to_string(),
        file(runner, postiz),
        "--env-file".to_string(),
        postiz.env_path(),
    ];
    full.extend(args.iter().map(ToString::to_string));
    full
}
