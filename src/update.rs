use crate::cmd::{Runner, quote};
use crate::compose;
use crate::error::{DeployError, DeployResult};
use crate::postiz::{ENV_FILE_NAME, Postiz};

/// Render `update-postiz.sh`, placed in the install directory.
#[must_use]
pub fn render_script(postiz: &Postiz) -> String {
    format!(
        r#"#!/bin/bash
# Pull the latest Postiz release and rebuild the containers
set -e

cd {install_dir}

echo "Pulling latest changes..."
git pull origin {branch}

echo "Rebuilding containers..."
docker-compose --env-file {env_file} down
docker-compose --env-file {env_file} up -d --build

echo "Postiz updated."
"#,
        install_dir = quote(&postiz.install_dir),
        branch = quote(&postiz.branch),
        env_file = ENV_FILE_NAME,
    )
}

/// Install the update script next to the checkout.
pub fn install(runner: &dyn Runner, postiz: &Postiz) -> DeployResult<()> {
    let path = postiz.update_script_path();
    tracing::info!("Installing update script at {path}");
    runner.write_file(&path, &render_script(postiz))?;
    runner.run("chmod", &["+x", &path])?;
    Ok(())
}

/// Pull and rebuild in place, the same steps as the script.
pub fn run_update(runner: &dyn Runner, postiz: &Postiz) -> DeployResult<()> {
    if !runner.path_exists(&format!("{}/.git", postiz.install_dir)) {
        return Err(DeployError::FileNotFound(format!(
            "{} is not a Postiz checkout. \
             Run install first",
            postiz.install_dir
        )));
    }

    let dir = &postiz.install_dir;
    tracing::info!("Pulling latest changes into {dir}...");
    runner.run_interactive("git", &["-C", dir, "pull", "origin", &postiz.branch])?;

    tracing::info!("Rebuilding containers...");
    compose::run(runner, postiz, &["down"])?;
    compose::up(runner, postiz)?;

    tracing::info!("Postiz updated");
    Ok(())
}
