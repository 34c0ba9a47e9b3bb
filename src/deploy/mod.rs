pub mod railway;
pub mod vps;

use crate::cmd::Runner;
use crate::error::DeployResult;
use crate::postiz::Postiz;
use crate::secrets::Secrets;

/// A deployment target that installs and starts Postiz.
pub trait Deployer {
    /// Short name used in log lines.
    fn name(&self) -> &'static str;

    /// Check that the tools the target drives are installed and
    /// usable.
    fn check_prerequisites(&self, runner: &dyn Runner) -> DeployResult<()>;

    /// Run the full deployment. Aborts on the first failing step.
    fn deploy(&self, runner: &dyn Runner, postiz: &Postiz, secrets: &Secrets) -> DeployResult<()>;

    /// Human-readable list of the steps `deploy` would perform.
    fn plan(&self, postiz: &Postiz) -> Vec<String>;
}
