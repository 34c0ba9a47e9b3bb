//! Install and configure [Postiz](https://postiz.com) on a VPS or
//! on Railway.
//!
//! `postiz-deploy` replaces a pile of copy-pasted setup scripts
//! with one typed installer. It installs Docker, Docker Compose,
//! Nginx and Certbot, clones the Postiz repository, writes the
//! `.env.production` file and the reverse-proxy configuration,
//! and starts the containers. For Railway it provisions managed
//! Postgres and Redis and sets the service variables through the
//! `railway` CLI.
//!
//! # Overview
//!
//! - [`Postiz`] describes the installation (domain, directory,
//!   ports)
//! - [`Secrets`] holds the generated passwords
//! - [`EnvFile`] renders `.env.production`
//! - [`Nginx`] and [`nginx_conf::render`] produce the three
//!   server blocks (HTTP redirect, frontend, API)
//! - [`Deployer`](deploy::Deployer) targets: [`Vps`] and
//!   [`Railway`]
//! - [`Runner`](cmd::Runner) carries every external effect, on
//!   this machine ([`Local`](cmd::Local)) or over SSH
//!   ([`SshSession`])
//!
//! # Command line
//!
//! ```sh
//! # Interactive install on this machine
//! sudo postiz-deploy install
//!
//! # Non-interactive install on a remote server
//! postiz-deploy install --domain postiz.example.com \
//!     --email admin@example.com --host root@203.0.113.10
//!
//! # Preview the generated files
//! postiz-deploy render --domain postiz.example.com
//!
//! # Railway
//! postiz-deploy railway --domain postiz.example.com
//!
//! # Maintenance
//! postiz-deploy backup
//! postiz-deploy update
//! ```
//!
//! # Library
//!
//! ```rust,no_run
//! use postiz_deploy::cmd::Local;
//! use postiz_deploy::deploy::Deployer;
//! use postiz_deploy::{Nginx, Postiz, Secrets, Vps};
//!
//! fn main() -> anyhow::Result<()> {
//!     let postiz = Postiz::new("postiz.example.com", "admin@example.com")
//!         .install_dir("/srv/postiz");
//!
//!     let vps = Vps::new().nginx(Nginx::new().client_max_body_size("250M").hsts());
//!
//!     vps.check_prerequisites(&Local)?;
//!     vps.deploy(&Local, &postiz, &Secrets::generate())?;
//!     Ok(())
//! }
//! ```

// Allow noisy pedantic lints that don't add value for an
// installer crate.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod backup;
pub mod cmd;
pub mod compose;
pub mod config;
pub mod deploy;
pub mod env_file;
pub mod error;
pub mod logging;
pub mod nginx;
pub mod nginx_conf;
pub mod packages;
pub mod pipeline;
pub mod postiz;
pub mod prompt;
pub mod secrets;
pub mod ssh;
pub mod update;

pub use backup::{BackupSettings, Retention};
pub use config::Config;
pub use deploy::railway::Railway;
pub use deploy::vps::Vps;
pub use env_file::EnvFile;
pub use nginx::Nginx;
pub use pipeline::Pipeline;
pub use postiz::Postiz;
pub use secrets::Secrets;
pub use ssh::SshSession;
