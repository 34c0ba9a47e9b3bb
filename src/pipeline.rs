use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::SystemTime;

use clap::{Parser, Subcommand};

use crate::backup;
use crate::cmd::{Local, Runner};
use crate::config::Config;
use crate::deploy::Deployer;
use crate::deploy::vps::Vps;
use crate::env_file::EnvFile;
use crate::error::DeployResult;
use crate::logging;
use crate::nginx::Nginx;
use crate::nginx_conf;
use crate::postiz::Postiz;
use crate::prompt::{self, Prompter, validate_domain, validate_email};
use crate::secrets::Secrets;
use crate::ssh::SshSession;
use crate::update;

/// Installer entry point: resolves settings from flags, the config
/// file and prompts, then dispatches to a deployment target.
pub struct Pipeline {
    config: Config,
    nginx: Nginx,
}

impl Pipeline {
    #[must_use]
    pub fn new(config: Config) -> Self {
        let nginx = config.nginx();
        Self { config, nginx }
    }

    /// Parse CLI arguments, set up logging and the config file,
    /// then dispatch the command.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be read or the
    /// dispatched command fails.
    pub fn run() -> DeployResult<()> {
        let cli = Cli::parse();
        logging::init(cli.verbose);

        let config = match &cli.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        Self::new(config).dispatch(&cli.command)
    }

    pub fn dispatch(&self, command: &Command) -> DeployResult<()> {
        match command {
            Command::Install {
                domain,
                email,
                host,
                dry_run,
            } => self.cmd_install(domain.as_deref(), email.as_deref(), host.as_deref(), *dry_run),
            Command::Railway { domain, dry_run } => self.cmd_railway(domain.as_deref(), *dry_run),
            Command::Backup { host } => self.cmd_backup(host.as_deref()),
            Command::Update { host } => self.cmd_update(host.as_deref()),
            Command::Render { domain } => self.cmd_render(domain.as_deref()),
        }
    }

    /// Resolve the domain and email: flag, then config file, then
    /// prompt.
    pub fn resolve_site<R: BufRead, W: Write>(
        &self,
        domain: Option<&str>,
        email: Option<&str>,
        prompter: &mut Prompter<R, W>,
    ) -> DeployResult<Postiz> {
        let domain = prompter.resolve(
            domain.or(self.config.domain.as_deref()),
            "Domain (e.g. postiz.example.com)",
            validate_domain,
        )?;
        let email = prompter.resolve(
            email.or(self.config.email.as_deref()),
            "Email for Let's Encrypt",
            validate_email,
        )?;
        Ok(self.config.postiz(&domain, &email))
    }

    /// The VPS target with this pipeline's proxy and backup
    /// settings.
    #[must_use]
    pub fn vps(&self) -> Vps {
        Vps::new()
            .nginx(self.nginx.clone())
            .backup(self.config.backup_settings())
    }

    fn cmd_install(
        &self,
        domain: Option<&str>,
        email: Option<&str>,
        host: Option<&str>,
        dry_run: bool,
    ) -> DeployResult<()> {
        let postiz = self.resolve_site(domain, email, &mut prompt::stdio())?;
        let vps = self.vps();

        if dry_run {
            Self::print_plan(&vps, &postiz);
            self.print_files(&postiz);
            return Ok(());
        }

        let runner = self.runner(host)?;
        vps.check_prerequisites(runner.as_ref())?;
        let secrets = Secrets::generate();
        vps.deploy(runner.as_ref(), &postiz, &secrets)
    }

    fn cmd_railway(&self, domain: Option<&str>, dry_run: bool) -> DeployResult<()> {
        let domain = prompt::stdio().resolve(
            domain.or(self.config.domain.as_deref()),
            "Domain (e.g. postiz.example.com)",
            validate_domain,
        )?;
        let postiz = self.config.postiz(&domain, "");
        let railway = self.config.railway();

        if dry_run {
            Self::print_plan(&railway, &postiz);
            return Ok(());
        }

        let runner = Local;
        railway.check_prerequisites(&runner)?;
        railway.deploy(&runner, &postiz, &Secrets::generate())
    }

    fn cmd_backup(&self, host: Option<&str>) -> DeployResult<()> {
        let runner = self.runner(host)?;
        let postiz = self.config.postiz("", "");
        let report = backup::run_backup(
            runner.as_ref(),
            &postiz,
            &self.config.backup_settings(),
            SystemTime::now(),
        )?;
        println!("{}", report.dump_path);
        Ok(())
    }

    fn cmd_update(&self, host: Option<&str>) -> DeployResult<()> {
        let runner = self.runner(host)?;
        let postiz = self.config.postiz("", "");
        update::run_update(runner.as_ref(), &postiz)
    }

    fn cmd_render(&self, domain: Option<&str>) -> DeployResult<()> {
        let domain = prompt::stdio().resolve(
            domain.or(self.config.domain.as_deref()),
            "Domain (e.g. postiz.example.com)",
            validate_domain,
        )?;
        let postiz = self.config.postiz(&domain, "");
        self.print_files(&postiz);
        Ok(())
    }

    fn print_plan(deployer: &dyn Deployer, postiz: &Postiz) {
        eprintln!("=== Dry run: no changes will be made ===");
        eprintln!();
        eprintln!("--- Actions that would be performed ({}) ---", deployer.name());
        for (i, step) in deployer.plan(postiz).iter().enumerate() {
            eprintln!("{}. {step}", i + 1);
        }
        eprintln!();
    }

    fn print_files(&self, postiz: &Postiz) {
        let env = EnvFile::production(postiz, &Secrets::placeholder());

        eprintln!("--- {} ---", postiz.env_path());
        println!("{}", env.render());

        eprintln!("--- Nginx site ---");
        println!("{}", nginx_conf::render(&self.nginx, postiz));
    }

    fn runner(&self, host: Option<&str>) -> DeployResult<Box<dyn Runner>> {
        match host {
            Some(destination) => {
                let mut ssh = SshSession::parse(destination)?;
                if let Some(key) = &self.config.ssh_key {
                    ssh = ssh.with_key(key);
                }
                ssh.wait_for_ready(3, std::time::Duration::from_secs(5))?;
                Ok(Box::new(ssh))
            }
            None => Ok(Box::new(Local)),
        }
    }
}

#[derive(Parser)]
#[command(name = "postiz-deploy")]
#[command(about = "Install and configure Postiz on a VPS or on Railway")]
pub struct Cli {
    /// YAML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log every external command
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Install Postiz with Docker, Nginx and Certbot
    Install {
        /// Public domain; the API is served on api.<domain>
        #[arg(long)]
        domain: Option<String>,

        /// Email for Let's Encrypt registration
        #[arg(long)]
        email: Option<String>,

        /// Install on a remote machine over SSH (user@host)
        #[arg(long)]
        host: Option<String>,

        /// Preview generated files without executing
        #[arg(long)]
        dry_run: bool,
    },

    /// Deploy Postiz to Railway with managed Postgres and Redis
    Railway {
        /// Public domain; the API is served on api.<domain>
        #[arg(long)]
        domain: Option<String>,

        /// Preview the steps without executing
        #[arg(long)]
        dry_run: bool,
    },

    /// Dump the database and prune old backups
    Backup {
        /// Run on a remote machine over SSH (user@host)
        #[arg(long)]
        host: Option<String>,
    },

    /// Pull the latest Postiz and rebuild the containers
    Update {
        /// Run on a remote machine over SSH (user@host)
        #[arg(long)]
        host: Option<String>,
    },

    /// Print the generated env file and Nginx config
    Render {
        /// Public domain; the API is served on api.<domain>
        #[arg(long)]
        domain: Option<String>,
    },
}
