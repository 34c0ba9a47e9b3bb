use std::thread;
use std::time::{Duration, SystemTime};

use crate::cmd::{self, FileEntry, Runner, quote, shell_line};
use crate::error::{DeployError, DeployResult};

/// SSH session wrapper for executing commands and writing files
/// on a remote host. Implements [`Runner`] so the whole install
/// can be driven from a workstation.
pub struct SshSession {
    host: String,
    user: String,
    key: Option<String>,
}

impl SshSession {
    #[must_use]
    pub fn new(host: &str, user: &str) -> Self {
        Self {
            host: host.to_string(),
            user: user.to_string(),
            key: None,
        }
    }

    /// Parse a `user@host` destination. The user defaults to
    /// `root` when omitted.
    pub fn parse(destination: &str) -> DeployResult<Self> {
        let (user, host) = match destination.split_once('@') {
            Some((user, host)) => (user, host),
            None => ("root", destination),
        };
        if user.is_empty() || host.is_empty() {
            return Err(DeployError::InvalidInput(format!(
                "invalid SSH destination '{destination}', expected user@host"
            )));
        }
        Ok(Self::new(host, user))
    }

    #[must_use]
    pub fn with_key(mut self, key_path: &str) -> Self {
        self.key = Some(key_path.to_string());
        self
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Execute a command on the remote host and capture output.
    pub fn exec(&self, command: &str) -> DeployResult<String> {
        let args = self.build_ssh_args(command, false);
        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        cmd::run("ssh", &refs)
    }

    /// Execute a command on the remote host interactively.
    pub fn exec_interactive(&self, command: &str) -> DeployResult<()> {
        let args = self.build_ssh_args(command, true);
        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        cmd::run_interactive("ssh", &refs)
    }

    /// Write content to a remote file via stdin pipe.
    pub fn write_remote_file(&self, content: &str, remote_path: &str) -> DeployResult<()> {
        let path = quote(remote_path);
        let command = format!("mkdir -p \"$(dirname {path})\" && cat > {path}");
        let args = self.build_ssh_args(&command, false);
        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        cmd::run_with_stdin("ssh", &refs, content.as_bytes())?;
        Ok(())
    }

    /// Wait for SSH to become available on the remote host.
    pub fn wait_for_ready(&self, max_attempts: u32, interval: Duration) -> DeployResult<()> {
        for attempt in 1..=max_attempts {
            tracing::info!("Waiting for SSH ({attempt}/{max_attempts})...");
            if self.exec("echo ok").is_ok() {
                tracing::info!("Connected to {}", self.destination());
                return Ok(());
            }
            thread::sleep(interval);
        }

        Err(DeployError::SshFailed(format!(
            "SSH not ready after {max_attempts} attempts \
             on {}",
            self.host
        )))
    }

    fn destination(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }

    fn build_ssh_args(&self, command: &str, tty: bool) -> Vec<String> {
        let mut args = self.ssh_base_args();
        if tty {
            args.push("-t".to_string());
        }
        args.push(self.destination());
        args.push(command.to_string());
        args
    }

    fn ssh_base_args(&self) -> Vec<String> {
        let mut args = vec![
            "-o".to_string(),
            "StrictHostKeyChecking=accept-new".to_string(),
            "-o".to_string(),
            "ConnectTimeout=10".to_string(),
        ];
        if let Some(key) = &self.key {
            args.push("-i".to_string());
            args.push(key.clone());
        }
        args
    }
}

impl Runner for SshSession {
    fn run(&self, program: &str, args: &[&str]) -> DeployResult<String> {
        self.exec(&shell_line(program, args))
    }

    fn run_interactive(&self, program: &str, args: &[&str]) -> DeployResult<()> {
        self.exec_interactive(&shell_line(program, args))
    }

    fn run_shell(&self, shell_cmd: &str) -> DeployResult<()> {
        self.exec_interactive(&format!("sh -c {}", quote(shell_cmd)))
    }

    fn command_exists(&self, program: &str) -> bool {
        self.exec(&format!("command -v {}", quote(program))).is_ok()
    }

    fn path_exists(&self, path: &str) -> bool {
        self.exec(&format!("test -e {}", quote(path))).is_ok()
    }

    fn read_file(&self, path: &str) -> DeployResult<String> {
        if !self.path_exists(path) {
            return Err(DeployError::FileNotFound(format!(
                "{path} on {}",
                self.host
            )));
        }
        self.exec(&format!("cat {}", quote(path)))
    }

    fn write_file(&self, path: &str, content: &str) -> DeployResult<()> {
        self.write_remote_file(content, path)
    }

    fn remove_file(&self, path: &str) -> DeployResult<()> {
        self.exec(&format!("rm -f {}", quote(path)))?;
        Ok(())
    }

    fn remove_dir_all(&self, path: &str) -> DeployResult<()> {
        self.exec(&format!("rm -rf {}", quote(path)))?;
        Ok(())
    }

    fn list_files(&self, dir: &str) -> DeployResult<Vec<FileEntry>> {
        let output = self.exec(&format!(
            "find {} -maxdepth 1 -type f -printf '%T@ %p\\n'",
            quote(dir)
        ))?;
        let mut entries = parse_find_listing(&output)?;
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Parse `find -printf '%T@ %p\n'` output into file entries.
///
/// Each line is `<epoch seconds with fraction> <path>`.
pub fn parse_find_listing(output: &str) -> DeployResult<Vec<FileEntry>> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let (stamp, path) = line.split_once(' ').ok_or_else(|| {
                DeployError::Other(format!("unexpected find output: {line}"))
            })?;
            let secs: f64 = stamp.parse().map_err(|_| {
                DeployError::Other(format!("invalid modification time: {stamp}"))
            })?;
            let out_of_range =
                || DeployError::Other(format!("modification time out of range: {stamp}"));
            let since_epoch =
                Duration::try_from_secs_f64(secs.max(0.0)).map_err(|_| out_of_range())?;
            let modified = SystemTime::UNIX_EPOCH
                .checked_add(since_epoch)
                .ok_or_else(out_of_range)?;
            Ok(FileEntry {
                path: path.to_string(),
                modified,
            })
        })
        .collect()
}
