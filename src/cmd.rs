use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::{Duration, SystemTime};

use crate::error::{DeployError, DeployResult};

/// A regular file and its modification time, as seen by a
/// [`Runner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: String,
    pub modified: SystemTime,
}

/// Every external effect of the installer goes through a runner:
/// processes, files, and the fixed waits between steps.
pub trait Runner {
    /// Run a command and capture its trimmed stdout. Fails on a
    /// non-zero exit code.
    fn run(&self, program: &str, args: &[&str]) -> DeployResult<String>;

    /// Run a command with stdio inherited.
    fn run_interactive(&self, program: &str, args: &[&str]) -> DeployResult<()>;

    /// Run a shell pipeline (via `sh -c`).
    fn run_shell(&self, shell_cmd: &str) -> DeployResult<()>;

    /// Check if a command exists on `PATH`.
    fn command_exists(&self, program: &str) -> bool;

    fn path_exists(&self, path: &str) -> bool;

    fn read_file(&self, path: &str) -> DeployResult<String>;

    /// Write `content` to `path`, replacing any existing file.
    fn write_file(&self, path: &str, content: &str) -> DeployResult<()>;

    fn remove_file(&self, path: &str) -> DeployResult<()>;

    fn remove_dir_all(&self, path: &str) -> DeployResult<()>;

    /// List the regular files directly inside `dir`.
    fn list_files(&self, dir: &str) -> DeployResult<Vec<FileEntry>>;

    fn sleep(&self, duration: Duration);
}

/// Runs everything on the current machine.
#[derive(Debug, Clone, Copy, Default)]
pub struct Local;

impl Runner for Local {
    fn run(&self, program: &str, args: &[&str]) -> DeployResult<String> {
        run(program, args)
    }

    fn run_interactive(&self, program: &str, args: &[&str]) -> DeployResult<()> {
        run_interactive(program, args)
    }

    fn run_shell(&self, shell_cmd: &str) -> DeployResult<()> {
        run_pipeline(shell_cmd)
    }

    fn command_exists(&self, program: &str) -> bool {
        command_exists(program)
    }

    fn path_exists(&self, path: &str) -> bool {
        Path::new(path).exists()
    }

    fn read_file(&self, path: &str) -> DeployResult<String> {
        std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DeployError::FileNotFound(path.to_string())
            } else {
                DeployError::Io(e)
            }
        })
    }

    fn write_file(&self, path: &str, content: &str) -> DeployResult<()> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    fn remove_file(&self, path: &str) -> DeployResult<()> {
        std::fs::remove_file(path)?;
        Ok(())
    }

    fn remove_dir_all(&self, path: &str) -> DeployResult<()> {
        std::fs::remove_dir_all(path)?;
        Ok(())
    }

    fn list_files(&self, dir: &str) -> DeployResult<Vec<FileEntry>> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let meta = entry.metadata()?;
            if !meta.is_file() {
                continue;
            }
            let path = match entry.path().into_os_string().into_string() {
                Ok(path) => path,
                Err(raw) => {
                    tracing::warn!("skipping non-UTF-8 file name {}", raw.to_string_lossy());
                    continue;
                }
            };
            entries.push(FileEntry {
                path,
                modified: meta.modified()?,
            });
        }
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Run a command and capture its output. Fails if the command
/// returns a non-zero exit code.
pub fn run(program: &str, args: &[&str]) -> DeployResult<String> {
    tracing::debug!("$ {}", format_command(program, args));
    let output = spawn(program, args)?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let command = format_command(program, args);
        tracing::warn!("stderr: {stderr}");
        Err(DeployError::CommandFailed {
            command,
            status: output.status,
        })
    }
}

/// Run a command with stdin/stdout/stderr inherited (interactive).
pub fn run_interactive(program: &str, args: &[&str]) -> DeployResult<()> {
    tracing::debug!("$ {}", format_command(program, args));
    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|e| not_found_or_io(program, e))?;

    if status.success() {
        Ok(())
    } else {
        Err(DeployError::CommandFailed {
            command: format_command(program, args),
            status,
        })
    }
}

/// Run a command that pipes its stdin from a byte slice.
pub fn run_with_stdin(program: &str, args: &[&str], stdin_data: &[u8]) -> DeployResult<String> {
    use std::io::Write;

    tracing::debug!("$ {}", format_command(program, args));
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| not_found_or_io(program, e))?;

    if let Some(stdin) = &mut child.stdin {
        stdin.write_all(stdin_data)?;
    }
    drop(child.stdin.take());

    let output = child.wait_with_output()?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        tracing::warn!("stderr: {stderr}");
        Err(DeployError::CommandFailed {
            command: format_command(program, args),
            status: output.status,
        })
    }
}

/// Run a shell pipeline (via `sh -c`).
pub fn run_pipeline(shell_cmd: &str) -> DeployResult<()> {
    run_interactive("sh", &["-c", shell_cmd])
}

/// Check if a command exists on PATH.
#[must_use]
pub fn command_exists(program: &str) -> bool {
    Command::new("which")
        .arg(program)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|s| s.success())
}

/// Quote a word for POSIX `sh`. Words made only of safe
/// characters are returned unchanged.
#[must_use]
pub fn quote(word: &str) -> String {
    let safe = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./:=@%+,".contains(c));
    if safe {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', "'\\''"))
    }
}

/// Join a program and its arguments into one shell command line.
#[must_use]
pub fn shell_line(program: &str, args: &[&str]) -> String {
    let mut parts = vec![quote(program)];
    parts.extend(args.iter().map(|a| quote(a)));
    parts.join(" ")
}

fn spawn(program: &str, args: &[&str]) -> DeployResult<Output> {
    Command::new(program)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| not_found_or_io(program, e))
}

fn not_found_or_io(program: &str, e: std::io::Error) -> DeployError {
    if e.kind() == std::io::ErrorKind::NotFound {
        DeployError::CommandNotFound(program.to_string())
    } else {
        DeployError::Io(e)
    }
}

fn format_command(program: &str, args: &[&str]) -> String {
    let mut parts = vec![program.to_string()];
    parts.extend(args.iter().map(|a| (*a).to_string()));
    parts.join(" ")
}
