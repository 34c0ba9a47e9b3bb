#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Duration;

use postiz_deploy::cmd::{FileEntry, Runner};
use postiz_deploy::error::{DeployError, DeployResult};

/// Records every external effect instead of performing it.
#[derive(Default)]
pub struct FakeRunner {
    pub calls: RefCell<Vec<String>>,
    pub files: RefCell<BTreeMap<String, String>>,
    pub paths: RefCell<HashSet<String>>,
    pub commands: HashSet<String>,
    pub outputs: HashMap<String, String>,
    pub failing: Vec<String>,
    pub listing: Vec<FileEntry>,
}

impl FakeRunner {
    /// A root shell on a Debian host with nothing else installed.
    pub fn debian() -> Self {
        Self::default()
            .with_commands(&["apt-get"])
            .with_output("id -u", "0")
    }

    pub fn with_commands(mut self, commands: &[&str]) -> Self {
        self.commands.extend(commands.iter().map(ToString::to_string));
        self
    }

    pub fn with_path(self, path: &str) -> Self {
        self.paths.borrow_mut().insert(path.to_string());
        self
    }

    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.paths.borrow_mut().insert(path.to_string());
        self.files
            .borrow_mut()
            .insert(path.to_string(), content.to_string());
        self
    }

    pub fn with_output(mut self, line: &str, stdout: &str) -> Self {
        self.outputs.insert(line.to_string(), stdout.to_string());
        self
    }

    /// Any command line starting with `prefix` fails.
    pub fn failing(mut self, prefix: &str) -> Self {
        self.failing.push(prefix.to_string());
        self
    }

    pub fn with_listing(mut self, entries: Vec<FileEntry>) -> Self {
        self.listing = entries;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn file(&self, path: &str) -> Option<String> {
        self.files.borrow().get(path).cloned()
    }

    pub fn called(&self, prefix: &str) -> bool {
        self.calls.borrow().iter().any(|c| c.starts_with(prefix))
    }

    /// Index of the first call starting with `prefix`.
    pub fn position(&self, prefix: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .position(|c| c.starts_with(prefix))
            .unwrap_or_else(|| panic!("no call starting with '{prefix}' in {:#?}", self.calls()))
    }

    fn record(&self, line: String) -> DeployResult<()> {
        let fails = self.failing.iter().any(|p| line.starts_with(p.as_str()));
        self.calls.borrow_mut().push(line.clone());
        if fails {
            Err(DeployError::Other(format!("command failed: {line}")))
        } else {
            Ok(())
        }
    }
}

fn line(program: &str, args: &[&str]) -> String {
    let mut parts = vec![program];
    parts.extend_from_slice(args);
    parts.join(" ")
}

impl Runner for FakeRunner {
    fn run(&self, program: &str, args: &[&str]) -> DeployResult<String> {
        let line = line(program, args);
        self.record(line.clone())?;
        Ok(self.outputs.get(&line).cloned().unwrap_or_default())
    }

    fn run_interactive(&self, program: &str, args: &[&str]) -> DeployResult<()> {
        self.record(line(program, args))
    }

    fn run_shell(&self, shell_cmd: &str) -> DeployResult<()> {
        self.record(format!("sh -c {shell_cmd}"))
    }

    fn command_exists(&self, program: &str) -> bool {
        self.commands.contains(program)
    }

    fn path_exists(&self, path: &str) -> bool {
        self.paths.borrow().contains(path)
    }

    fn read_file(&self, path: &str) -> DeployResult<String> {
        self.file(path)
            .ok_or_else(|| DeployError::FileNotFound(path.to_string()))
    }

    fn write_file(&self, path: &str, content: &str) -> DeployResult<()> {
        self.record(format!("write {path}"))?;
        self.paths.borrow_mut().insert(path.to_string());
        self.files
            .borrow_mut()
            .insert(path.to_string(), content.to_string());
        Ok(())
    }

    fn remove_file(&self, path: &str) -> DeployResult<()> {
        self.record(format!("rm {path}"))?;
        self.paths.borrow_mut().remove(path);
        Ok(())
    }

    fn remove_dir_all(&self, path: &str) -> DeployResult<()> {
        self.record(format!("rm -rf {path}"))?;
        self.paths.borrow_mut().remove(path);
        Ok(())
    }

    fn list_files(&self, dir: &str) -> DeployResult<Vec<FileEntry>> {
        self.record(format!("ls {dir}"))?;
        Ok(self.listing.clone())
    }

    fn sleep(&self, duration: Duration) {
        self.calls
            .borrow_mut()
            .push(format!("sleep {}s", duration.as_secs()));
    }
}
