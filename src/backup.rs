use std::collections::BTreeMap;
use std::time::{Duration, SystemTime};

use crate::cmd::{FileEntry, Runner, quote};
use crate::env_file::EnvFile;
use crate::error::DeployResult;
use crate::postiz::{ENV_FILE_NAME, Postiz};

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Age thresholds for old dumps, in whole days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retention {
    pub compress_after_days: u64,
    pub delete_after_days: u64,
}

impl Default for Retention {
    fn default() -> Self {
        Self {
            compress_after_days: 7,
            delete_after_days: 30,
        }
    }
}

/// Files a retention pass will touch. Deletions run after
/// compression and may name archives the compression step creates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetentionPlan {
    pub compress: Vec<String>,
    pub delete: Vec<String>,
}

impl Retention {
    /// Decide which dumps to compress and which archives to delete.
    ///
    /// Ages follow `find -mtime +N`: whole elapsed days, strictly
    /// greater than the threshold. Files with a modification time
    /// in the future count as zero days old. Deletions are decided
    /// on the state after compression: `gzip -f` replaces an archive
    /// of the same name and keeps the dump's modification time, so a
    /// plain dump past the delete threshold is compressed and then
    /// deleted in the same pass. Each archive is deleted at most once.
    #[must_use]
    pub fn plan(&self, entries: &[FileEntry], now: SystemTime) -> RetentionPlan {
        let mut compress = Vec::new();
        let mut archives: BTreeMap<String, u64> = entries
            .iter()
            .filter(|entry| entry.path.ends_with(".sql.gz"))
            .map(|entry| (entry.path.clone(), age_days(entry.modified, now)))
            .collect();

        for entry in entries.iter().filter(|entry| entry.path.ends_with(".sql")) {
            let days = age_days(entry.modified, now);
            if days > self.compress_after_days {
                compress.push(entry.path.clone());
                archives.insert(format!("{}.gz", entry.path), days);
            }
        }

        let delete = archives
            .into_iter()
            .filter(|(_, days)| *days > self.delete_after_days)
            .map(|(path, _)| path)
            .collect();

        RetentionPlan { compress, delete }
    }

    /// Run a plan through `runner`.
    pub fn apply(&self, runner: &dyn Runner, plan: &RetentionPlan) -> DeployResult<()> {
        for path in &plan.compress {
            tracing::info!("Compressing {path}");
            runner.run("gzip", &["-f", path])?;
        }
        for path in &plan.delete {
            tracing::info!("Deleting {path}");
            runner.remove_file(path)?;
        }
        Ok(())
    }
}

fn age_days(modified: SystemTime, now: SystemTime) -> u64 {
    now.duration_since(modified)
        .unwrap_or(Duration::ZERO)
        .as_secs()
        / SECS_PER_DAY
}

/// Where and how database dumps are kept.
#[derive(Debug, Clone)]
pub struct BackupSettings {
    pub dir: String,
    pub retention: Retention,
    pub script_path: String,
    pub cron_path: String,
    /// Cron schedule for the nightly run.
    pub schedule: String,
}

impl Default for BackupSettings {
    fn default() -> Self {
        Self {
            dir: "/opt/postiz-backups".to_string(),
            retention: Retention::default(),
            script_path: "/usr/local/bin/postiz-backup".to_string(),
            cron_path: "/etc/cron.d/postiz-backup".to_string(),
            schedule: "0 2 * * *".to_string(),
        }
    }
}

/// What a backup run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupReport {
    pub dump_path: String,
    pub retention: RetentionPlan,
}

/// Render the `postiz-backup` helper installed on the server.
#[must_use]
pub fn render_script(postiz: &Postiz, settings: &BackupSettings) -> String {
    format!(
        r#"#!/bin/bash
# Postiz database backup
set -e

BACKUP_DIR={dir}
INSTALL_DIR={install_dir}
DATE=$(date +%Y%m%d_%H%M%S)

mkdir -p "$BACKUP_DIR"
cd "$INSTALL_DIR"

docker-compose --env-file {env_file} exec -T postgres pg_dump -U {user} {db} > "$BACKUP_DIR/postiz_$DATE.sql"

find "$BACKUP_DIR" -name "*.sql" -mtime +{compress} -exec gzip -f {{}} \;
find "$BACKUP_DIR" -name "*.sql.gz" -mtime +{delete} -delete

echo "Backup completed: $BACKUP_DIR/postiz_$DATE.sql"
"#,
        dir = quote(&settings.dir),
        install_dir = quote(&postiz.install_dir),
        env_file = ENV_FILE_NAME,
        user = quote(&postiz.db_user),
        db = quote(&postiz.db_name),
        compress = settings.retention.compress_after_days,
        delete = settings.retention.delete_after_days,
    )
}

/// Render the `/etc/cron.d` entry that runs the helper nightly.
#[must_use]
pub fn render_cron(settings: &BackupSettings) -> String {
    format!(
        "# Nightly Postiz database backup\n{} root {} >> /var/log/postiz-backup.log 2>&1\n",
        settings.schedule, settings.script_path
    )
}

/// Install the helper script and its cron entry.
pub fn install(runner: &dyn Runner, postiz: &Postiz, settings: &BackupSettings) -> DeployResult<()> {
    tracing::info!("Installing backup helper at {}", settings.script_path);
    runner.write_file(&settings.script_path, &render_script(postiz, settings))?;
    runner.run("chmod", &["+x", &settings.script_path])?;
    runner.write_file(&settings.cron_path, &render_cron(settings))?;
    runner.run("chmod", &["644", &settings.cron_path])?;
    Ok(())
}

/// Dump the database and apply the retention policy.
///
/// Database credentials come from the installed environment file
/// when it exists, falling back to the configured defaults.
pub fn run_backup(
    runner: &dyn Runner,
    postiz: &Postiz,
    settings: &BackupSettings,
    now: SystemTime,
) -> DeployResult<BackupReport> {
    let (user, db) = db_credentials(runner, postiz)?;

    let stamp = chrono::DateTime::<chrono::Local>::from(now).format("%Y%m%d_%H%M%S");
    let dump_path = format!("{}/postiz_{stamp}.sql", settings.dir);

    runner.run("mkdir", &["-p", &settings.dir])?;

    tracing::info!("Dumping database {db} to {dump_path}");
    let dumped = runner.run_shell(&format!(
        "cd {} && docker-compose --env-file {ENV_FILE_NAME} exec -T postgres pg_dump -U {} {} > {}",
        quote(&postiz.install_dir),
        quote(&user),
        quote(&db),
        quote(&dump_path),
    ));
    if let Err(e) = dumped {
        // The redirect has already created the file.
        if let Err(cleanup) = runner.remove_file(&dump_path) {
            tracing::warn!("could not remove partial dump {dump_path}: {cleanup}");
        }
        return Err(e);
    }

    let entries = runner.list_files(&settings.dir)?;
    let plan = settings.retention.plan(&entries, now);
    settings.retention.apply(runner, &plan)?;

    tracing::info!("Backup completed: {dump_path}");
    Ok(BackupReport {
        dump_path,
        retention: plan,
    })
}

fn db_credentials(runner: &dyn Runner, postiz: &Postiz) -> DeployResult<(String, String)> {
    let env_path = postiz.env_path();
    if !runner.path_exists(&env_path) {
        return Ok((postiz.db_user.clone(), postiz.db_name.clone()));
    }

    let env = EnvFile::parse(&runner.read_file(&env_path)?)?;
    let user = env.get("POSTGRES_USER").unwrap_or(postiz.db_user.as_str()).to_string();
    let db = env.get("POSTGRES_DB").unwrap_or(postiz.db_name.as_str()).to_string();
    Ok((user, db))
}
