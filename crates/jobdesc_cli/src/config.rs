//! Runtime configuration from flags, environment and `.env`.

use anyhow::Context;
use clap::Args;
use jobdesc_core::{
    default_log_level, init_logging, JobDescriptionRepository, SqliteContainer,
    SqliteDocumentDatabase,
};
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct CliConfig {
    /// SQLite file holding the document store
    #[arg(long, env = "JOBDESC_DB_PATH", default_value = "jobdesc.sqlite3", global = true)]
    pub db_path: PathBuf,

    /// trace|debug|info|warn|error; defaults by build mode
    #[arg(long, env = "JOBDESC_LOG_LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Directory for rolling log files; logging stays off when unset
    #[arg(long, env = "JOBDESC_LOG_DIR", global = true)]
    pub log_dir: Option<PathBuf>,
}

impl CliConfig {
    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or_else(|| default_log_level())
    }

    pub fn init_logging(&self) -> anyhow::Result<()> {
        let Some(log_dir) = &self.log_dir else {
            return Ok(());
        };
        let log_dir = absolute(log_dir)?;
        let log_dir = log_dir
            .to_str()
            .with_context(|| format!("log dir `{}` is not valid UTF-8", log_dir.display()))?;
        init_logging(self.log_level(), log_dir)?;
        Ok(())
    }

    pub fn open_repository(&self) -> anyhow::Result<JobDescriptionRepository<SqliteContainer>> {
        let db = SqliteDocumentDatabase::open(&self.db_path)
            .with_context(|| format!("opening `{}`", self.db_path.display()))?;
        Ok(JobDescriptionRepository::new(&db)?)
    }
}

fn absolute(path: &Path) -> anyhow::Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("resolving current directory")?;
    Ok(cwd.join(path))
}
