//! Subcommand implementations.

use anyhow::{bail, Context};
use clap::Args;
use jobdesc_core::{JobDescriptionRepository, SqliteContainer};
use serde_json::{json, Value};
use std::io::Read;
use std::path::{Path, PathBuf};

type Repo = JobDescriptionRepository<SqliteContainer>;

#[derive(Debug, Args)]
pub struct UpsertArgs {
    /// JSON payload file, or `-` for stdin
    pub payload: PathBuf,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(long = "user")]
    pub user_id: String,

    /// Only active (`true`) or inactive (`false`) records
    #[arg(long)]
    pub active: Option<bool>,
}

#[derive(Debug, Args)]
pub struct RecordArgs {
    #[arg(long = "user")]
    pub user_id: String,

    /// Record id (UUID)
    pub id: String,
}

#[derive(Debug, Args)]
pub struct WipeArgs {
    /// Required; wipe removes every user's records
    #[arg(long)]
    pub yes: bool,
}

pub fn upsert(repo: &Repo, args: UpsertArgs) -> anyhow::Result<()> {
    let raw = read_payload(&args.payload)?;
    let payload: Value = serde_json::from_str(&raw).context("payload is not valid JSON")?;
    let record = repo.upsert(&payload)?;
    print_json(&record.to_payload())
}

pub fn list(repo: &Repo, args: ListArgs) -> anyhow::Result<()> {
    let records = repo.list(&args.user_id, args.active)?;
    let payloads = records.iter().map(|record| record.to_payload()).collect();
    print_json(&Value::Array(payloads))
}

pub fn get(repo: &Repo, args: RecordArgs) -> anyhow::Result<()> {
    match repo.get_by_id(&args.user_id, args.id.as_str())? {
        Some(record) => print_json(&record.to_payload()),
        None => bail!("job description {} not found", args.id),
    }
}

pub fn delete(repo: &Repo, args: RecordArgs) -> anyhow::Result<()> {
    let deleted = repo.delete(&args.user_id, args.id.as_str())?;
    print_json(&json!({ "id": args.id, "deleted": deleted }))
}

pub fn wipe(repo: &Repo, args: WipeArgs) -> anyhow::Result<()> {
    if !args.yes {
        bail!("refusing to delete every job description without --yes");
    }
    let deleted = repo.delete_all()?;
    print_json(&json!({ "deleted": deleted }))
}

fn read_payload(path: &Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("reading payload from stdin")?;
        return Ok(raw);
    }
    std::fs::read_to_string(path).with_context(|| format!("reading `{}`", path.display()))
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
