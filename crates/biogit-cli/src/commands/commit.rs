use anyhow::Result;
use clap::Args;

use crate::Cli;

use super::open_repo;

#[derive(Args)]
pub struct CommitArgs {
    /// Commit message
    #[arg(short = 'm', long = "message", required = true)]
    message: String,
}

pub fn run(args: &CommitArgs, cli: &Cli) -> Result<i32> {
    let repo = open_repo(cli)?;
    let oid = repo.commit(&args.message)?;

    let branch = repo
        .refs()
        .current_branch()?
        .map(|name| name.short().to_string())
        .unwrap_or_else(|| "detached HEAD".to_string());
    println!("[{branch} {}] {}", &oid.to_hex()[..7], args.message.lines().next().unwrap_or(""));
    Ok(0)
}
