use anyhow::Result;
use clap::{Args, Subcommand};

use crate::Cli;

use super::open_repo;

#[derive(Args)]
pub struct RemoteArgs {
    #[command(subcommand)]
    command: Option<RemoteCommand>,
}

#[derive(Subcommand)]
enum RemoteCommand {
    /// Add a remote
    Add { name: String, url: String },
    /// Remove a remote and its tracking refs
    Remove { name: String },
}

pub fn run(args: &RemoteArgs, cli: &Cli) -> Result<i32> {
    let repo = open_repo(cli)?;

    match &args.command {
        None => {
            let config = repo.config()?;
            for remote in config.subsections("remote") {
                println!("{remote}");
            }
        }
        Some(RemoteCommand::Add { name, url }) => repo.remote_add(name, url)?,
        Some(RemoteCommand::Remove { name }) => repo.remote_remove(name)?,
    }
    Ok(0)
}
