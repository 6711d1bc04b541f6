use anyhow::{bail, Result};
use clap::Args;

use crate::Cli;

use super::open_repo;

#[derive(Args)]
pub struct BranchArgs {
    /// Delete a fully merged branch
    #[arg(short = 'd')]
    delete: bool,

    /// Delete a branch regardless of merge status
    #[arg(short = 'D')]
    force_delete: bool,

    /// Branch name to create or delete; lists branches when omitted
    name: Option<String>,

    /// Revision the new branch should start at (default: HEAD)
    start_point: Option<String>,
}

pub fn run(args: &BranchArgs, cli: &Cli) -> Result<i32> {
    let repo = open_repo(cli)?;

    match &args.name {
        None => {
            if args.delete || args.force_delete {
                bail!("branch name required");
            }
            for (name, _, is_current) in repo.branch_list()? {
                let marker = if is_current { "*" } else { " " };
                println!("{marker} {name}");
            }
        }
        Some(name) if args.delete || args.force_delete => {
            repo.branch_delete(name, args.force_delete)?;
            println!("Deleted branch {name}");
        }
        Some(name) => {
            repo.branch_create(name, args.start_point.as_deref())?;
        }
    }
    Ok(0)
}
