use anyhow::Result;
use clap::Args;

use crate::Cli;

use super::open_repo;

#[derive(Args)]
pub struct SwitchArgs {
    /// Branch, tag, or commit to switch to
    target: String,
}

pub fn run(args: &SwitchArgs, cli: &Cli) -> Result<i32> {
    let repo = open_repo(cli)?;
    repo.switch(&args.target)?;

    match repo.refs().current_branch()? {
        Some(branch) => println!("Switched to branch '{}'", branch.short()),
        None => {
            if let Some(oid) = repo.head_commit()? {
                println!("HEAD is now at {}", &oid.to_hex()[..7]);
            }
        }
    }
    Ok(0)
}
