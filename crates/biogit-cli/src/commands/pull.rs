use anyhow::Result;
use clap::Args;

use biogit_client::pull;
use biogit_merge::MergeOutcome;

use crate::Cli;

use super::{current_branch, open_repo};

#[derive(Args)]
pub struct PullArgs {
    /// Remote to pull from
    #[arg(default_value = "origin")]
    remote: String,

    /// Branch to pull (default: the current branch)
    branch: Option<String>,
}

pub fn run(args: &PullArgs, cli: &Cli) -> Result<i32> {
    let repo = open_repo(cli)?;
    let branch = match &args.branch {
        Some(branch) => branch.clone(),
        None => current_branch(&repo)?,
    };

    match pull(&repo, &args.remote, &branch)? {
        MergeOutcome::AlreadyUpToDate => println!("Already up to date."),
        MergeOutcome::FastForward(oid) => println!("Fast-forward to {}", &oid.to_hex()[..7]),
        MergeOutcome::Merged(oid) => println!("Merge made commit {}", &oid.to_hex()[..7]),
        MergeOutcome::Conflicts(paths) => {
            for path in &paths {
                println!("CONFLICT (content): merge conflict in {path}");
            }
            println!("Automatic merge failed; fix conflicts and then commit the result.");
            return Ok(1);
        }
    }
    Ok(0)
}
