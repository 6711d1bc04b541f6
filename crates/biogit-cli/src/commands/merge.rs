use anyhow::Result;
use clap::Args;

use biogit_merge::{merge, MergeOutcome};

use crate::Cli;

use super::open_repo;

#[derive(Args)]
pub struct MergeArgs {
    /// Branch, tag, or commit to merge into the current branch
    target: String,

    /// Message for the merge commit
    #[arg(short = 'm', long = "message")]
    message: Option<String>,
}

pub fn run(args: &MergeArgs, cli: &Cli) -> Result<i32> {
    let repo = open_repo(cli)?;

    match merge(&repo, &args.target, args.message.as_deref())? {
        MergeOutcome::AlreadyUpToDate => {
            println!("Already up to date.");
            Ok(0)
        }
        MergeOutcome::FastForward(oid) => {
            println!("Fast-forward to {}", &oid.to_hex()[..7]);
            Ok(0)
        }
        MergeOutcome::Merged(oid) => {
            println!("Merge made commit {}", &oid.to_hex()[..7]);
            Ok(0)
        }
        MergeOutcome::Conflicts(paths) => {
            for path in &paths {
                println!("CONFLICT (content): merge conflict in {path}");
            }
            println!("Automatic merge failed; fix conflicts and then commit the result.");
            Ok(1)
        }
    }
}
