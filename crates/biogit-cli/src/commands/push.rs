use anyhow::Result;
use clap::Args;

use biogit_client::push;

use crate::Cli;

use super::{current_branch, open_repo};

#[derive(Args)]
pub struct PushArgs {
    /// Allow a non-fast-forward update
    #[arg(short = 'f', long)]
    force: bool,

    /// Remote to push to
    #[arg(default_value = "origin")]
    remote: String,

    /// Branch to push (default: the current branch)
    branch: Option<String>,
}

pub fn run(args: &PushArgs, cli: &Cli) -> Result<i32> {
    let repo = open_repo(cli)?;
    let branch = match &args.branch {
        Some(branch) => branch.clone(),
        None => current_branch(&repo)?,
    };

    let result = push(&repo, &args.remote, &branch, args.force)?;
    println!(
        "To {}: {} -> {} ({} objects)",
        args.remote,
        branch,
        &result.new_tip.to_hex()[..7],
        result.objects_sent
    );
    Ok(0)
}
