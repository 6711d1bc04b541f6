use anyhow::Result;
use clap::Args;

use biogit_client::fetch;

use crate::Cli;

use super::open_repo;

#[derive(Args)]
pub struct FetchArgs {
    /// Remote to fetch from
    #[arg(default_value = "origin")]
    remote: String,

    /// Fetch only this branch
    branch: Option<String>,
}

pub fn run(args: &FetchArgs, cli: &Cli) -> Result<i32> {
    let repo = open_repo(cli)?;
    let result = fetch(&repo, &args.remote, args.branch.as_deref())?;

    for (branch, tip) in &result.updated {
        println!(
            "{} -> refs/remotes/{}/{}",
            &tip.to_hex()[..7],
            args.remote,
            branch
        );
    }
    println!("Received {} objects", result.objects_received);
    Ok(0)
}
