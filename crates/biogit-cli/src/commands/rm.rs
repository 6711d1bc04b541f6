use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;

use crate::Cli;

use super::{cwd, open_repo};

#[derive(Args)]
pub struct RmArgs {
    /// Only remove from the index, leaving the file on disk
    #[arg(long)]
    cached: bool,

    /// Files to remove
    #[arg(value_name = "pathspec")]
    paths: Vec<PathBuf>,
}

pub fn run(args: &RmArgs, cli: &Cli) -> Result<i32> {
    if args.paths.is_empty() {
        bail!("No pathspec was given. Which files should I remove?");
    }
    let repo = open_repo(cli)?;
    repo.rm_paths(&cwd()?, &args.paths, args.cached)?;
    Ok(0)
}
