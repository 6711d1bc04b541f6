use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;

use crate::Cli;

use super::{cwd, open_repo};

#[derive(Args)]
pub struct AddArgs {
    /// Stage the entire working tree, including deletions
    #[arg(short = 'A', long = "all")]
    all: bool,

    /// Files or directories to stage
    #[arg(value_name = "pathspec")]
    paths: Vec<PathBuf>,
}

pub fn run(args: &AddArgs, cli: &Cli) -> Result<i32> {
    let repo = open_repo(cli)?;

    if args.all || args.paths.iter().any(|p| p == std::path::Path::new(".")) {
        repo.add_all()?;
        return Ok(0);
    }
    if args.paths.is_empty() {
        bail!("Nothing specified, nothing added.\nMaybe you wanted to say 'biogit add .'?");
    }

    repo.add_paths(&cwd()?, &args.paths)?;
    Ok(0)
}
