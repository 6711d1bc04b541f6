use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use biogit_repository::Repository;

use crate::Cli;

#[derive(Args)]
pub struct InitArgs {
    /// Create a bare repository (no working tree)
    #[arg(long)]
    bare: bool,

    /// Directory to initialize (default: current directory)
    directory: Option<PathBuf>,
}

pub fn run(args: &InitArgs, _cli: &Cli) -> Result<i32> {
    let target = match &args.directory {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };

    let repo = if args.bare {
        Repository::init_bare(&target)?
    } else {
        Repository::init(&target)?
    };

    println!(
        "Initialized empty biogit repository in {}",
        repo.git_dir().display()
    );
    Ok(0)
}
