use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;

use crate::Cli;

#[derive(Args)]
pub struct CloneArgs {
    /// Remote URL (host:port/path)
    url: String,

    /// Target directory (default: last path segment of the URL)
    directory: Option<PathBuf>,

    /// Session token (default: the BIOGIT_TOKEN environment variable)
    #[arg(long)]
    token: Option<String>,
}

pub fn run(args: &CloneArgs, _cli: &Cli) -> Result<i32> {
    let token = match &args.token {
        Some(token) => token.clone(),
        None => match std::env::var("BIOGIT_TOKEN") {
            Ok(token) => token,
            Err(_) => bail!("no token: pass --token or set BIOGIT_TOKEN (see `biogit login`)"),
        },
    };

    let target = match &args.directory {
        Some(dir) => dir.clone(),
        None => {
            let name = args
                .url
                .rsplit('/')
                .next()
                .filter(|segment| !segment.is_empty())
                .unwrap_or("repository");
            PathBuf::from(name)
        }
    };

    if target.exists() && target.read_dir()?.next().is_some() {
        bail!("destination path '{}' already exists and is not empty", target.display());
    }

    println!("Cloning into '{}'...", target.display());
    biogit_client::clone(&args.url, &target, &token)?;
    Ok(0)
}
