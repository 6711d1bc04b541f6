use anyhow::Result;
use clap::Args;

use crate::Cli;

use super::open_repo;

#[derive(Args)]
pub struct ConfigArgs {
    /// Remove the key instead of setting it
    #[arg(long)]
    unset: bool,

    /// List every configured key
    #[arg(short = 'l', long = "list")]
    list: bool,

    /// Flat key, e.g. user.name or remote.origin.url
    key: Option<String>,

    /// Value to assign; omit to print the current value
    value: Option<String>,
}

pub fn run(args: &ConfigArgs, cli: &Cli) -> Result<i32> {
    let repo = open_repo(cli)?;
    let mut config = repo.config()?;

    if args.list {
        for (key, value) in config.entries() {
            println!("{key}={value}");
        }
        return Ok(0);
    }

    let Some(key) = &args.key else {
        anyhow::bail!("a key is required");
    };

    if args.unset {
        if config.unset(key) {
            config.write()?;
        }
        return Ok(0);
    }

    match &args.value {
        None => match config.get(key) {
            Some(value) => println!("{value}"),
            None => return Ok(1),
        },
        Some(value) => {
            config.set(key, value)?;
            config.write()?;
        }
    }
    Ok(0)
}
