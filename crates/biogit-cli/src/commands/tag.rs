use anyhow::{bail, Result};
use clap::Args;

use crate::Cli;

use super::open_repo;

#[derive(Args)]
pub struct TagArgs {
    /// Delete a tag
    #[arg(short = 'd')]
    delete: bool,

    /// Tag name to create or delete; lists tags when omitted
    name: Option<String>,

    /// Revision to tag (default: HEAD)
    target: Option<String>,
}

pub fn run(args: &TagArgs, cli: &Cli) -> Result<i32> {
    let repo = open_repo(cli)?;

    match &args.name {
        None => {
            if args.delete {
                bail!("tag name required");
            }
            for (name, _) in repo.tag_list()? {
                println!("{name}");
            }
        }
        Some(name) if args.delete => {
            repo.tag_delete(name)?;
            println!("Deleted tag {name}");
        }
        Some(name) => {
            repo.tag_create(name, args.target.as_deref())?;
        }
    }
    Ok(0)
}
