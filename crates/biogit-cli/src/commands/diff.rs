use anyhow::Result;
use bstr::BString;
use clap::Args;

use biogit_diff::format_patch;
use biogit_repository::DiffTarget;

use crate::Cli;

use super::open_repo;

#[derive(Args)]
pub struct DiffArgs {
    /// Compare the index against HEAD instead of the working tree
    #[arg(long)]
    staged: bool,

    /// Lines of context around each change
    #[arg(short = 'U', long = "unified", default_value = "3")]
    unified: usize,

    /// Commits to compare (one: commit vs working tree; two: tree vs tree)
    #[arg(value_name = "commit")]
    commits: Vec<String>,

    /// Limit the diff to these paths
    #[arg(last = true, value_name = "path")]
    paths: Vec<String>,
}

pub fn run(args: &DiffArgs, cli: &Cli) -> Result<i32> {
    let repo = open_repo(cli)?;

    let target = if args.staged {
        DiffTarget::IndexHead
    } else {
        match args.commits.as_slice() {
            [] => DiffTarget::WorkdirIndex,
            [one] => DiffTarget::CommitWorkdir(repo.resolve_revision(one)?),
            [old, new] => {
                DiffTarget::Commits(repo.resolve_revision(old)?, repo.resolve_revision(new)?)
            }
            more => anyhow::bail!("too many commits: {}", more.len()),
        }
    };

    let paths: Vec<BString> = args.paths.iter().map(|p| BString::from(p.as_str())).collect();
    let patches = repo.diff(&target, &paths, args.unified)?;
    print!("{}", format_patch(&patches));
    Ok(0)
}
