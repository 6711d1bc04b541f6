use anyhow::Result;
use clap::Args;

use biogit_repository::StatusKind;

use crate::Cli;

use super::open_repo;

#[derive(Args)]
pub struct StatusArgs {}

pub fn run(_args: &StatusArgs, cli: &Cli) -> Result<i32> {
    let repo = open_repo(cli)?;
    let status = repo.status()?;

    match (&status.branch, &status.detached) {
        (Some(branch), _) => println!("On branch {branch}"),
        (None, Some(oid)) => println!("HEAD detached at {}", &oid.to_hex()[..7]),
        (None, None) => println!("On an unborn branch"),
    }

    if status.merge_in_progress {
        println!("You have an unfinished merge (MERGE_HEAD exists).");
        if !status.conflicts.is_empty() {
            println!("Unresolved conflicts:");
            for path in &status.conflicts {
                println!("\tboth modified:   {path}");
            }
        }
    }

    let staged: Vec<_> = status
        .entries
        .iter()
        .filter(|e| {
            matches!(
                e.kind,
                StatusKind::StagedNew | StatusKind::StagedModified | StatusKind::StagedDeleted
            )
        })
        .collect();
    if !staged.is_empty() {
        println!("Changes to be committed:");
        for entry in &staged {
            let what = match entry.kind {
                StatusKind::StagedNew => "new file",
                StatusKind::StagedDeleted => "deleted",
                _ => "modified",
            };
            println!("\t{what}:   {}", entry.path);
        }
    }

    let unstaged: Vec<_> = status
        .entries
        .iter()
        .filter(|e| e.kind == StatusKind::WorkdirModified)
        .collect();
    if !unstaged.is_empty() {
        println!("Changes not staged for commit:");
        for entry in &unstaged {
            println!("\tmodified:   {}", entry.path);
        }
    }

    let untracked: Vec<_> = status
        .entries
        .iter()
        .filter(|e| e.kind == StatusKind::Untracked)
        .collect();
    if !untracked.is_empty() {
        println!("Untracked files:");
        for entry in &untracked {
            println!("\t{}", entry.path);
        }
    }

    if status.is_clean() {
        println!("nothing to commit, working tree clean");
    }
    Ok(0)
}
