use anyhow::Result;
use bstr::ByteSlice;
use chrono::{FixedOffset, TimeZone};
use clap::Args;

use biogit_revwalk::history;

use crate::Cli;

use super::open_repo;

#[derive(Args)]
pub struct LogArgs {
    /// Limit the number of commits shown
    #[arg(short = 'n', long = "max-count")]
    max_count: Option<usize>,
}

pub fn run(args: &LogArgs, cli: &Cli) -> Result<i32> {
    let repo = open_repo(cli)?;
    let Some(head) = repo.head_commit()? else {
        println!("No commits yet");
        return Ok(0);
    };

    let commits = history(repo.store(), &head)?;
    let limit = args.max_count.unwrap_or(usize::MAX);

    for (oid, commit) in commits.into_iter().take(limit) {
        println!("commit {oid}");
        if commit.is_merge() {
            let short: Vec<String> = commit
                .parents
                .iter()
                .map(|p| p.to_hex()[..7].to_string())
                .collect();
            println!("Merge: {}", short.join(" "));
        }
        println!(
            "Author: {} <{}>",
            commit.author.name.to_str_lossy(),
            commit.author.email.to_str_lossy()
        );
        println!("Date:   {}", format_date(commit.author.when.seconds, commit.author.when.offset_minutes));
        println!();
        for line in commit.message.to_str_lossy().lines() {
            println!("    {line}");
        }
        println!();
    }
    Ok(0)
}

/// Render a timestamp the way `git log` does by default.
fn format_date(seconds: i64, offset_minutes: i32) -> String {
    let offset = FixedOffset::east_opt(offset_minutes * 60)
        .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset is valid"));
    match offset.timestamp_opt(seconds, 0) {
        chrono::LocalResult::Single(dt) => dt.format("%a %b %e %H:%M:%S %Y %z").to_string(),
        _ => format!("{seconds} {offset_minutes:+}"),
    }
}
