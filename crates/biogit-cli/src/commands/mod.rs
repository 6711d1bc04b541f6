pub mod add;
pub mod branch;
pub mod clone;
pub mod commit;
pub mod config;
pub mod diff;
pub mod fetch;
pub mod init;
pub mod log;
pub mod login;
pub mod merge;
pub mod pull;
pub mod push;
pub mod register;
pub mod remote;
pub mod rm;
pub mod serve;
pub mod status;
pub mod switch;
pub mod tag;

use anyhow::Result;
use clap::Subcommand;

use biogit_repository::Repository;

use crate::Cli;

#[derive(Subcommand)]
pub enum Commands {
    /// Create an empty repository
    Init(init::InitArgs),
    /// Stage file contents for the next commit
    Add(add::AddArgs),
    /// Remove files from the index and working tree
    Rm(rm::RmArgs),
    /// Record the staged snapshot
    Commit(commit::CommitArgs),
    /// Show the working tree status
    Status(status::StatusArgs),
    /// Show commit history
    Log(log::LogArgs),
    /// Show changes between snapshots
    Diff(diff::DiffArgs),
    /// List, create, or delete branches
    Branch(branch::BranchArgs),
    /// Switch to a branch or commit
    Switch(switch::SwitchArgs),
    /// List, create, or delete tags
    Tag(tag::TagArgs),
    /// Merge another line of history into the current branch
    Merge(merge::MergeArgs),
    /// Manage remote repositories
    Remote(remote::RemoteArgs),
    /// Get or set configuration values
    Config(config::ConfigArgs),
    /// Update a remote ref from a local branch
    Push(push::PushArgs),
    /// Download objects and refs from a remote
    Fetch(fetch::FetchArgs),
    /// Fetch and merge a remote branch
    Pull(pull::PullArgs),
    /// Clone a remote repository
    Clone(clone::CloneArgs),
    /// Create an account on a remote server
    Register(register::RegisterArgs),
    /// Obtain and store a session token
    Login(login::LoginArgs),
    /// Host repositories for the wire protocol
    Serve(serve::ServeArgs),
}

pub fn run(cli: Cli) -> Result<i32> {
    match &cli.command {
        Commands::Init(args) => init::run(args, &cli),
        Commands::Add(args) => add::run(args, &cli),
        Commands::Rm(args) => rm::run(args, &cli),
        Commands::Commit(args) => commit::run(args, &cli),
        Commands::Status(args) => status::run(args, &cli),
        Commands::Log(args) => log::run(args, &cli),
        Commands::Diff(args) => diff::run(args, &cli),
        Commands::Branch(args) => branch::run(args, &cli),
        Commands::Switch(args) => switch::run(args, &cli),
        Commands::Tag(args) => tag::run(args, &cli),
        Commands::Merge(args) => merge::run(args, &cli),
        Commands::Remote(args) => remote::run(args, &cli),
        Commands::Config(args) => config::run(args, &cli),
        Commands::Push(args) => push::run(args, &cli),
        Commands::Fetch(args) => fetch::run(args, &cli),
        Commands::Pull(args) => pull::run(args, &cli),
        Commands::Clone(args) => clone::run(args, &cli),
        Commands::Register(args) => register::run(args, &cli),
        Commands::Login(args) => login::run(args, &cli),
        Commands::Serve(args) => serve::run(args, &cli),
    }
}

/// Open the repository containing the current directory.
pub fn open_repo(_cli: &Cli) -> Result<Repository> {
    let cwd = std::env::current_dir()?;
    Ok(Repository::discover(&cwd)?)
}

/// The directory command-line paths are relative to.
pub fn cwd() -> Result<std::path::PathBuf> {
    Ok(std::env::current_dir()?)
}

/// The current branch's short name, for commands that default to it.
pub fn current_branch(repo: &Repository) -> Result<String> {
    repo.refs()
        .current_branch()?
        .map(|name| name.short().to_string())
        .ok_or_else(|| anyhow::anyhow!("HEAD is detached; name a branch explicitly"))
}
