use anyhow::Result;
use clap::Args;

use biogit_client::Connection;
use biogit_repository::Repository;

use crate::Cli;

#[derive(Args)]
pub struct LoginArgs {
    /// Server address (host:port)
    server: String,

    /// Account name
    username: String,

    /// Account password
    password: String,
}

pub fn run(args: &LoginArgs, _cli: &Cli) -> Result<i32> {
    let mut connection = Connection::connect(&args.server)?;
    let token = connection.login(&args.username, &args.password)?;

    // Inside a repository the token is stored for push/fetch/pull; outside,
    // it is printed so the caller can export it for `clone`.
    let cwd = std::env::current_dir()?;
    match Repository::discover(&cwd) {
        Ok(repo) => {
            repo.store_token(&token)?;
            println!("Logged in as {}; token stored", args.username);
        }
        Err(_) => {
            println!("{token}");
        }
    }
    Ok(0)
}
