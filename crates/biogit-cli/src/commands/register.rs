use anyhow::Result;
use clap::Args;

use biogit_client::Connection;

use crate::Cli;

#[derive(Args)]
pub struct RegisterArgs {
    /// Server address (host:port)
    server: String,

    /// Account name
    username: String,

    /// Account password
    password: String,
}

pub fn run(args: &RegisterArgs, _cli: &Cli) -> Result<i32> {
    let mut connection = Connection::connect(&args.server)?;
    connection.register(&args.username, &args.password)?;
    println!("Account '{}' created on {}", args.username, args.server);
    Ok(0)
}
