use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use biogit_server::{Server, ServerConfig};
use biogit_protocol::DEFAULT_TOKEN_LIFETIME_SECS;

use crate::Cli;

#[derive(Args)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0")]
    listen: String,

    /// Port to listen on
    #[arg(long, default_value = "9418")]
    port: u16,

    /// Directory holding the served repositories
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Secret used to sign session tokens
    #[arg(long)]
    secret: String,

    /// Token lifetime in seconds
    #[arg(long, default_value_t = DEFAULT_TOKEN_LIFETIME_SECS)]
    token_lifetime: u64,

    /// Worker threads for the session pool
    #[arg(long, default_value = "4")]
    threads: usize,
}

pub fn run(args: &ServeArgs, _cli: &Cli) -> Result<i32> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(args.threads.max(1))
        .enable_all()
        .build()?;

    let addr = format!("{}:{}", args.listen, args.port);
    runtime.block_on(async {
        let server = Server::bind(
            &addr,
            ServerConfig {
                root: args.root.clone(),
                secret: args.secret.clone(),
                token_lifetime_secs: args.token_lifetime,
            },
        )
        .await?;
        println!("Listening on {addr}");
        server.run().await?;
        Ok::<_, anyhow::Error>(())
    })?;

    Ok(0)
}
