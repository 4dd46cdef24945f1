use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tracing::{error, info, info_span, Instrument};
use tracing_subscriber::EnvFilter;

mod commands;
mod dispatcher;
mod error;
mod glob;
mod keyspace;
mod parser;
mod resp;
mod util;
mod value;

use dispatcher::{Connection, Outcome};
use keyspace::Keyspace;
use parser::RequestParser;

#[derive(Parser, Debug)]
#[command(name = "kartondb", about = "An in-memory key-value server")]
struct Cli {
    /// TCP port to listen on.
    #[arg(long, default_value_t = 6379)]
    port: u16,

    /// Number of logical databases.
    #[arg(long, default_value_t = 16)]
    databases: usize,

    /// Raise the log level to debug.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let addr = format!("127.0.0.1:{}", cli.port);
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, databases = cli.databases, "listening");

    let keyspace = Arc::new(Mutex::new(Keyspace::new(cli.databases)));

    loop {
        let (stream, peer) = listener.accept().await?;
        let keyspace = keyspace.clone();
        tokio::spawn(
            async move {
                info!("connection accepted");
                if let Err(err) = handle_connection(stream, keyspace).await {
                    error!(%err, "connection ended with error");
                }
                info!("connection closed");
            }
            .instrument(info_span!("connection", %peer)),
        );
    }
}

async fn handle_connection(mut stream: TcpStream, keyspace: Arc<Mutex<Keyspace>>) -> Result<()> {
    let mut parser = RequestParser::new();
    let mut conn = Connection::new();
    let mut buf = [0u8; 4096];

    loop {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        parser.feed(&buf[..n]);

        loop {
            let frame = match parser.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(err) => {
                    let reply = resp::RespValue::error(format!("{}", err));
                    stream.write_all(&reply.encode()).await?;
                    return Ok(());
                }
            };

            let mut keyspace = keyspace.lock().await;
            let outcome = dispatcher::dispatch(&mut keyspace, &mut conn, &frame);
            drop(keyspace);

            match outcome {
                Outcome::Reply(reply) => {
                    stream.write_all(&reply.encode()).await?;
                }
                Outcome::Close(reply) => {
                    stream.write_all(&reply.encode()).await?;
                    return Ok(());
                }
            }
        }
    }
}
