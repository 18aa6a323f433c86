//! Accepts one connection, opens a channel per the client's request, and
//! echoes back whatever it receives on that channel.

use std::sync::Arc;

use clap::Parser;
use msock::{ConnectionHandler, ConnectionOptions, NoopHandler};
use msock_net::Listener;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
struct Args {
    /// tcp://host:port or unix://path to listen on
    #[arg(long, default_value = "tcp://127.0.0.1:4500")]
    listen: String,
}

fn main() {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args = Args::parse();
    let listener = Listener::bind(&args.listen).expect("failed to bind");
    tracing::info!(listen = %args.listen, "echo server listening");

    loop {
        let conn = match listener.accept_one(ConnectionOptions::default(), Arc::new(NoopHandler) as Arc<dyn ConnectionHandler>) {
            Ok(conn) => conn,
            Err(err) => {
                tracing::warn!(?err, "accept failed");
                continue;
            }
        };

        std::thread::spawn(move || {
            let channel = conn.create_channel(Some(0)).expect("create_channel");
            loop {
                let chunk = channel.recv(4096);
                if chunk.is_empty() {
                    break;
                }
                channel.write(&chunk);
            }
            conn.close();
        });
    }
}
