//! Dials an echo server, sends one message on a single channel, and prints
//! whatever comes back.

use std::sync::Arc;

use clap::Parser;
use msock::{ConnectionOptions, NoopHandler};
use msock_net::Dialer;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
struct Args {
    /// tcp://host:port or unix://path to dial
    #[arg(long, default_value = "tcp://127.0.0.1:4500")]
    connect: String,

    /// message to echo
    #[arg(long, default_value = "hello from msock")]
    message: String,
}

fn main() {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args = Args::parse();
    let conn = Dialer::dial(&args.connect, ConnectionOptions::default(), Arc::new(NoopHandler))
        .expect("failed to dial");
    let channel = conn.create_channel(Some(0)).expect("create_channel");

    channel.write(args.message.as_bytes());
    channel.close();

    let reply = channel.read(args.message.len());
    println!("{}", String::from_utf8_lossy(&reply));

    conn.close();
}
