//! Relay server entry point
//!
//! ```sh
//! cargo run --features relay --bin rex-relay -- [port]
//! ```
//! The port comes from the first argument, then `RELAY_PORT`, then 3000.

use rex_runner::relay::{DEFAULT_PORT, start_relay_server};

fn port_from(arg: Option<String>, env: Option<String>) -> u16 {
    arg.or(env)
        .and_then(|p| match p.parse() {
            Ok(port) => Some(port),
            Err(_) => {
                log::warn!("Invalid port {:?}, using {}", p, DEFAULT_PORT);
                None
            }
        })
        .unwrap_or(DEFAULT_PORT)
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let port = port_from(std::env::args().nth(1), std::env::var("RELAY_PORT").ok());
    if let Err(e) = start_relay_server(port).await {
        log::error!("Relay server failed: {}", e);
        std::process::exit(1);
    }
}
