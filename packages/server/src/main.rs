#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Disaster watch API server binary.
//!
//! ```text
//! disaster_watch_server [--port 5000] [--gdacs-config config/gdacs.toml]
//! ```
//!
//! Every flag also reads an environment variable (`BIND_ADDR`, `PORT`, ...);
//! see `--help`.

use clap::Parser as _;
use disaster_watch_server::ServerArgs;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    disaster_watch_server::run_server(ServerArgs::parse()).await
}
