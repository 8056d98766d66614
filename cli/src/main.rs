//! wolochaind - Wolochain node daemon and client

use wolochain_cli::{exit_code, run_from};

#[tokio::main]
async fn main() {
    if let Err(err) = run_from(std::env::args_os()).await {
        if let Some(clap_err) = err.downcast_ref::<clap::Error>() {
            clap_err.exit();
        }
        eprintln!("Error: {:#}", err);
        std::process::exit(exit_code(&err));
    }
}
