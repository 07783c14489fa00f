//! picopay issuer binary.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use picopay_core::KeyPair;
use picopay_issuer::http::{self, AppState};
use picopay_issuer::{ChannelService, RegistrationService};
use picopay_store::issuer::IssuerStore;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "picopay-issuer")]
#[command(about = "picopay issuer - account ledger and channel settlement")]
struct Cli {
    /// Listen address
    #[arg(long, default_value = "0.0.0.0:8081")]
    listen: SocketAddr,

    /// Balance granted to an account on first registration
    #[arg(long, default_value_t = 1_000_000)]
    initial_balance: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("picopay_issuer=info".parse()?))
        .init();

    let cli = Cli::parse();

    let store = Arc::new(IssuerStore::new());
    let keys = Arc::new(KeyPair::generate());
    tracing::info!(public_key = keys.public_key_der_b64(), "issuer key generated");

    let state = AppState {
        registration: Arc::new(RegistrationService::new(
            Arc::clone(&store),
            Arc::clone(&keys),
            cli.initial_balance,
        )),
        channels: Arc::new(ChannelService::new(store)),
    };

    let listener = tokio::net::TcpListener::bind(cli.listen).await?;
    tracing::info!(listen = %cli.listen, "issuer listening");
    axum::serve(listener, http::router(state)).await?;
    Ok(())
}
