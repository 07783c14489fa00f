//! picopay vendor binary.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use picopay_core::KeyPair;
use picopay_store::vendor::VendorStore;
use picopay_vendor::http::{self, AppState};
use picopay_vendor::{HttpIssuerApi, IssuerApi, PaymentService, SettlementService};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "picopay-vendor")]
#[command(about = "picopay vendor - off-chain payment acceptance and settlement")]
struct Cli {
    /// Listen address
    #[arg(long, default_value = "0.0.0.0:8082")]
    listen: SocketAddr,

    /// Base URL of the issuer service
    #[arg(long, default_value = "http://127.0.0.1:8081")]
    issuer_url: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("picopay_vendor=info".parse()?))
        .init();

    let cli = Cli::parse();

    let keys = KeyPair::generate();
    tracing::info!(public_key = keys.public_key_der_b64(), "vendor key generated");

    let store = Arc::new(VendorStore::new());
    let issuer: Arc<dyn IssuerApi> = Arc::new(HttpIssuerApi::new(&cli.issuer_url));

    let state = AppState {
        payments: Arc::new(PaymentService::new(Arc::clone(&store), Arc::clone(&issuer))),
        settlement: Arc::new(SettlementService::new(store, issuer)),
        public_key_der_b64: keys.public_key_der_b64().to_string(),
    };

    let listener = tokio::net::TcpListener::bind(cli.listen).await?;
    tracing::info!(listen = %cli.listen, issuer = %cli.issuer_url, "vendor listening");
    axum::serve(listener, http::router(state)).await?;
    Ok(())
}
