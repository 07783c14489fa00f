//! picopay vendor service.
//!
//! The vendor accepts off-chain payments against channels it has
//! verified with the issuer, enforces each scheme's proof rules and
//! monotonic progress, and submits the best proof to the issuer at
//! settlement. Its channel cache is advisory; the issuer stays
//! authoritative.

pub mod error;
pub mod http;
pub mod issuer_api;
pub mod payments;
pub mod settlement;
pub mod types;

#[cfg(test)]
mod testutil;

pub use error::VendorError;
pub use issuer_api::{HttpIssuerApi, IssuerApi};
pub use payments::PaymentService;
pub use settlement::SettlementService;
