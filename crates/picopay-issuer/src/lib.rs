//! picopay issuer service.
//!
//! The issuer is the authoritative ledger. It registers accounts, locks
//! funds when a channel opens and reconciles exactly once at
//! settlement, re-verifying the vendor's best proof independently so a
//! buggy or compromised vendor can never overdraw a client.

pub mod channels;
pub mod error;
pub mod http;
pub mod registration;
pub mod types;

pub use channels::ChannelService;
pub use error::IssuerError;
pub use registration::RegistrationService;
