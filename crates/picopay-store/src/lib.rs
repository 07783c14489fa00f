//! Stores for picopay services.
//!
//! The store is the single source of synchronization in the system:
//! every decision-read plus write that must be atomic runs inside one
//! write-lock critical section with no await point, which makes it a
//! single linearizable step. Unrelated channels share the lock only
//! for the duration of those short sections; handlers never hold it
//! across I/O.
//!
//! - [`vendor::VendorStore`] keeps the vendor's channel cache and the
//!   latest accepted payment per channel, advanced through the
//!   monotonic compare-and-set [`vendor::VendorStore::save_payment`].
//! - [`issuer::IssuerStore`] keeps the authoritative ledger: accounts,
//!   channels and the open/settle transitions that move balances.

pub mod error;
pub mod issuer;
pub mod vendor;

pub use error::StoreError;
