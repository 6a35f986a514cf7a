//! Postal-code lookup client.
//!
//! Codes are normalized and validated locally, looked up over HTTP, and each
//! response is recorded in an append-only history used for success statistics.

pub mod client;
pub mod code;
pub mod history;
pub mod payload;
pub mod status;

pub use client::{BatchEntry, LookupOutcome, PostalClient, PostalConfig};
pub use code::PostalCode;
pub use history::{SearchHistory, SearchRecord, SearchStats};
pub use payload::{validate_payload, Address, AddressPayload, PayloadReport};
pub use status::{classify, LookupStatus};
