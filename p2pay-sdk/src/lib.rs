//! SDK for the p2pay crypto-to-fiat wallet backend.
//!
//! - [`objects`] – request and response schemas for every backend endpoint.
//! - [`wallet`] – deterministic wallet derivation from a user identifier.
//! - [`client`] – typed HTTP client (behind the `client` feature).

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![forbid(unsafe_code)]

#[cfg(feature = "client")]
pub mod client;
pub mod objects;
pub mod wallet;
