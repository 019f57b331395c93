#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::panic))]
#![forbid(unsafe_code)]

pub mod auth;
pub mod dashboard;
pub mod events;
pub mod flow;
pub mod framework;
pub mod scanner;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;
