//! External meeting provider client.
//!
//! Talks to a Zoom-style REST API: a client-credentials token endpoint
//! plus a per-host meetings resource. [`TokenCache`] owns the bearer
//! token lifecycle; [`MeetingApiClient`] implements the core
//! `MeetingProvider` port on top of it.

mod client;
mod token;
mod types;

pub use client::MeetingApiClient;
pub use token::TokenCache;
