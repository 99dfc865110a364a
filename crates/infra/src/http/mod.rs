//! HTTP transport shared by the meeting provider client.

mod client;

pub use client::{HttpClient, HttpClientBuilder};
