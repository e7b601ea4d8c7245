//! HTTP client plumbing shared by the transports.

pub mod client;

pub use client::{HttpClient, HttpClientBuilder};
