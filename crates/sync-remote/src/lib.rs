pub mod auth;
pub mod client;
pub mod http;

pub use client::HttpSyncRunner;
