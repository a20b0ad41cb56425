pub mod client;
pub mod event;
pub mod types;

pub use client::GitHubClient;
