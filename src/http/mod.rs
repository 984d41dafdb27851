//! HTTP client module with transient-failure polling.

mod client;
mod poll;

pub use client::{HttpClient, read_body, shared_client};
pub use poll::{PollSettings, poll_until_available};
