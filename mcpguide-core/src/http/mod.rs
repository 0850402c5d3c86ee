pub mod client;
pub mod fetch;

pub use client::HttpClient;
pub use fetch::{FetchOutcome, FetchResponse, RemoteFetch};
