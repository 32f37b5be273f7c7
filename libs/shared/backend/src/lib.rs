pub mod client;

pub use client::{AuthPolicy, BackendClient};
