pub mod client;
pub mod types;

pub use client::CatalystClient;
pub use types::DeployRequest;
