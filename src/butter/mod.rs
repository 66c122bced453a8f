pub mod client;
pub mod entities;
pub mod error;
mod serde_helpers;
