//! Messaging adapters.

pub mod discord;
pub mod manager;
pub mod traits;

pub use manager::MessagingManager;
pub use traits::Messaging;
