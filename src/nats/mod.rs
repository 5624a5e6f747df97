pub mod client;
pub mod messages;

pub use client::{state_subject, NatsClient};
pub use messages::StateEventMessage;
