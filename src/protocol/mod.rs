//! Envelope format, typed payloads and version handling.

pub mod message;
pub mod negotiation;
pub mod payload;

pub use message::{Message, Payload};
