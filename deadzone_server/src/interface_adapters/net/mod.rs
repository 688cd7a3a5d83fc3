// Network adapter: per-socket client loops and the shared outbound serializer.

pub mod client;
pub mod serializer;

pub use client::ws_handler;
pub use serializer::outbound_serializer;
