//! Mobile marquee relay: the player publishes now-playing text per tag,
//! phones poll it.

pub mod status;
pub mod store;

pub use status::PublishStatus;
pub use store::{MarqueeStore, PublishRequest};
