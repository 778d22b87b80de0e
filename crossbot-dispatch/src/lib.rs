//! # crossbot-dispatch
//!
//! Per-destination outbound queue: serializes and paces every call to one
//! chat destination so the aggregate rate stays under the platform ceiling,
//! while an idle destination gets near-instant turnaround.

mod channel;

pub use channel::{adaptive_delay, Channel, SentCallback};
