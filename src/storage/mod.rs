//! Key-value persistence and storage change notifications.

pub mod kv;
pub mod signals;
