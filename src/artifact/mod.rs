//! Typed artifacts flowing between pipeline steps, their codecs and the last-artifact channel.

pub mod channel;
pub mod codec;
pub mod model;
