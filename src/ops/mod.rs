//! Engine-aware op dispatch and the shipped implementation table.

pub mod dispatch;
pub mod impls;
