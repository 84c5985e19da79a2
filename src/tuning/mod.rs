//! Tuning component tree, persisted overrides, engine resolution and presets.

pub mod model;
pub mod presets;
pub mod registry;
pub mod resolve;
pub mod store;
