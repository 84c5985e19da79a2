//! Op catalogue, linear chain typing, execution, recipes and persisted user pipelines.

pub mod catalogue;
pub mod draft;
pub mod library;
pub mod model;
pub mod recipe;
pub mod runner;
pub mod session;
pub mod typing;
pub mod user_store;
