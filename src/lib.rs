pub mod advisory;
pub mod broadcast;
pub mod config;
pub mod engine;
pub mod error;
pub mod escalation;
pub mod fetch;
pub mod model;
pub mod source;
pub mod state;
pub mod validate;
