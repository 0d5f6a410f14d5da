//! Core synthesis logic from config file to written templates.

pub mod defaults;
pub mod digest;
pub mod envfile;
pub mod parser;
pub mod planner;
pub mod resolver;
pub mod rules;
pub mod selector;
pub mod state;
pub mod synth;
pub mod types;

#[cfg(test)]
pub(crate) mod fixtures;
