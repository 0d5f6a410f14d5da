//! Resource composers: declare CloudFormation resources into a [`stack::Stack`].
//!
//! Each composer takes handles to the resources it builds on and returns a
//! handle to what it declared, so dependency order is fixed by the call graph:
//! bucket → distribution → pipeline → outputs.

pub mod bucket;
pub mod buildspec;
pub mod distribution;
pub mod outputs;
pub mod pipeline;
pub mod stack;
pub mod template;
