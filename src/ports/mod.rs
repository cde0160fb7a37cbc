//! Port traits for the collaborators around the engine.

pub mod data_port;
pub mod param_port;
pub mod report_port;
