//! barflow: incremental time-series indicator engine.
//!
//! Hexagonal architecture: the evaluation engine, rolling algorithms and
//! indicator library in [`domain`], collaborator traits in [`ports`],
//! concrete implementations in [`adapters`], command line in [`cli`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
