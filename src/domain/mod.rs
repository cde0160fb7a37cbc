//! Core domain: the evaluation engine and everything computed on it.

pub mod cell;
pub mod context;
pub mod effect;
pub mod engine;
pub mod error;
pub mod indicator;
pub mod nan_policy;
pub mod ohlcv;
pub mod panel;
pub mod rolling;
pub mod series;

#[cfg(test)]
pub(crate) mod testing;
