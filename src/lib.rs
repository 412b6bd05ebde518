//! GE ORACLE: Grand Exchange profit ranker
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod gold;
pub mod prices;
pub mod strategy;
pub mod engine;
pub mod display;
