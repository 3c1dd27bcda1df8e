//! Kalshi alpha scanner.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod llm;
pub mod platforms;
pub mod strategy;
pub mod types;
