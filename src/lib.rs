//! ibot - streaming chat client for a knowledge-base RAG backend
//!
//! This library exposes modules for use in integration tests.

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod session;
pub mod sse;
