//! tradesim — indicator strategy backtester.
//!
//! Hexagonal architecture: the pure engine in [`domain`], port traits in
//! [`ports`], file-backed implementations in [`adapters`], and a thin
//! command-line driver in [`cli`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
