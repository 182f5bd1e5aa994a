//! axpilot CLI library.
//!
//! The agent core lives in the workspace crates; this package wires it into
//! a command-line front-end and an offline demo environment.

pub mod cli;
pub mod demo;
