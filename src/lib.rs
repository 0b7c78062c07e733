#![forbid(unsafe_code)]

//! Resolves YouTube URLs into metadata and candidate download links by walking
//! a fixed chain of upstream sources, and exposes the result over HTTP.

pub mod config;
pub mod error;
pub mod identifier;
pub mod model;
pub mod orchestrator;
pub mod server;
pub mod sources;

#[cfg(test)]
mod test_support;
