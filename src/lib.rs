// src/lib.rs
pub mod aggregate;
pub mod classify;
pub mod cli;
pub mod config;
pub mod decode;
pub mod enrich;
pub mod error;
pub mod fetch;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod reshape;
