// src/fetch/mod.rs

//! Pulling monthly CIHA archives from the DATASUS servers.

pub mod batch;
pub mod ftp;
pub mod http;
pub mod urls;

pub use batch::{BatchFetcher, FailedFetch, FetchReport, FetchStatus};
pub use urls::{archive_urls, dest_file_name};
