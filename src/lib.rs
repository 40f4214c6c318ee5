//! Locates event artifacts inside a CI job's storage-browser listing,
//! downloads them and bulk-uploads their records to an OpenSearch cluster.

pub mod bulk;
pub mod config;
pub mod download;
pub mod error;
pub mod links;
pub mod locator;
pub mod records;
pub mod resolver;
