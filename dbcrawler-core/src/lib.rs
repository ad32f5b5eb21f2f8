//! Core engine for dbcrawler: database metadata crawl and merge.
//!
//! This crate resolves templated connection parameters into a live
//! connection, decides per metadata category and vendor how each part of
//! the schema is retrieved, filters what is kept with inclusion and grep
//! rules, and merges everything into one immutable [`Catalog`].
//!
//! # Security Guarantees
//! - Connections are opened read-only by default
//! - Passwords are zeroized after use and never logged
//! - The crawler reads metadata only, never table data
//!
//! # Architecture
//! - [`resolver`]: connection specs, credentials and driver selection
//! - [`template`]: `${var}` substitution shared by resolver and config
//! - [`registry`]: the fixed category table and lookup keys
//! - [`rules`]: inclusion and grep rules
//! - [`resources`]: layered SQL resources and the per-crawl retrieval plan
//! - [`crawl`]: the orchestrator and its single-writer merge
//! - [`adapters`]: sqlx-backed drivers behind feature flags

pub mod adapters;
pub mod config;
pub mod crawl;
pub mod error;
pub mod logging;
pub mod models;
pub mod options;
pub mod records;
pub mod registry;
pub mod resolver;
pub mod resources;
pub mod rules;
pub mod security;
pub mod template;

// Re-export commonly used types
pub use adapters::{Driver, DriverRegistry, MetadataConnection};
pub use config::{ConnectionConfig, PropertyBag, PropertyLayer};
pub use crawl::{CrawlControl, CrawlOutcome, CrawlState, Crawler};
pub use error::{ConnectionErrorKind, CrawlWarning, DbCrawlerError, Result};
pub use models::{
    Catalog, Column, ColumnKey, DatabaseInfo, ForeignKey, Routine, Schema, SchemaKey, Table,
    TableKey,
};
pub use options::CrawlOptions;
pub use registry::{MetadataCategory, MetadataSourceRegistry, SourceKind};
pub use resolver::{ConnectionSpec, ResolvedConnection, resolve};
pub use resources::{SqlResources, Vendor};
pub use rules::{GrepRule, InclusionRule};
pub use security::Credentials;
