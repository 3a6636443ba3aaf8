//! # chatmon-core
//!
//! Core library for chatmon - a chat-archive monitor.
//!
//! This library provides:
//! - Domain types for messages, uploads and analytics DTOs
//! - Database storage layer with SQLite
//! - Ingestion pipeline: archive parsing, deduplication, batched commit
//! - Analytics aggregations over the committed corpus
//! - Configuration management and logging infrastructure
//!
//! ## Architecture
//!
//! Uploaded archive bytes flow through the ingestion scheduler into the
//! store; the analytics engine computes per-request views over what is
//! committed:
//!
//! ```text
//! uploads ──► IngestScheduler ──► messages ──► Analytics ──► DTOs
//!             (parse, dedup,
//!              batched commit)
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use chatmon_core::{Analytics, Config, Database, IngestScheduler};
//!
//! let config = Config::load().expect("failed to load config");
//! let db = Arc::new(Database::open(&config.database_path()).expect("failed to open database"));
//! db.migrate().expect("failed to run migrations");
//!
//! db.insert_upload(1, "chat.txt", b"12/03/2021 14:22 - Ana: hello\n")
//!     .expect("failed to queue upload");
//!
//! let scheduler = IngestScheduler::new(db.clone());
//! let report = scheduler.process_pending().expect("ingestion failed");
//! println!("committed {} messages", report.messages_committed);
//!
//! let analytics = Analytics::new(&db);
//! let participants = analytics.participants(1).expect("query failed");
//! println!("{} participants", participants.len());
//! ```

// Re-export commonly used items at the crate root
pub use analytics::Analytics;
pub use config::Config;
pub use db::Database;
pub use error::{Error, Result};
pub use ingest::{IngestReport, IngestScheduler};
pub use types::*;

// Public modules
pub mod analytics;
pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod types;
