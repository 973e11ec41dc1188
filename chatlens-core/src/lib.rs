//! # chatlens-core
//!
//! Core library for chatlens - per-participant statistics over a chat export.
//!
//! This library provides:
//! - Domain types for messages, conversations and metrics
//! - An archive reader for extracted Messenger-style exports
//! - Feature extraction, date alignment and derived metrics
//! - SVG chart rendering
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Architecture
//!
//! Data flows through four pure stages and one rendering step:
//! - **Ingest:** numbered batch files → [`Conversation`]
//! - **Features:** conversations → sparse per-participant, per-day [`features::Accumulation`]
//! - **Table:** accumulation → dense, zero-filled [`table::AlignedTable`]
//! - **Derive:** cumulative differences, running averages, word shares, rankings
//! - **Render:** finished values → one SVG per metric
//!
//! ## Example
//!
//! ```rust,no_run
//! use chatlens_core::{ChartRenderer, Config, ExportDirectory, Pipeline};
//!
//! let config = Config::load().expect("failed to load config");
//! let archive = config.archive_root().expect("archive_dir not set").to_path_buf();
//! let source = ExportDirectory::new(&archive, &config.inbox_prefix);
//!
//! let pipeline = Pipeline::new(config, source);
//! let analysis = pipeline.analyze("Anonymous", None).expect("analysis failed");
//!
//! let renderer = ChartRenderer::new("Output/Anonymous", "Analysis of Anonymous");
//! renderer.render(&analysis).expect("render failed");
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use error::{Error, Result};
pub use ingest::{ArchiveSource, ExportDirectory};
pub use pipeline::{Analysis, MetricOutput, MetricValue, Pipeline};
pub use render::ChartRenderer;
pub use types::*;

// Public modules
pub mod config;
pub mod derive;
pub mod error;
pub mod features;
pub mod format;
pub mod ingest;
pub mod logging;
pub mod pipeline;
pub mod render;
pub mod table;
pub mod types;
