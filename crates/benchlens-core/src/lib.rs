//! # BenchLens Core
//!
//! Platform-independent library for analyzing per-question LLM benchmark
//! results: grouping scores by benchmark metadata, comparing models across
//! benchmarks, and classifying relative standing.
//!
//! This crate holds the analysis pipeline and its storage seam, designed to be
//! reusable across different frontends (CLI, services).
//!
//! ## Modules
//!
//! - [`analysis`] - Aggregation, ranking, composition and the [`AnalysisEngine`](analysis::AnalysisEngine)
//! - [`query`] - Per-benchmark retrieval specifications (and their SQL form)
//! - [`request`] - Analysis requests and boundary validation
//! - [`report`] - Response schema, chart points and markdown tables
//! - [`storage`] - Score-source trait with in-memory and redb backends
//! - [`config`] - Benchmark registry and score-format constants
//! - [`error`] - Error types for analysis and storage
//! - [`types`] - Shared data types

pub mod analysis;
pub mod config;
pub mod error;
pub mod query;
pub mod report;
pub mod request;
pub mod storage;
pub mod types;
