//! Report assembly.
//!
//! Flattens composed analysis structures into caller-facing shapes. Nothing
//! here computes statistics; every number comes from
//! [`analysis`](crate::analysis).
//!
//! - [`response`] - the snake_case JSON response and chart points
//! - [`markdown`] - markdown tables for terminal and chat display

pub mod markdown;
pub mod response;

pub use markdown::{render_analysis, render_overview};
pub use response::{chart_points, AnalysisResponse, AnalysisType, ChartPoint};
