//! Regression analysis harness for materials data.
//!
//! ```text
//!  train / test tables ──▶ loader ──▶ x/y selection ──▶ row selection
//!                                                          │
//!          exporters ◀── statistics ◀── predict ◀── fit ◀──┘
//! ```
//!
//! [`Analysis`] runs the whole sequence once per configuration; the stages
//! it uses can be swapped through [`Stages`].

pub mod analysis;
pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod model;
pub mod stats;

pub use analysis::{Analysis, AnalysisReport, SkippedStep, Stages};
pub use config::{AnalysisConfig, RunFile};
pub use error::{AnalysisError, Result};
