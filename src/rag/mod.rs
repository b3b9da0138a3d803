//! Report synthesis: turns retrieved chunks into a cited answer.
//!
//! Context sent to the model is bounded per chunk and in total, and the
//! model is never called when nothing was retrieved.

pub mod context;
mod response;

pub use context::{format_context, format_references, reference_label};
pub use response::{ReportSynthesizer, NO_INFORMATION_REPORT};
