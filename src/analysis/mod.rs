//! On-demand transcript analysis: LLM-backed when an API key is configured,
//! a local statistics summary otherwise.

pub mod requestor;
pub mod templates;

pub use requestor::{local_summary, AnalysisRequestor};
pub use templates::{template_by_id, AnalysisTemplate, DEFAULT_TEMPLATE_ID, TEMPLATES};
