//! Knowledge retrieval and report generation.

pub mod knowledge;
pub mod report;
