pub mod evaluation;
pub mod metrics;
pub mod scoring;
