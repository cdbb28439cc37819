//! Library side of the `tot-solve` binary: config loading, the solve
//! pipeline, and the JSON run report.

pub mod config;
pub mod pipeline;
pub mod results;
