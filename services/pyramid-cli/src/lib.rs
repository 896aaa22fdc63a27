//! Library half of the `pyramid` command: request loading and output rendering.

pub mod output;
pub mod request;

pub use output::{render, OutputFormat, PyramidSummary};
pub use request::PyramidRequest;
