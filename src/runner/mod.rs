//! Tool process execution.

pub mod pipeline;
pub mod process;

pub use pipeline::{Capture, CapturedStdout};
pub use process::{Invocation, ProcessOutput, ProcessRunner};
