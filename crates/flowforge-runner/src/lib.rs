// ABOUTME: Runner layer for flowforge, executing a compiled workflow program and collecting its result.
// ABOUTME: Defines the WorkflowRunner trait, the subprocess implementation, and a stub for tests.

pub mod runtime;
pub mod subprocess;
pub mod testing;

pub use runtime::{RESULT_FIELD, RunError, WorkflowRunner, parse_output};
pub use subprocess::{PYTHON_DRIVER, SubprocessRunner};
