//! Admission validation pipeline
//!
//! The synchronous gate every workload mutation passes through before it
//! reaches the cluster. Checks run in a fixed order and the first
//! violation wins; a violation is a normal denial, not an error.

mod validator;

pub use validator::{Operation, PolicyValidator, Verdict};
