#![allow(dead_code, unused_imports)]

pub use jobgate_test_utils::builders;
pub use jobgate_test_utils::fake_executor;
pub use jobgate_test_utils::{dispatch_all, drain, init_tracing, spec, with_timeout};

use std::error::Error;

pub type TestResult = Result<(), Box<dyn Error>>;
