// src/job/mod.rs

//! Job records.
//!
//! - [`record`] holds the [`Job`] record, its arena key and the
//!   [`JobSpec`] submission request.
//! - [`priority`] defines the [`Priority`] ordinal.

pub mod priority;
pub mod record;

pub use priority::Priority;
pub use record::{Job, JobConfig, JobKey, JobSpec};
