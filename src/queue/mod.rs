// src/queue/mod.rs

//! Priority queue core: the set of `Ready` jobs in dispatch order.

pub mod ready;

pub use ready::{QueueEntry, ReadyQueue};
