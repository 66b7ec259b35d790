//! Core domain types and traits for the byplay job queue.
//!
//! This crate contains:
//! - The queue-name codec and [`QueueTag`]
//! - The persisted [`JobRow`]/[`JobState`]/[`Ack`] types
//! - The argument codec
//! - The [`Job`]/[`JobRegistry`] traits and an in-memory registry

pub mod args;
pub mod error;
pub mod job;
pub mod queue;
pub mod registry;

pub use args::{decode_args, encode_args};
pub use error::{Error, Result};
pub use job::{Ack, JobRow, JobState};
pub use queue::QueueTag;
pub use registry::{InMemoryRegistry, Job, JobContext, JobRegistry};
