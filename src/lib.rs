//! `blast`: a load generator for TCP servers that maintain persistent
//! connections.
//!
//! The binary entry point lives in `main.rs`; everything here is usable as a
//! library by an embedder who wants its own `PayloadGenerator` or wants to
//! drive a `Blast` run from code instead of the CLI.

pub mod banner;
pub mod blast;
pub mod cli;
pub mod connection;
pub mod error;
pub mod events;
pub mod ids;
pub mod logging;
pub mod payload;
pub mod report;
pub mod response_reader;
pub mod worker;
pub mod worker_group;

pub use blast::{Blast, BlastStopHandle, ResponseGoal, ResponseOptions};
pub use error::{EngineError, ValidationError};
pub use payload::{ConstantPayloadGenerator, FilePayloadProvider, PayloadGenerator};
pub use worker_group::GroupOptions;
