//! examkit-core: exam session engine, timer, answers and scoring.
//!
//! This crate defines the question model, the per-question countdown, the
//! session state machine and the evaluator that the rest of examkit builds on.
//! It performs no terminal or network I/O of its own; question sources and
//! remote scorers are plugged in through the traits in [`traits`].

pub mod answers;
pub mod error;
pub mod model;
pub mod parser;
pub mod report;
pub mod scoring;
pub mod session;
pub mod timer;
pub mod traits;
