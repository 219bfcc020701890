//! pytutor-core: Grading engine, progress store, and leveling.
//!
//! This crate defines the challenge catalog model, the behavioural scoring
//! rules, the durable progress record, and the grader that ties a code
//! evaluator to the progress store.

pub mod achievements;
pub mod config;
pub mod error;
pub mod grader;
pub mod leveling;
pub mod mock;
pub mod model;
pub mod parser;
pub mod progress;
pub mod quiz;
pub mod results;
pub mod scoring;
pub mod traits;
pub mod value;
pub mod verify;
