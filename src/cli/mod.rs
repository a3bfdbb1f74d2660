//! Command Line Interface (CLI) layer for lakepro.
//!
//! This module defines argument parsing (`args`), error types (`errors`),
//! and the orchestration logic (`runner`) for single-image, candidate
//! selection and batch flows. It wires user-provided options to the
//! library functionality exposed via `lakepro::api`.
//!
//! If you are embedding lakepro into another application, prefer using
//! the high-level `lakepro::api` module instead of calling the CLI code.
pub mod args;
pub mod errors;
pub mod runner;

pub use args::CliArgs;
pub use runner::run;
