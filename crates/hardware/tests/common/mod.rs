//! Shared test infrastructure.

/// Simulator harness and program builders.
pub mod harness;

/// Mock collaborators.
pub mod mocks;
