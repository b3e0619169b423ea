//! Acceptance tests for the tickwait timed wait.
//!
//! These tests exercise the public API end to end:
//! - Never reporting success for a short wait
//! - Remainder accuracy and convergence under retry
//! - Independent concurrent sleepers
//! - Configuration loading for host emulation
//!
//! Everything runs against simulated or host-emulated hardware; no
//! accelerator is required.

mod acceptance;
