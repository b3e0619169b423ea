//! Integration tests for tickwait acceptance testing.

mod common;
mod concurrency_test;
mod config_test;
mod ffi_test;
mod properties_test;
mod retry_test;
