//! Integration tests for the acceptance-test harness
//!
//! These tests exercise whole workflows across module boundaries: loading
//! environments from workspace files, resolving templated requests, and
//! running chained test suites against a local mock server.

pub mod resolution_test;
pub mod suite_run_test;
