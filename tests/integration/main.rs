//! Integration tests for Course-Mirror
//!
//! These tests run the binary's pieces end to end against wiremock servers.

mod mirror_tests;
