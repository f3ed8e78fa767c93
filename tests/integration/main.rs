//! Integration tests

mod engine_tests;
