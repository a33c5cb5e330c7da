//! Test module organization for bandwidth parsing
//!
//! Fixture-driven tests replaying captured bandwidth-test output through the
//! aggregator.

pub mod human_layout_tests;
pub mod machine_layout_tests;
