//! Scenario-based tests for conveyor

mod helpers;

mod conditional_publish;
mod fail_fast;
mod timeouts;
