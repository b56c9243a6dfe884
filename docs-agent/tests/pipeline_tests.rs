//! Integration tests for the documentation pipeline
//!
//! - Task coordinator batching, ordering and failure isolation
//! - Local analysis and the dependency graph over analyzed records
//! - Handoff store round trips
//! - End-to-end runs: offline, halted, and degraded

mod pipeline {
    mod common;
    mod test_coordinator;
    mod test_local_analyzer;
    mod test_graph;
    mod test_handoff;
    mod test_workflow;
}
