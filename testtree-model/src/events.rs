// Copyright (c) The testtree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Run events delivered by the execution engine.
//!
//! Events arrive asynchronously on the engine's threads and must be
//! marshalled onto the UI thread before being applied; all consumers in this
//! workspace assume they run on a single thread.
//!
//! Ordering contract: for a given id, `TestStarted` (if emitted) precedes
//! exactly one `TestFinished`; a child's finished event precedes its
//! parent's `SuiteFinished`; completion order among sibling leaves is
//! unconstrained (tests may run in parallel); after a cancelled run some
//! leaves may never see a finished event at all.

use crate::results::TestResult;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// One event in the engine's result stream.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum RunEvent {
    /// A test run is starting.
    RunStarted {
        /// When the run started, with UTC offset.
        timestamp: DateTime<FixedOffset>,
        /// Number of tests selected to run.
        test_count: u32,
    },

    /// A leaf test began executing.
    TestStarted {
        /// Engine id of the test.
        id: SmolStr,
    },

    /// A suite began executing.
    SuiteStarted {
        /// Engine id of the suite.
        id: SmolStr,
    },

    /// A leaf test finished.
    TestFinished {
        /// The test's result.
        result: TestResult,
    },

    /// A suite finished; its children have all reported.
    SuiteFinished {
        /// The suite's result, with child results attached.
        result: TestResult,
    },

    /// The run finished.
    RunFinished {
        /// When the run finished, with UTC offset.
        timestamp: DateTime<FixedOffset>,
        /// The top-level result for the whole run.
        result: TestResult,
    },

    /// Captured output text was produced.
    Output {
        /// Engine id of the producing test, if attributable.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<SmolStr>,
        /// The output text.
        text: String,
    },
}
