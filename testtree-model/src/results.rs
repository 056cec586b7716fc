// Copyright (c) The testtree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test results and the per-session result store.
//!
//! A [`TestResult`] is created per finished-event and supersedes any earlier
//! result for the same id; results are never merged. Across a reload the
//! store can re-attach retained results to the new tree by full name, since
//! the engine reassigns ids.

use crate::errors::DurationParseError;
use crate::tree::TestTree;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::collections::HashMap;
use tracing::debug;

/// Final status of a finished test or suite.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum TestStatus {
    /// The test passed.
    Passed,
    /// The test failed.
    Failed,
    /// The test did not run.
    Skipped,
    /// The test passed with a warning.
    Warning,
    /// The test produced no conclusive outcome.
    Inconclusive,
}

/// Where in the test lifecycle a failure originated.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum FailureSite {
    /// The test body itself.
    #[default]
    Test,
    /// Setup code.
    SetUp,
    /// Teardown code.
    TearDown,
    /// A parent suite.
    Parent,
    /// A child of a suite result.
    Child,
}

/// Status, label and site triple describing how a test finished.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ResultState {
    /// The overall status.
    pub status: TestStatus,
    /// Refinement of the status, e.g. "Ignored", "Error", "Cancelled".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<SmolStr>,
    /// Where a failure originated.
    #[serde(default)]
    pub site: FailureSite,
}

impl ResultState {
    /// A plain result with no label.
    pub fn of(status: TestStatus) -> Self {
        Self {
            status,
            label: None,
            site: FailureSite::Test,
        }
    }

    /// A labeled result, e.g. `Skipped` + `"Ignored"`.
    pub fn labeled(status: TestStatus, label: &str) -> Self {
        Self {
            status,
            label: Some(label.into()),
            site: FailureSite::Test,
        }
    }

    /// True for `Skipped` results labeled `"Ignored"`.
    pub fn is_ignored(&self) -> bool {
        self.status == TestStatus::Skipped && self.label.as_deref() == Some("Ignored")
    }

    /// True for results labeled `"Explicit"`.
    pub fn is_explicit(&self) -> bool {
        self.label.as_deref() == Some("Explicit")
    }
}

/// The outcome of one finished test or suite.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TestResult {
    /// Engine id of the test this result belongs to.
    pub id: SmolStr,
    /// Full name of the test; the correlation key across reloads.
    pub full_name: SmolStr,
    /// How the test finished.
    pub outcome: ResultState,
    /// Wall-clock duration in seconds. Engine serializers emit this either
    /// as a number or as the attribute's original string form; both
    /// deserialize.
    #[serde(default, deserialize_with = "deserialize_duration")]
    pub duration: f64,
    /// Captured stdout/stderr, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Child results; only present for suite results.
    #[serde(default)]
    pub children: Vec<TestResult>,
    /// False once a newer run has started without clearing results.
    #[serde(default = "default_true")]
    pub is_latest_run: bool,
}

fn default_true() -> bool {
    true
}

impl TestResult {
    /// Creates a leaf result.
    pub fn new(id: &str, full_name: &str, outcome: ResultState, duration: f64) -> Self {
        Self {
            id: id.into(),
            full_name: full_name.into(),
            outcome,
            duration,
            output: None,
            children: Vec::new(),
            is_latest_run: true,
        }
    }

    /// Sets captured output, builder-style.
    pub fn with_output(mut self, output: &str) -> Self {
        self.output = Some(output.to_owned());
        self
    }

    /// Sets child results, builder-style.
    pub fn with_children(mut self, children: Vec<TestResult>) -> Self {
        self.children = children;
        self
    }
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Seconds(f64),
        Attribute(SmolStr),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Seconds(seconds) => Ok(seconds),
        Raw::Attribute(text) => parse_duration_secs(&text).map_err(serde::de::Error::custom),
    }
}

/// Parses an engine duration attribute (seconds) from its string form.
/// [`TestResult`] deserialization routes string-typed `duration` fields
/// through here.
///
/// Goes through [`f64::from_str`], which accepts only `.` as the decimal
/// separator regardless of host locale. Duration parsing must never take a
/// locale-sensitive path.
pub fn parse_duration_secs(input: &str) -> Result<f64, DurationParseError> {
    input
        .trim()
        .parse::<f64>()
        .map_err(|source| DurationParseError {
            input: input.to_owned(),
            source,
        })
}

/// Latest results for the current session, keyed by engine id.
#[derive(Clone, Debug, Default)]
pub struct ResultStore {
    by_id: HashMap<SmolStr, TestResult>,
}

impl ResultStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a result, replacing (never merging) any earlier result for
    /// the same id.
    pub fn insert(&mut self, result: TestResult) {
        self.by_id.insert(result.id.clone(), result);
    }

    /// The latest result for the given engine id, if any.
    pub fn result_for(&self, id: &str) -> Option<&TestResult> {
        self.by_id.get(id)
    }

    /// Appends captured output text to the result for `id`, if present.
    /// Output for unknown ids is dropped.
    pub fn append_output(&mut self, id: &str, text: &str) {
        match self.by_id.get_mut(id) {
            Some(result) => result.output.get_or_insert_with(String::new).push_str(text),
            None => debug!(id, "dropping output for unknown test id"),
        }
    }

    /// Number of stored results.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// True if no results are stored.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Discards all results.
    pub fn clear(&mut self) {
        self.by_id.clear();
    }

    /// Marks every stored result as belonging to an earlier run. Used when a
    /// new run starts while prior results are retained for display.
    pub fn mark_stale(&mut self) {
        for result in self.by_id.values_mut() {
            result.is_latest_run = false;
        }
    }

    /// Re-attaches retained results to a freshly loaded tree by full name.
    ///
    /// Engine ids are reassigned on reload, so each result is moved to the
    /// id of the node with the same full name; results whose full name no
    /// longer exists are dropped.
    pub fn rekey(&mut self, tree: &TestTree) {
        let old = std::mem::take(&mut self.by_id);
        for (_, mut result) in old {
            match tree.by_full_name(&result.full_name) {
                Some(node) => {
                    result.id = tree.node(node).id.clone();
                    self.by_id.insert(result.id.clone(), result);
                }
                None => {
                    debug!(
                        full_name = result.full_name.as_str(),
                        "dropping result with no matching node after reload"
                    );
                }
            }
        }
    }
}
