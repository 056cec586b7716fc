// Copyright (c) The testtree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Grouping strategies: alternate flat views that partition the tree's
//! leaves into named buckets by outcome, duration or category.
//!
//! Bucket membership is rebuilt on every load and fixed for the duration of
//! a run; only each bucket's aggregate status image changes as results
//! stream in.

use indexmap::IndexMap;
use smol_str::SmolStr;
use testtree_model::{NodeId, ResultState, ResultStore, TestResult, TestStatus, TestTree};
use tracing::debug;

/// Status indicator attached to a tree node or group header.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum StatusImage {
    /// No indicator (the "-1" sentinel of the original UI).
    #[default]
    None,
    /// Not run yet.
    NotRun,
    /// Currently executing.
    Running,
    /// Skipped.
    Skipped,
    /// Inconclusive.
    Inconclusive,
    /// Passed.
    Success,
    /// Warning, including ignored tests.
    Warning,
    /// Failed.
    Failure,
}

impl StatusImage {
    /// The indicator for a single result.
    pub fn from_result(outcome: &ResultState) -> StatusImage {
        if outcome.is_ignored() {
            return StatusImage::Warning;
        }
        match outcome.status {
            TestStatus::Passed => StatusImage::Success,
            TestStatus::Failed => StatusImage::Failure,
            TestStatus::Warning => StatusImage::Warning,
            TestStatus::Inconclusive => StatusImage::Inconclusive,
            TestStatus::Skipped => StatusImage::Skipped,
        }
    }

    /// Folds member indicators into an aggregate one.
    ///
    /// Failure beats Warning beats Success; members that are only
    /// Inconclusive, Skipped or not run leave the aggregate at
    /// [`StatusImage::None`]. This precedence is load-bearing for group
    /// headers and suite nodes alike.
    pub fn aggregate(images: impl IntoIterator<Item = StatusImage>) -> StatusImage {
        let mut aggregate = StatusImage::None;
        for image in images {
            match image {
                StatusImage::Failure => return StatusImage::Failure,
                StatusImage::Warning => aggregate = StatusImage::Warning,
                StatusImage::Success if aggregate != StatusImage::Warning => {
                    aggregate = StatusImage::Success;
                }
                _ => {}
            }
        }
        aggregate
    }
}

/// A named bucket of test-node references under a grouping strategy.
#[derive(Clone, Debug)]
pub struct TestGroup {
    /// The bucket label, e.g. "Passed" or "Slow &gt; 1 sec".
    pub name: SmolStr,
    /// The bucket's aggregate status indicator.
    pub image: StatusImage,
    members: Vec<NodeId>,
}

impl TestGroup {
    fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            image: StatusImage::None,
            members: Vec::new(),
        }
    }

    /// Member nodes, in load order. Non-owning references into the tree.
    pub fn members(&self) -> &[NodeId] {
        &self.members
    }

    fn recompute_image(&mut self, tree: &TestTree, results: &ResultStore) {
        self.image = StatusImage::aggregate(self.members.iter().filter_map(|&member| {
            results
                .result_for(&tree.node(member).id)
                .map(|result| StatusImage::from_result(&result.outcome))
        }));
    }
}

/// A strategy partitioning the tree's leaves into [`TestGroup`]s.
pub trait Grouping {
    /// Clears and rebuilds all buckets from the loaded tree.
    fn load(&mut self, tree: &TestTree, results: &ResultStore);

    /// Recomputes the status of the group(s) containing the finished leaf.
    /// Membership never changes mid-run. Returns the names of the groups
    /// whose image was recomputed.
    fn on_test_finished(
        &mut self,
        tree: &TestTree,
        results: &ResultStore,
        result: &TestResult,
    ) -> Vec<SmolStr>;

    /// Recomputes every group's aggregate status from current member
    /// outcomes.
    fn on_run_finished(&mut self, tree: &TestTree, results: &ResultStore);

    /// The current buckets, in display order.
    fn groups(&self) -> &IndexMap<SmolStr, TestGroup>;
}

/// Shared bucket bookkeeping for the concrete strategies.
#[derive(Clone, Debug, Default)]
struct GroupSet {
    groups: IndexMap<SmolStr, TestGroup>,
}

impl GroupSet {
    fn reset(&mut self, buckets: &[&str]) {
        self.groups.clear();
        for name in buckets {
            self.groups.insert((*name).into(), TestGroup::new(name));
        }
    }

    fn add_member(&mut self, bucket: &str, member: NodeId) {
        self.groups
            .entry(bucket.into())
            .or_insert_with(|| TestGroup::new(bucket))
            .members
            .push(member);
    }

    fn recompute_all(&mut self, tree: &TestTree, results: &ResultStore) {
        for group in self.groups.values_mut() {
            group.recompute_image(tree, results);
        }
    }

    fn recompute_containing(
        &mut self,
        tree: &TestTree,
        results: &ResultStore,
        member: NodeId,
    ) -> Vec<SmolStr> {
        let mut changed = Vec::new();
        for group in self.groups.values_mut() {
            if group.members.contains(&member) {
                group.recompute_image(tree, results);
                changed.push(group.name.clone());
            }
        }
        changed
    }

    fn member_for_result(tree: &TestTree, result: &TestResult) -> Option<NodeId> {
        let member = tree.by_id(&result.id);
        if member.is_none() {
            debug!(id = result.id.as_str(), "result for id not in current tree");
        }
        member
    }
}

/// Groups leaves by the status of their latest result.
#[derive(Clone, Debug, Default)]
pub struct OutcomeGrouping {
    set: GroupSet,
}

const OUTCOME_BUCKETS: &[&str] = &[
    "Passed",
    "Failed",
    "Skipped",
    "Ignored",
    "Inconclusive",
    "Not Run",
];

fn outcome_bucket(result: Option<&TestResult>) -> &'static str {
    match result {
        None => "Not Run",
        // The "Ignored" label overrides the Skipped status.
        Some(result) if result.outcome.is_ignored() => "Ignored",
        Some(result) => match result.outcome.status {
            TestStatus::Passed => "Passed",
            TestStatus::Failed => "Failed",
            TestStatus::Skipped => "Skipped",
            // The bucket set has no Warning entry; warnings share the
            // ignored indicator, so they land in the same bucket.
            TestStatus::Warning => "Ignored",
            TestStatus::Inconclusive => "Inconclusive",
        },
    }
}

impl OutcomeGrouping {
    /// Creates the strategy with empty buckets.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Grouping for OutcomeGrouping {
    fn load(&mut self, tree: &TestTree, results: &ResultStore) {
        self.set.reset(OUTCOME_BUCKETS);
        for leaf in tree.leaves(tree.root()) {
            let bucket = outcome_bucket(results.result_for(&tree.node(leaf).id));
            self.set.add_member(bucket, leaf);
        }
        self.set.recompute_all(tree, results);
    }

    fn on_test_finished(
        &mut self,
        tree: &TestTree,
        results: &ResultStore,
        result: &TestResult,
    ) -> Vec<SmolStr> {
        match GroupSet::member_for_result(tree, result) {
            Some(member) => self.set.recompute_containing(tree, results, member),
            None => Vec::new(),
        }
    }

    fn on_run_finished(&mut self, tree: &TestTree, results: &ResultStore) {
        self.set.recompute_all(tree, results);
    }

    fn groups(&self) -> &IndexMap<SmolStr, TestGroup> {
        &self.set.groups
    }
}

/// Groups leaves by the duration of their latest result.
#[derive(Clone, Debug, Default)]
pub struct DurationGrouping {
    set: GroupSet,
}

const SLOW: &str = "Slow > 1 sec";
const MEDIUM: &str = "Medium > 100 ms";
const FAST: &str = "Fast < 100 ms";
const NOT_RUN: &str = "Not Run";

const DURATION_BUCKETS: &[&str] = &[SLOW, MEDIUM, FAST, NOT_RUN];

/// Half-open intervals, lower bound inclusive: exactly 1.0 is Slow,
/// exactly 0.1 is Medium.
fn duration_bucket(result: Option<&TestResult>) -> &'static str {
    match result {
        None => NOT_RUN,
        Some(result) if result.duration >= 1.0 => SLOW,
        Some(result) if result.duration >= 0.1 => MEDIUM,
        Some(_) => FAST,
    }
}

impl DurationGrouping {
    /// Creates the strategy with empty buckets.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Grouping for DurationGrouping {
    fn load(&mut self, tree: &TestTree, results: &ResultStore) {
        self.set.reset(DURATION_BUCKETS);
        for leaf in tree.leaves(tree.root()) {
            let bucket = duration_bucket(results.result_for(&tree.node(leaf).id));
            self.set.add_member(bucket, leaf);
        }
        self.set.recompute_all(tree, results);
    }

    fn on_test_finished(
        &mut self,
        tree: &TestTree,
        results: &ResultStore,
        result: &TestResult,
    ) -> Vec<SmolStr> {
        match GroupSet::member_for_result(tree, result) {
            Some(member) => self.set.recompute_containing(tree, results, member),
            None => Vec::new(),
        }
    }

    fn on_run_finished(&mut self, tree: &TestTree, results: &ResultStore) {
        self.set.recompute_all(tree, results);
    }

    fn groups(&self) -> &IndexMap<SmolStr, TestGroup> {
        &self.set.groups
    }
}

/// Groups leaves by category, including categories inherited from
/// ancestors; leaves with no category anywhere in their ancestry go to the
/// "None" bucket.
#[derive(Clone, Debug, Default)]
pub struct CategoryGrouping {
    set: GroupSet,
}

impl CategoryGrouping {
    /// Creates the strategy with empty buckets.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Grouping for CategoryGrouping {
    fn load(&mut self, tree: &TestTree, results: &ResultStore) {
        self.set.reset(&[]);
        for leaf in tree.leaves(tree.root()) {
            if tree.has_no_category(leaf) {
                self.set.add_member("None", leaf);
                continue;
            }
            // A leaf with several categories belongs to every one of them.
            let mut seen: Vec<&SmolStr> = Vec::new();
            for category in tree.inherited_categories(leaf) {
                if !seen.contains(&category) {
                    seen.push(category);
                }
            }
            for category in seen {
                self.set.add_member(category.as_str(), leaf);
            }
        }
        self.set.recompute_all(tree, results);
    }

    fn on_test_finished(
        &mut self,
        tree: &TestTree,
        results: &ResultStore,
        result: &TestResult,
    ) -> Vec<SmolStr> {
        match GroupSet::member_for_result(tree, result) {
            Some(member) => self.set.recompute_containing(tree, results, member),
            None => Vec::new(),
        }
    }

    fn on_run_finished(&mut self, tree: &TestTree, results: &ResultStore) {
        self.set.recompute_all(tree, results);
    }

    fn groups(&self) -> &IndexMap<SmolStr, TestGroup> {
        &self.set.groups
    }
}
