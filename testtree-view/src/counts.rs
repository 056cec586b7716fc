// Copyright (c) The testtree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Aggregate pass/fail counters over a subtree.

use std::ops::{Add, AddAssign};
use testtree_model::{NodeId, ResultStore, TestStatus, TestTree};

/// Outcome counters for the visible leaves of a subtree.
///
/// Each visible leaf contributes exactly one to exactly one outcome counter
/// and one to `test_count`; invisible leaves contribute nothing at all, so
/// `test_count` is the number of visible leaves, not the static count the
/// engine reported on the node.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ResultCounts {
    /// Tests that passed.
    pub passed: usize,
    /// Tests that failed.
    pub failed: usize,
    /// Tests that passed with a warning.
    pub warnings: usize,
    /// Tests with an inconclusive outcome.
    pub inconclusive: usize,
    /// Tests skipped with the "Ignored" label.
    pub ignored: usize,
    /// Tests skipped with the "Explicit" label.
    pub explicit: usize,
    /// Tests skipped for any other reason.
    pub skipped: usize,
    /// Tests with no result yet.
    pub not_run: usize,
    /// Total visible leaves counted.
    pub test_count: usize,
}

impl ResultCounts {
    /// Computes counts over the subtree rooted at `node`.
    pub fn compute(tree: &TestTree, results: &ResultStore, node: NodeId) -> ResultCounts {
        tree.fold(node, &mut |_, test_node, children: Vec<ResultCounts>| {
            if test_node.is_suite() {
                return children.into_iter().fold(ResultCounts::default(), Add::add);
            }
            let mut counts = ResultCounts::default();
            if !test_node.is_visible() {
                return counts;
            }
            counts.test_count = 1;
            match results.result_for(&test_node.id) {
                None => counts.not_run = 1,
                Some(result) if result.outcome.is_ignored() => counts.ignored = 1,
                Some(result) if result.outcome.is_explicit() => counts.explicit = 1,
                Some(result) => match result.outcome.status {
                    TestStatus::Passed => counts.passed = 1,
                    TestStatus::Failed => counts.failed = 1,
                    TestStatus::Warning => counts.warnings = 1,
                    TestStatus::Inconclusive => counts.inconclusive = 1,
                    TestStatus::Skipped => counts.skipped = 1,
                },
            }
            counts
        })
    }

    /// Number of leaves with any result at all.
    pub fn finished(&self) -> usize {
        self.test_count - self.not_run
    }
}

impl Add for ResultCounts {
    type Output = ResultCounts;

    fn add(mut self, rhs: ResultCounts) -> ResultCounts {
        self += rhs;
        self
    }
}

impl AddAssign for ResultCounts {
    fn add_assign(&mut self, rhs: ResultCounts) {
        self.passed += rhs.passed;
        self.failed += rhs.failed;
        self.warnings += rhs.warnings;
        self.inconclusive += rhs.inconclusive;
        self.ignored += rhs.ignored;
        self.explicit += rhs.explicit;
        self.skipped += rhs.skipped;
        self.not_run += rhs.not_run;
        self.test_count += rhs.test_count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use testtree_model::{ResultState, TestDescriptor, TestResult};

    fn fixture_tree() -> TestTree {
        TestTree::build(TestDescriptor::fixture(
            "0-1",
            "F",
            "Root.F",
            vec![
                TestDescriptor::case("0-2", "A", "Root.F.A"),
                TestDescriptor::case("0-3", "B", "Root.F.B"),
                TestDescriptor::case("0-4", "C", "Root.F.C"),
            ],
        ))
        .unwrap()
    }

    fn result(id: &str, outcome: ResultState) -> TestResult {
        TestResult::new(id, &format!("Root.F.{id}"), outcome, 0.1)
    }

    #[test]
    fn leaves_classify_into_exactly_one_counter() {
        let tree = fixture_tree();
        let mut results = ResultStore::new();
        results.insert(result("0-2", ResultState::of(TestStatus::Passed)));
        results.insert(result(
            "0-3",
            ResultState::labeled(TestStatus::Skipped, "Ignored"),
        ));

        let counts = ResultCounts::compute(&tree, &results, tree.root());
        assert_eq!(
            counts,
            ResultCounts {
                passed: 1,
                ignored: 1,
                not_run: 1,
                test_count: 3,
                ..ResultCounts::default()
            }
        );
        assert_eq!(counts.finished(), 2);
    }

    #[test]
    fn explicit_label_wins_over_status() {
        let tree = fixture_tree();
        let mut results = ResultStore::new();
        results.insert(result(
            "0-2",
            ResultState::labeled(TestStatus::Skipped, "Explicit"),
        ));

        let counts = ResultCounts::compute(&tree, &results, tree.root());
        assert_eq!(counts.explicit, 1);
        assert_eq!(counts.skipped, 0);
    }

    #[test]
    fn invisible_leaves_contribute_nothing() {
        let mut tree = fixture_tree();
        let mut results = ResultStore::new();
        results.insert(result("0-2", ResultState::of(TestStatus::Passed)));
        results.insert(result("0-3", ResultState::of(TestStatus::Failed)));

        let hidden = tree.by_id("0-3").unwrap();
        tree.set_visible(hidden, false);

        let counts = ResultCounts::compute(&tree, &results, tree.root());
        assert_eq!(counts.failed, 0);
        assert_eq!(counts.test_count, 2);

        // The hidden leaf alone reports all-zero counts.
        assert_eq!(
            ResultCounts::compute(&tree, &results, hidden),
            ResultCounts::default()
        );
    }

    #[test]
    fn containers_never_double_count() {
        let tree = TestTree::build(TestDescriptor::suite(
            "0-1",
            "root",
            "Root",
            vec![TestDescriptor::fixture(
                "0-2",
                "F",
                "Root.F",
                vec![TestDescriptor::case("0-3", "A", "Root.F.A")],
            )],
        ))
        .unwrap();
        let mut results = ResultStore::new();
        results.insert(TestResult::new(
            "0-3",
            "Root.F.A",
            ResultState::of(TestStatus::Passed),
            0.1,
        ));
        // Suite results exist but only leaves are counted.
        results.insert(TestResult::new(
            "0-2",
            "Root.F",
            ResultState::of(TestStatus::Passed),
            0.1,
        ));

        let counts = ResultCounts::compute(&tree, &results, tree.root());
        assert_eq!(counts.passed, 1);
        assert_eq!(counts.test_count, 1);
    }
}
