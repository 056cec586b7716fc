// Copyright (c) The testtree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The outbound run filter: an "or" of engine-id terms built from the
//! currently visible nodes, handed verbatim to the execution engine so a
//! run covers exactly what is displayed.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use testtree_model::{NodeId, RunState, TestTree};

/// A single id term in a [`RunFilter`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct IdTerm {
    /// The engine id to select.
    pub id: SmolStr,
}

/// A serializable "or of ids" filter expression.
///
/// Serializes as `{"or": [{"id": "..."}, ...]}`; an empty selection yields
/// an empty "or", which the engine treats as selecting nothing.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct RunFilter {
    /// The id terms, most specific first.
    pub or: Vec<IdTerm>,
}

impl RunFilter {
    /// Builds the filter covering every visible node under the tree root.
    pub fn visible_ids(tree: &TestTree) -> RunFilter {
        Self::from_nodes(tree, [tree.root()])
    }

    /// Builds the filter covering every visible node under the given roots.
    ///
    /// Prefers the most specific ids: a container's own id is emitted only
    /// when its whole subtree is selectable as a unit, i.e. every
    /// descendant is visible and none is explicit-run-state. Explicit
    /// nodes are never pulled in by an ancestor's container id; they are
    /// emitted individually when directly visible.
    pub fn from_nodes(tree: &TestTree, roots: impl IntoIterator<Item = NodeId>) -> RunFilter {
        let mut filter = RunFilter::default();
        for root in roots {
            filter.add_visible(tree, root);
        }
        filter
    }

    fn add_visible(&mut self, tree: &TestTree, id: NodeId) {
        let node = tree.node(id);
        if !node.is_visible() {
            return;
        }
        if node.is_leaf() || Self::uniformly_selectable(tree, id) {
            self.or.push(IdTerm {
                id: node.id.clone(),
            });
            return;
        }
        for &child in node.children() {
            self.add_visible(tree, child);
        }
    }

    /// True when emitting this container's id selects exactly its visible
    /// contents: all descendants visible, none explicit.
    fn uniformly_selectable(tree: &TestTree, id: NodeId) -> bool {
        tree.descendants(id).all(|descendant| {
            let node = tree.node(descendant);
            node.is_visible() && node.run_state != RunState::Explicit
        })
    }

    /// True if the filter selects no tests.
    pub fn is_empty(&self) -> bool {
        self.or.is_empty()
    }

    /// The selected ids, in emission order.
    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.or.iter().map(|term| term.id.as_str())
    }

    /// Applies the filter back to a tree: the leaves a run with this filter
    /// would execute. A leaf is selected by its own id term, or by an
    /// ancestor's term when the leaf is not explicit-run-state.
    pub fn selected_leaves<'a>(&'a self, tree: &'a TestTree) -> impl Iterator<Item = NodeId> + 'a {
        tree.leaves(tree.root()).filter(move |&leaf| {
            let node = tree.node(leaf);
            if self.ids().any(|id| id == node.id.as_str()) {
                return true;
            }
            node.run_state != RunState::Explicit
                && tree
                    .ancestors(leaf)
                    .any(|ancestor| self.ids().any(|id| id == tree.node(ancestor).id.as_str()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use testtree_model::TestDescriptor;

    fn sample_tree() -> TestTree {
        TestTree::build(TestDescriptor::suite(
            "0-1",
            "root",
            "Root",
            vec![
                TestDescriptor::fixture(
                    "0-2",
                    "A",
                    "Root.A",
                    vec![
                        TestDescriptor::case("0-3", "One", "Root.A.One"),
                        TestDescriptor::case("0-4", "Two", "Root.A.Two"),
                    ],
                ),
                TestDescriptor::fixture(
                    "0-5",
                    "B",
                    "Root.B",
                    vec![
                        TestDescriptor::case("0-6", "Three", "Root.B.Three"),
                        TestDescriptor::case("0-7", "Manual", "Root.B.Manual")
                            .with_run_state(RunState::Explicit),
                    ],
                ),
            ],
        ))
        .unwrap()
    }

    fn hide(tree: &mut TestTree, engine_id: &str) {
        let id = tree.by_id(engine_id).unwrap();
        tree.set_visible(id, false);
    }

    #[test]
    fn fully_visible_tree_collapses_to_a_single_term_without_explicit_nodes() {
        let tree = TestTree::build(TestDescriptor::fixture(
            "0-2",
            "A",
            "Root.A",
            vec![
                TestDescriptor::case("0-3", "One", "Root.A.One"),
                TestDescriptor::case("0-4", "Two", "Root.A.Two"),
            ],
        ))
        .unwrap();
        let filter = RunFilter::visible_ids(&tree);
        assert_eq!(filter.ids().collect::<Vec<_>>(), ["0-2"]);
    }

    #[test]
    fn explicit_descendants_force_individual_ids() {
        let tree = sample_tree();
        let filter = RunFilter::visible_ids(&tree);
        // Root and Root.B can't be emitted as units because of the
        // explicit node; Root.A can.
        assert_eq!(
            filter.ids().collect::<Vec<_>>(),
            ["0-2", "0-6", "0-7"]
        );
    }

    #[test]
    fn invisible_subtrees_are_skipped() {
        let mut tree = sample_tree();
        hide(&mut tree, "0-4");
        hide(&mut tree, "0-7");
        let filter = RunFilter::visible_ids(&tree);
        assert_eq!(filter.ids().collect::<Vec<_>>(), ["0-3", "0-6"]);
    }

    #[test]
    fn round_trip_selects_exactly_the_visible_non_explicit_leaves() {
        let mut tree = sample_tree();
        hide(&mut tree, "0-4");
        hide(&mut tree, "0-7");
        let filter = RunFilter::visible_ids(&tree);
        let selected: Vec<_> = filter
            .selected_leaves(&tree)
            .map(|id| tree.node(id).full_name.as_str())
            .collect();
        assert_eq!(selected, ["Root.A.One", "Root.B.Three"]);
    }

    #[test]
    fn visible_explicit_leaf_is_emitted_individually_and_selected() {
        let tree = sample_tree();
        let filter = RunFilter::visible_ids(&tree);
        let selected: Vec<_> = filter
            .selected_leaves(&tree)
            .map(|id| tree.node(id).id.as_str())
            .collect();
        assert_eq!(selected, ["0-3", "0-4", "0-6", "0-7"]);
    }

    #[test]
    fn empty_selection_yields_an_empty_or() {
        let mut tree = sample_tree();
        for engine_id in ["0-1", "0-2", "0-3", "0-4", "0-5", "0-6", "0-7"] {
            hide(&mut tree, engine_id);
        }
        let filter = RunFilter::visible_ids(&tree);
        assert!(filter.is_empty());
        assert_eq!(serde_json::to_string(&filter).unwrap(), r#"{"or":[]}"#);
    }

    #[test]
    fn serializes_as_an_or_of_id_terms() {
        let tree = sample_tree();
        let filter = RunFilter::visible_ids(&tree);
        let json = serde_json::to_value(&filter).unwrap();
        assert_eq!(json["or"][0], serde_json::json!({ "id": "0-2" }));
    }
}
