// Copyright (c) The testtree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The loaded test tree.
//!
//! Nodes live in a single arena owned by [`TestTree`] and are addressed by
//! [`NodeId`] indices. The `id -> NodeId` and `full name -> NodeId` maps are
//! derived while the arena is built, so they can never go stale relative to
//! the tree. A fresh load or reload always produces a fresh `TestTree`.

use crate::errors::TreeBuildError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::collections::HashMap;

/// The property key under which the engine reports category values.
pub const CATEGORY_KEY: &str = "Category";

/// Index of a node within a [`TestTree`] arena.
///
/// Stable for the lifetime of one loaded tree; never reused across loads.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// Returns the raw arena index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The kind of node in the test hierarchy.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// A single runnable test.
    TestCase,
    /// A fixture containing test cases.
    TestFixture,
    /// An intermediate suite (namespace, parameterized group, ...).
    TestSuite,
    /// A loaded test assembly.
    Assembly,
    /// The synthetic root covering the whole run.
    TestRun,
}

impl NodeKind {
    /// True for every kind that contains other nodes.
    pub fn is_suite(self) -> bool {
        !matches!(self, NodeKind::TestCase)
    }
}

/// How a test may be run, as reported by the engine at exploration time.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum RunState {
    /// Runs normally.
    Runnable,
    /// Only runs when directly selected, never via an ancestor.
    Explicit,
    /// Marked ignored in the source.
    Ignored,
    /// Cannot be run (e.g. wrong signature).
    NotRunnable,
    /// Skipped for other reasons.
    Skipped,
}

/// One node of the engine's exploration result, as received over the engine
/// boundary. Consumed by [`TestTree::build`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TestDescriptor {
    /// Engine-assigned id. Stable within a session, reassigned on reload.
    pub id: SmolStr,
    /// Short display name.
    pub name: SmolStr,
    /// Fully qualified name; the correlation key across reloads.
    pub full_name: SmolStr,
    /// Node kind.
    pub kind: NodeKind,
    /// Run state.
    #[serde(default = "default_run_state")]
    pub run_state: RunState,
    /// Static leaf count under this node, as reported by the engine.
    #[serde(default)]
    pub test_count: u32,
    /// Named properties (key -> values); categories live under
    /// [`CATEGORY_KEY`].
    #[serde(default)]
    pub properties: IndexMap<SmolStr, Vec<SmolStr>>,
    /// Child descriptors, in engine order.
    #[serde(default)]
    pub children: Vec<TestDescriptor>,
}

fn default_run_state() -> RunState {
    RunState::Runnable
}

impl TestDescriptor {
    /// Creates a leaf test-case descriptor.
    pub fn case(id: &str, name: &str, full_name: &str) -> Self {
        Self::new(id, name, full_name, NodeKind::TestCase, Vec::new())
    }

    /// Creates a fixture descriptor with the given children.
    pub fn fixture(id: &str, name: &str, full_name: &str, children: Vec<TestDescriptor>) -> Self {
        Self::new(id, name, full_name, NodeKind::TestFixture, children)
    }

    /// Creates a suite descriptor with the given children.
    pub fn suite(id: &str, name: &str, full_name: &str, children: Vec<TestDescriptor>) -> Self {
        Self::new(id, name, full_name, NodeKind::TestSuite, children)
    }

    fn new(
        id: &str,
        name: &str,
        full_name: &str,
        kind: NodeKind,
        children: Vec<TestDescriptor>,
    ) -> Self {
        let test_count = if kind == NodeKind::TestCase {
            1
        } else {
            children.iter().map(|c| c.test_count).sum()
        };
        Self {
            id: id.into(),
            name: name.into(),
            full_name: full_name.into(),
            kind,
            run_state: RunState::Runnable,
            test_count,
            properties: IndexMap::new(),
            children,
        }
    }

    /// Sets the run state, builder-style.
    pub fn with_run_state(mut self, run_state: RunState) -> Self {
        self.run_state = run_state;
        self
    }

    /// Adds a property value, builder-style.
    pub fn with_property(mut self, key: &str, value: &str) -> Self {
        self.properties
            .entry(key.into())
            .or_default()
            .push(value.into());
        self
    }

    /// Adds a category, builder-style.
    pub fn with_category(self, category: &str) -> Self {
        self.with_property(CATEGORY_KEY, category)
    }
}

/// One node of a loaded [`TestTree`].
#[derive(Clone, Debug)]
pub struct TestNode {
    /// Engine-assigned id.
    pub id: SmolStr,
    /// Short display name.
    pub name: SmolStr,
    /// Fully qualified name.
    pub full_name: SmolStr,
    /// Node kind.
    pub kind: NodeKind,
    /// Run state.
    pub run_state: RunState,
    /// Static leaf count under this node.
    pub test_count: u32,
    /// Named properties.
    pub properties: IndexMap<SmolStr, Vec<SmolStr>>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    is_visible: bool,
}

impl TestNode {
    /// True for every kind that contains other nodes.
    pub fn is_suite(&self) -> bool {
        self.kind.is_suite()
    }

    /// True for runnable leaves (test cases).
    pub fn is_leaf(&self) -> bool {
        !self.is_suite()
    }

    /// The node's own category values (not including inherited ones).
    pub fn categories(&self) -> &[SmolStr] {
        self.properties
            .get(CATEGORY_KEY)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Child node ids, in engine order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// The parent node, if any.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Whether the node is visible under the active filter.
    ///
    /// Computed by the filtering layer; defaults to true on load.
    pub fn is_visible(&self) -> bool {
        self.is_visible
    }
}

/// Arena of [`TestNode`]s for one loaded session.
///
/// Nodes are stored in depth-first preorder, so every child's index is
/// strictly greater than its parent's. Bottom-up passes can therefore walk
/// the arena in reverse index order.
#[derive(Clone, Debug)]
pub struct TestTree {
    nodes: Vec<TestNode>,
    by_id: HashMap<SmolStr, NodeId>,
    by_full_name: HashMap<SmolStr, NodeId>,
}

impl TestTree {
    /// Builds a tree from the engine's exploration result.
    pub fn build(root: TestDescriptor) -> Result<TestTree, TreeBuildError> {
        let mut tree = TestTree {
            nodes: Vec::new(),
            by_id: HashMap::new(),
            by_full_name: HashMap::new(),
        };
        tree.insert(root, None)?;
        Ok(tree)
    }

    fn insert(
        &mut self,
        desc: TestDescriptor,
        parent: Option<NodeId>,
    ) -> Result<NodeId, TreeBuildError> {
        let id = NodeId(self.nodes.len() as u32);
        if self.by_id.insert(desc.id.clone(), id).is_some() {
            return Err(TreeBuildError::DuplicateId { id: desc.id });
        }
        // Full names are not guaranteed unique (parameterized tests); the
        // first occurrence wins so lookups stay deterministic.
        self.by_full_name.entry(desc.full_name.clone()).or_insert(id);
        self.nodes.push(TestNode {
            id: desc.id,
            name: desc.name,
            full_name: desc.full_name,
            kind: desc.kind,
            run_state: desc.run_state,
            test_count: desc.test_count,
            properties: desc.properties,
            parent,
            children: Vec::new(),
            is_visible: true,
        });
        for child in desc.children {
            let child_id = self.insert(child, Some(id))?;
            self.nodes[id.index()].children.push(child_id);
        }
        Ok(id)
    }

    /// The root node id.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// The number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the tree contains no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the node at `id`.
    pub fn node(&self, id: NodeId) -> &TestNode {
        &self.nodes[id.index()]
    }

    /// Looks up a node by engine id.
    pub fn by_id(&self, id: &str) -> Option<NodeId> {
        self.by_id.get(id).copied()
    }

    /// Looks up a node by full name. This is the only lookup valid across
    /// reloads, since engine ids are reassigned.
    pub fn by_full_name(&self, full_name: &str) -> Option<NodeId> {
        self.by_full_name.get(full_name).copied()
    }

    /// Sets a node's visibility flag. Only the filtering layer should call
    /// this.
    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        self.nodes[id.index()].is_visible = visible;
    }

    /// Applies one visibility flag per node, indexed by arena position.
    ///
    /// Lets a filtering pass compute all flags against `&TestTree` and
    /// write them back in one mutable step.
    pub fn apply_visibility(&mut self, flags: &[bool]) {
        for (node, &flag) in self.nodes.iter_mut().zip(flags) {
            node.is_visible = flag;
        }
    }

    /// All node ids in preorder.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    /// All node ids in reverse preorder, i.e. children before parents.
    pub fn ids_bottom_up(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len() as u32).rev().map(NodeId)
    }

    /// Ancestors of `id`, nearest first, excluding `id` itself.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut current = self.node(id).parent;
        std::iter::from_fn(move || {
            let next = current?;
            current = self.node(next).parent;
            Some(next)
        })
    }

    /// Descendants of `id` in preorder, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut stack: Vec<NodeId> = self.node(id).children.iter().rev().copied().collect();
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            stack.extend(self.node(next).children.iter().rev());
            Some(next)
        })
    }

    /// `id` followed by its descendants in preorder.
    pub fn self_and_descendants(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::once(id).chain(self.descendants(id))
    }

    /// Leaf test cases under `id` (including `id` itself if it is a leaf).
    pub fn leaves(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.self_and_descendants(id)
            .filter(|&n| self.node(n).is_leaf())
    }

    /// Category values that apply to `id`: its own plus every ancestor's.
    ///
    /// An ancestor category applies to all descendant leaves (OR semantics,
    /// not override); this matches the observed engine behavior.
    pub fn inherited_categories(&self, id: NodeId) -> impl Iterator<Item = &SmolStr> + '_ {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .flat_map(|n| self.node(n).categories().iter())
    }

    /// True if neither `id` nor any ancestor declares a category.
    pub fn has_no_category(&self, id: NodeId) -> bool {
        self.inherited_categories(id).next().is_none()
    }

    /// Bottom-up fold over the subtree rooted at `id`: `f` receives each
    /// node together with the folded values of its children.
    ///
    /// This is the typed replacement for per-node visitor dispatch; most
    /// aggregations in the view layer are written against it.
    pub fn fold<T>(&self, id: NodeId, f: &mut impl FnMut(NodeId, &TestNode, Vec<T>) -> T) -> T {
        let children = self.node(id).children.clone();
        let folded = children.into_iter().map(|c| self.fold(c, f)).collect();
        f(id, self.node(id), folded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_tree() -> TestTree {
        TestTree::build(TestDescriptor::suite(
            "0-1",
            "sample.dll",
            "sample.dll",
            vec![TestDescriptor::fixture(
                "0-2",
                "Fixture",
                "Sample.Fixture",
                vec![
                    TestDescriptor::case("0-3", "One", "Sample.Fixture.One"),
                    TestDescriptor::case("0-4", "Two", "Sample.Fixture.Two")
                        .with_category("slow"),
                ],
            )
            .with_category("db")],
        ))
        .unwrap()
    }

    #[test]
    fn build_assigns_preorder_indices() {
        let tree = sample_tree();
        assert_eq!(tree.len(), 4);
        let fixture = tree.by_id("0-2").unwrap();
        for &child in tree.node(fixture).children() {
            assert!(child > fixture);
        }
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = TestTree::build(TestDescriptor::suite(
            "0-1",
            "a",
            "a",
            vec![TestDescriptor::case("0-1", "b", "a.b")],
        ))
        .unwrap_err();
        assert!(matches!(err, TreeBuildError::DuplicateId { .. }));
    }

    #[test]
    fn lookup_by_id_and_full_name() {
        let tree = sample_tree();
        let one = tree.by_id("0-3").unwrap();
        assert_eq!(tree.node(one).full_name, "Sample.Fixture.One");
        assert_eq!(tree.by_full_name("Sample.Fixture.One"), Some(one));
        assert_eq!(tree.by_id("9-9"), None);
        assert_eq!(tree.by_full_name("Sample.Missing"), None);
    }

    #[test]
    fn ancestors_and_descendants() {
        let tree = sample_tree();
        let one = tree.by_id("0-3").unwrap();
        let chain: Vec<_> = tree
            .ancestors(one)
            .map(|n| tree.node(n).id.as_str().to_owned())
            .collect();
        assert_eq!(chain, ["0-2", "0-1"]);

        let below_root: Vec<_> = tree
            .descendants(tree.root())
            .map(|n| tree.node(n).id.as_str().to_owned())
            .collect();
        assert_eq!(below_root, ["0-2", "0-3", "0-4"]);
    }

    #[test]
    fn categories_are_inherited_not_overridden() {
        let tree = sample_tree();
        let one = tree.by_id("0-3").unwrap();
        let two = tree.by_id("0-4").unwrap();

        let one_cats: Vec<_> = tree
            .inherited_categories(one)
            .map(|c| c.as_str())
            .collect();
        assert_eq!(one_cats, ["db"]);

        // Own and ancestor categories both apply.
        let mut two_cats: Vec<_> = tree
            .inherited_categories(two)
            .map(|c| c.as_str())
            .collect();
        two_cats.sort_unstable();
        assert_eq!(two_cats, ["db", "slow"]);

        assert!(!tree.has_no_category(one));
    }

    #[test]
    fn apply_visibility_writes_one_flag_per_node() {
        let mut tree = sample_tree();
        let one = tree.by_id("0-3").unwrap();
        let mut flags = vec![true; tree.len()];
        flags[one.index()] = false;
        tree.apply_visibility(&flags);
        assert!(!tree.node(one).is_visible());
        assert!(tree.node(tree.root()).is_visible());
        assert!(tree.node(tree.by_id("0-4").unwrap()).is_visible());
    }

    #[test]
    fn fold_visits_children_first() {
        let tree = sample_tree();
        let leaf_count = tree.fold(tree.root(), &mut |_, node, children: Vec<u32>| {
            if node.is_leaf() {
                1
            } else {
                children.into_iter().sum()
            }
        });
        assert_eq!(leaf_count, 2);
    }

    #[test]
    fn descriptor_round_trips_through_serde() {
        let desc = TestDescriptor::fixture(
            "0-2",
            "Fixture",
            "Sample.Fixture",
            vec![TestDescriptor::case("0-3", "One", "Sample.Fixture.One")],
        )
        .with_category("db");
        let json = serde_json::to_string(&desc).unwrap();
        let back: TestDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(back.full_name, desc.full_name);
        assert_eq!(back.children.len(), 1);
        assert_eq!(back.properties.get(CATEGORY_KEY).unwrap().len(), 1);
    }
}
