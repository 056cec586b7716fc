// Copyright (c) The testtree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Composable per-node visibility predicates.
//!
//! A [`NodeFilter`] decides whether a single node matches; [`NodeFilter::passes`]
//! lifts that to tree visibility with the self / ancestor / descendant rule.

use smol_str::SmolStr;
use std::collections::HashSet;
use testtree_model::{NodeId, RunState, TestTree};

/// A composable predicate over test nodes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeFilter {
    /// Matches every node.
    Empty,
    /// Matches nodes with at least one own category in the given set.
    Categories(HashSet<SmolStr>),
    /// Inverts the inner filter's direct match.
    Not(Box<NodeFilter>),
}

impl NodeFilter {
    /// Creates a category filter from category names.
    pub fn categories<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        NodeFilter::Categories(names.into_iter().map(Into::into).collect())
    }

    /// Negates this filter.
    pub fn negate(self) -> Self {
        NodeFilter::Not(Box::new(self))
    }

    /// Whether the node itself matches this filter.
    pub fn matches(&self, tree: &TestTree, id: NodeId) -> bool {
        match self {
            NodeFilter::Empty => true,
            NodeFilter::Categories(wanted) => tree
                .node(id)
                .categories()
                .iter()
                .any(|category| wanted.contains(category)),
            NodeFilter::Not(inner) => !inner.matches(tree, id),
        }
    }

    fn matches_ancestor(&self, tree: &TestTree, id: NodeId) -> bool {
        tree.ancestors(id).any(|ancestor| self.matches(tree, ancestor))
    }

    fn matches_descendant(&self, tree: &TestTree, id: NodeId) -> bool {
        tree.descendants(id)
            .any(|descendant| self.matches(tree, descendant))
    }

    /// Whether the node should be visible under this filter.
    ///
    /// A node passes if it matches directly, if a matching ancestor pulls it
    /// in (never for explicit-only nodes), or if any descendant matches, so
    /// containers housing a match stay visible and expandable.
    ///
    /// Negation keeps the descendant clause but drops the ancestor clause:
    /// hiding a node must not hide the containers that make its matching
    /// descendants reachable.
    pub fn passes(&self, tree: &TestTree, id: NodeId) -> bool {
        match self {
            NodeFilter::Not(_) => {
                self.matches(tree, id) || self.matches_descendant(tree, id)
            }
            _ => {
                self.matches(tree, id)
                    || (tree.node(id).run_state != RunState::Explicit
                        && self.matches_ancestor(tree, id))
                    || self.matches_descendant(tree, id)
            }
        }
    }
}
