// Copyright (c) The testtree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The aggregate, user-facing filter.
//!
//! A [`ViewFilter`] combines a free-text substring match, category
//! membership and outcome membership. Changing any of the three runs one
//! synchronous pass over the whole tree, recomputes every node's
//! visibility flag, and fires a single change notification. Callers must
//! not assume incremental recomputation.

use aho_corasick::AhoCorasick;
use smol_str::SmolStr;
use std::collections::{BTreeSet, HashSet};
use testtree_model::{NodeId, ResultStore, TestStatus, TestTree};
use tracing::warn;

/// One entry in the category selection.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum CategorySelector {
    /// A named category.
    Named(SmolStr),
    /// Tests with no category anywhere in their ancestry.
    NoCategory,
}

/// One entry in the outcome selection.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum OutcomeSelector {
    /// Tests whose latest result has this status.
    Status(TestStatus),
    /// Tests with no result yet.
    NotRun,
    /// Bypass the outcome check entirely.
    All,
}

/// The aggregate user filter for one loaded tree.
///
/// Create one per session, call [`init`](Self::init) after a load, and use
/// the setters as the user edits filter criteria.
pub struct ViewFilter {
    text: String,
    matcher: Option<AhoCorasick>,
    categories: HashSet<CategorySelector>,
    outcomes: HashSet<OutcomeSelector>,
    all_categories: BTreeSet<SmolStr>,
    on_changed: Option<Box<dyn FnMut()>>,
}

impl Default for ViewFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewFilter {
    /// Creates a filter with nothing selected out: empty text, all
    /// categories, all outcomes.
    pub fn new() -> Self {
        Self {
            text: String::new(),
            matcher: None,
            categories: HashSet::from([CategorySelector::NoCategory]),
            outcomes: HashSet::from([OutcomeSelector::All]),
            all_categories: BTreeSet::new(),
            on_changed: None,
        }
    }

    /// Registers the single change callback, fired once per recomputation.
    pub fn set_on_changed(&mut self, callback: impl FnMut() + 'static) {
        self.on_changed = Some(Box::new(callback));
    }

    /// (Re)initializes for a freshly loaded tree: discovers the category
    /// universe, resets all selections, and recomputes visibility.
    pub fn init(&mut self, tree: &mut TestTree, results: &ResultStore) {
        self.all_categories = tree
            .ids()
            .flat_map(|id| tree.node(id).categories().iter().cloned())
            .collect();
        self.reset_selections();
        self.refresh(tree, results);
    }

    /// Every distinct category found in the loaded tree.
    ///
    /// The `NoCategory` sentinel is not part of this set; UIs add it as a
    /// separate entry.
    pub fn all_categories(&self) -> impl Iterator<Item = &SmolStr> + '_ {
        self.all_categories.iter()
    }

    /// The current free-text criterion.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The current category selection.
    pub fn selected_categories(&self) -> &HashSet<CategorySelector> {
        &self.categories
    }

    /// The current outcome selection.
    pub fn selected_outcomes(&self) -> &HashSet<OutcomeSelector> {
        &self.outcomes
    }

    /// Sets the free-text criterion (case-insensitive substring over full
    /// names) and recomputes visibility.
    pub fn set_text(&mut self, text: &str, tree: &mut TestTree, results: &ResultStore) {
        self.text = text.to_owned();
        self.matcher = if text.is_empty() {
            None
        } else {
            match AhoCorasick::builder()
                .ascii_case_insensitive(true)
                .build([text])
            {
                Ok(matcher) => Some(matcher),
                Err(error) => {
                    warn!(%error, "failed to build text matcher; matching nothing");
                    None
                }
            }
        };
        self.refresh(tree, results);
    }

    /// Sets the category selection and recomputes visibility.
    pub fn set_categories(
        &mut self,
        categories: HashSet<CategorySelector>,
        tree: &mut TestTree,
        results: &ResultStore,
    ) {
        self.categories = categories;
        self.refresh(tree, results);
    }

    /// Sets the outcome selection and recomputes visibility.
    pub fn set_outcomes(
        &mut self,
        outcomes: HashSet<OutcomeSelector>,
        tree: &mut TestTree,
        results: &ResultStore,
    ) {
        self.outcomes = outcomes;
        self.refresh(tree, results);
    }

    /// Resets text, categories and outcomes to their permissive defaults
    /// and recomputes visibility.
    pub fn clear_all_filters(&mut self, tree: &mut TestTree, results: &ResultStore) {
        self.reset_selections();
        self.refresh(tree, results);
    }

    /// True if any criterion narrows the view.
    pub fn is_active(&self) -> bool {
        !self.text.is_empty()
            || !self.outcomes.contains(&OutcomeSelector::All)
            || !self.categories.contains(&CategorySelector::NoCategory)
            || self
                .all_categories
                .iter()
                .any(|c| !self.categories.contains(&CategorySelector::Named(c.clone())))
    }

    fn reset_selections(&mut self) {
        self.text.clear();
        self.matcher = None;
        self.categories = self
            .all_categories
            .iter()
            .cloned()
            .map(CategorySelector::Named)
            .chain(std::iter::once(CategorySelector::NoCategory))
            .collect();
        self.outcomes = HashSet::from([OutcomeSelector::All]);
    }

    /// One full visibility pass, children before parents, then the single
    /// change notification.
    fn refresh(&mut self, tree: &mut TestTree, results: &ResultStore) {
        let mut visible = vec![false; tree.len()];
        for id in tree.ids_bottom_up() {
            let direct = self.direct_match(tree, results, id);
            let any_child_visible = tree
                .node(id)
                .children()
                .iter()
                .any(|child| visible[child.index()]);
            // A container stays visible when anything under it is; that
            // keeps visibility monotonic from leaf to root.
            visible[id.index()] = direct || (tree.node(id).is_suite() && any_child_visible);
        }
        tree.apply_visibility(&visible);
        if let Some(callback) = &mut self.on_changed {
            callback();
        }
    }

    fn direct_match(&self, tree: &TestTree, results: &ResultStore, id: NodeId) -> bool {
        self.matches_text(tree, id)
            && self.matches_category(tree, id)
            && self.matches_outcome(tree, results, id)
    }

    fn matches_text(&self, tree: &TestTree, id: NodeId) -> bool {
        if self.text.is_empty() {
            return true;
        }
        match &self.matcher {
            Some(matcher) => matcher.is_match(tree.node(id).full_name.as_str()),
            None => false,
        }
    }

    fn matches_category(&self, tree: &TestTree, id: NodeId) -> bool {
        let mut inherited = tree.inherited_categories(id).peekable();
        if inherited.peek().is_none() {
            return self.categories.contains(&CategorySelector::NoCategory);
        }
        inherited.any(|category| {
            self.categories
                .contains(&CategorySelector::Named(category.clone()))
        })
    }

    fn matches_outcome(&self, tree: &TestTree, results: &ResultStore, id: NodeId) -> bool {
        if self.outcomes.contains(&OutcomeSelector::All) {
            return true;
        }
        match results.result_for(&tree.node(id).id) {
            Some(result) => self
                .outcomes
                .contains(&OutcomeSelector::Status(result.outcome.status)),
            None => self.outcomes.contains(&OutcomeSelector::NotRun),
        }
    }
}
