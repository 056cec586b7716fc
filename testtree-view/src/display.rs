// Copyright (c) The testtree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The incremental display strategy.
//!
//! Builds the visual tree through a [`TreeView`] abstraction and, as result
//! events arrive, updates exactly the affected node and bubbles the
//! aggregate status image up the ancestor chain, so a failing leaf turns
//! its containers red while the run is still going. No event ever causes a
//! full rebuild; only loads do.

use crate::grouping::{
    CategoryGrouping, DurationGrouping, Grouping, OutcomeGrouping, StatusImage,
};
use crate::settings::{DisplayGrouping, TreeSettings};
use std::collections::HashMap;
use testtree_model::{NodeId, ResultStore, RunEvent, TestResult, TestTree};
use tracing::debug;

/// The presentation-layer seam.
///
/// Implemented by the embedder over its actual tree widget; the strategy
/// calls these and never draws anything itself. All calls happen on the
/// thread that delivers events to the strategy.
pub trait TreeView {
    /// Removes all nodes and group headers.
    fn clear(&mut self);
    /// Adds a node under `parent` (`None` for the root).
    fn add_node(&mut self, parent: Option<NodeId>, node: NodeId, label: &str);
    /// Adds a group header.
    fn add_group(&mut self, name: &str, image: StatusImage);
    /// Adds a node under a group header.
    fn add_to_group(&mut self, group: &str, node: NodeId, label: &str);
    /// Updates a node's status image.
    fn set_image(&mut self, node: NodeId, image: StatusImage);
    /// Updates a group header's status image.
    fn set_group_image(&mut self, group: &str, image: StatusImage);
    /// Expands a node.
    fn expand(&mut self, node: NodeId);
    /// Selects a node.
    fn select(&mut self, node: NodeId);
}

/// Drives a [`TreeView`] from loads and run events.
pub struct DisplayStrategy<V> {
    view: V,
    settings: TreeSettings,
    grouping: Option<Box<dyn Grouping>>,
    /// Result-derived image per node; rebuilt on load, updated per event.
    images: HashMap<NodeId, StatusImage>,
}

impl<V: TreeView> DisplayStrategy<V> {
    /// Creates a strategy writing to `view`, configured by `settings`.
    pub fn new(view: V, settings: TreeSettings) -> Self {
        let grouping: Option<Box<dyn Grouping>> = match settings.grouping {
            DisplayGrouping::Hierarchy => None,
            DisplayGrouping::Outcome => Some(Box::new(OutcomeGrouping::new())),
            DisplayGrouping::Duration => Some(Box::new(DurationGrouping::new())),
            DisplayGrouping::Category => Some(Box::new(CategoryGrouping::new())),
        };
        Self {
            view,
            settings,
            grouping,
            images: HashMap::new(),
        }
    }

    /// The underlying view.
    pub fn view(&self) -> &V {
        &self.view
    }

    /// The active grouping, if the settings selected one.
    pub fn grouping(&self) -> Option<&dyn Grouping> {
        self.grouping.as_deref()
    }

    /// (Re)populates the view for a freshly loaded tree.
    ///
    /// Depending on the settings, prior results are either discarded or
    /// re-attached to the new tree by full name (ids are reassigned by the
    /// engine on reload, so id-based correlation would silently drop
    /// everything).
    pub fn load(&mut self, tree: &TestTree, results: &mut ResultStore) {
        if self.settings.clear_results_on_reload {
            results.clear();
        } else {
            results.rekey(tree);
        }
        self.images.clear();
        self.view.clear();

        match &mut self.grouping {
            None => {
                for id in tree.ids() {
                    self.view
                        .add_node(tree.node(id).parent(), id, &tree.node(id).name);
                }
            }
            Some(grouping) => {
                grouping.load(tree, results);
                for group in grouping.groups().values() {
                    self.view.add_group(&group.name, group.image);
                    for &member in group.members() {
                        self.view
                            .add_to_group(&group.name, member, &tree.node(member).full_name);
                    }
                }
            }
        }

        // Re-derive node images from whatever results survived, children
        // before parents so aggregates see their children's images.
        for id in tree.ids_bottom_up() {
            let image = self.compute_image(tree, results, id);
            if image != StatusImage::None || results.result_for(&tree.node(id).id).is_some() {
                self.images.insert(id, image);
                self.view.set_image(id, image);
            }
        }
    }

    /// Applies one engine event to the view.
    pub fn on_event(&mut self, tree: &TestTree, results: &mut ResultStore, event: &RunEvent) {
        match event {
            RunEvent::RunStarted { .. } => {
                if self.settings.clear_results_on_run {
                    results.clear();
                    self.images.clear();
                    for id in tree.ids() {
                        self.view.set_image(id, StatusImage::NotRun);
                    }
                } else {
                    results.mark_stale();
                }
            }
            RunEvent::TestStarted { id } => match tree.by_id(id) {
                Some(node) => self.view.set_image(node, StatusImage::Running),
                None => debug!(id = id.as_str(), "test-started for id not in tree"),
            },
            RunEvent::SuiteStarted { .. } => {}
            RunEvent::TestFinished { result } => {
                self.apply_result(tree, results, result);
                self.update_groups_for(tree, results, result);
            }
            RunEvent::SuiteFinished { result } => {
                self.apply_result(tree, results, result);
            }
            RunEvent::RunFinished { result, .. } => {
                self.apply_result(tree, results, result);
                if let Some(grouping) = &mut self.grouping {
                    grouping.on_run_finished(tree, results);
                    for group in grouping.groups().values() {
                        self.view.set_group_image(&group.name, group.image);
                    }
                }
            }
            RunEvent::Output { id, text } => {
                if let Some(id) = id {
                    results.append_output(id, text);
                }
            }
        }
    }

    /// Attaches a result to its node and refreshes images from the node up
    /// to the root. Results for ids not in the current tree are expected
    /// during reload races and are dropped with a trace.
    fn apply_result(&mut self, tree: &TestTree, results: &mut ResultStore, result: &TestResult) {
        let Some(node) = tree.by_id(&result.id) else {
            debug!(id = result.id.as_str(), "result for id not in tree");
            return;
        };
        results.insert(result.clone());
        self.refresh_image(tree, results, node);
        for ancestor in tree.ancestors(node) {
            self.refresh_image(tree, results, ancestor);
        }
    }

    fn update_groups_for(&mut self, tree: &TestTree, results: &ResultStore, result: &TestResult) {
        if let Some(grouping) = &mut self.grouping {
            for name in grouping.on_test_finished(tree, results, result) {
                let image = grouping.groups()[&name].image;
                self.view.set_group_image(&name, image);
            }
        }
    }

    fn refresh_image(&mut self, tree: &TestTree, results: &ResultStore, id: NodeId) {
        let image = self.compute_image(tree, results, id);
        self.images.insert(id, image);
        self.view.set_image(id, image);
    }

    /// A leaf shows its own result; a suite shows the aggregate of its own
    /// result (if reported) and whatever children have reported so far.
    fn compute_image(&self, tree: &TestTree, results: &ResultStore, id: NodeId) -> StatusImage {
        let node = tree.node(id);
        let own = results
            .result_for(&node.id)
            .map(|result| StatusImage::from_result(&result.outcome));
        if node.is_leaf() {
            return own.unwrap_or(StatusImage::NotRun);
        }
        StatusImage::aggregate(
            own.into_iter().chain(
                node.children()
                    .iter()
                    .filter_map(|child| self.images.get(child).copied()),
            ),
        )
    }
}
