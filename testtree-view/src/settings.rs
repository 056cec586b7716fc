// Copyright (c) The testtree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed display settings.
//!
//! The embedder constructs one [`TreeSettings`] (usually deserialized from
//! its settings store) and hands it to the display strategy; nothing in
//! this workspace fetches settings ambiently by string key.

use serde::Deserialize;

/// How the tree is presented.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayGrouping {
    /// The plain hierarchy, no grouping.
    #[default]
    Hierarchy,
    /// Buckets by latest outcome.
    Outcome,
    /// Buckets by latest duration.
    Duration,
    /// Buckets by category.
    Category,
}

/// Settings consumed by the display strategy.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TreeSettings {
    /// Discard prior results when a new run starts; otherwise they are
    /// kept and marked as belonging to an earlier run.
    pub clear_results_on_run: bool,
    /// Discard prior results on reload; otherwise they are re-attached to
    /// the new tree by full name.
    pub clear_results_on_reload: bool,
    /// The grouping applied when (re)loading the display.
    pub grouping: DisplayGrouping,
}

impl Default for TreeSettings {
    fn default() -> Self {
        Self {
            clear_results_on_run: true,
            clear_results_on_reload: false,
            grouping: DisplayGrouping::Hierarchy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn settings_deserialize_with_defaults() {
        let settings: TreeSettings =
            serde_json::from_str(r#"{ "grouping": "duration" }"#).unwrap();
        assert_eq!(settings.grouping, DisplayGrouping::Duration);
        assert!(settings.clear_results_on_run);
        assert!(!settings.clear_results_on_reload);
    }
}
