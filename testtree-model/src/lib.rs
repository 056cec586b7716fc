// Copyright (c) The testtree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Canonical data model for the testtree GUI core: the loaded test tree,
//! result nodes and the result store, and the run-event stream delivered by
//! the execution engine.
//!
//! Everything downstream (filtering, grouping, display) is a view over the
//! types defined here. The tree is rebuilt wholesale on every load; results
//! are keyed by engine id within a session and re-attached by full name
//! across reloads, since engine ids are reassigned on reload.

pub mod errors;
mod events;
mod results;
mod tree;

pub use events::*;
pub use results::*;
pub use tree::*;
