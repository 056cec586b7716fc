// Copyright (c) The testtree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Derived views over the test tree: grouping strategies, aggregate result
//! counts, the incremental display strategy that applies run events to a
//! presentation-layer abstraction, and the typed event dispatcher.
//!
//! Nothing here draws anything. The presentation layer implements
//! [`TreeView`] and is notified through it; all state mutation happens on
//! the single UI thread after the embedder marshals engine events onto it.

mod counts;
mod dispatch;
mod display;
mod grouping;
mod settings;

pub use counts::*;
pub use dispatch::*;
pub use display::*;
pub use grouping::*;
pub use settings::*;
