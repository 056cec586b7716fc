// Copyright (c) The testtree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Visibility filtering for the testtree GUI core.
//!
//! Three layers live here: composable per-node predicates
//! ([`NodeFilter`]), the aggregate user-facing filter that recomputes the
//! whole tree's visibility in one pass ([`ViewFilter`]), and the outbound
//! id-based [`RunFilter`] handed to the execution engine to run exactly
//! what is displayed.

mod node_filter;
mod run_filter;
mod view_filter;

pub use node_filter::*;
pub use run_filter::*;
pub use view_filter::*;
