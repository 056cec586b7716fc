// Copyright (c) The testtree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced while building the model.
//!
//! Most "missing" conditions (unknown id, no result yet) are deliberately
//! `Option`s rather than errors: reload races with in-flight events are
//! expected and handled by logging, not by failing.

use smol_str::SmolStr;
use std::num::ParseFloatError;
use thiserror::Error;

/// An error building a [`TestTree`](crate::TestTree) from an exploration
/// result.
#[derive(Clone, Debug, Error)]
pub enum TreeBuildError {
    /// The same engine id appeared on two nodes.
    #[error("duplicate test id `{id}` in exploration result")]
    DuplicateId {
        /// The offending id.
        id: SmolStr,
    },
}

/// A duration attribute could not be parsed as seconds.
#[derive(Clone, Debug, Error)]
#[error("invalid duration `{input}`")]
pub struct DurationParseError {
    /// The unparseable input.
    pub input: String,
    /// The underlying float parse error.
    #[source]
    pub source: ParseFloatError,
}
