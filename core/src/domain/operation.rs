// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Operation
//!
//! Named, invokable capabilities and the action a caller is attempting.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Operation catalog seam between the security pipeline and the tool surface

use std::collections::BTreeSet;
use std::fmt;

/// Enumeration of every operation name the server exposes.
///
/// Used at startup to validate the policy document and at request time to
/// filter tool listings.
pub trait OperationCatalog: Send + Sync {
    fn operation_names(&self) -> BTreeSet<String>;

    fn exposes(&self, name: &str) -> bool {
        self.operation_names().contains(name)
    }
}

impl OperationCatalog for BTreeSet<String> {
    fn operation_names(&self) -> BTreeSet<String> {
        self.clone()
    }

    fn exposes(&self, name: &str) -> bool {
        self.contains(name)
    }
}

/// What a non-exempt request is trying to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestedAction {
    /// Session-level protocol message (`initialize`, `ping`, notifications).
    /// Needs a principal, grants nothing.
    Session(String),
    /// Tool discovery. Needs a principal; the result is filtered by role.
    ListTools,
    /// Invocation of a named operation. Needs a principal and a policy grant.
    CallTool(String),
}

impl RequestedAction {
    /// Name of the operation being invoked, if this action invokes one.
    pub fn operation(&self) -> Option<&str> {
        match self {
            Self::CallTool(name) => Some(name),
            Self::Session(_) | Self::ListTools => None,
        }
    }
}

impl fmt::Display for RequestedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Session(method) => f.write_str(method),
            Self::ListTools => f.write_str("tools/list"),
            Self::CallTool(name) => f.write_str(name),
        }
    }
}
