// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the Recall CLI

pub mod config;
pub mod policy;
pub mod serve;

pub use self::config::ConfigCommand;
pub use self::policy::PolicyCommand;
pub use self::serve::ServeArgs;
