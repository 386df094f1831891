// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Recall server library - exposes testable components
//!
//! # Architecture
//!
//! - **Layer:** Interface / Presentation Layer
//! - **Purpose:** Command handlers and HTTP server lifecycle for the `recall` binary

pub mod commands;
pub mod env_file;
pub mod server;
