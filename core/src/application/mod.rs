// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Application
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Security pipeline stages and the tool surface they guard

pub mod authentication;
pub mod authorization;
pub mod memory_tools;
pub mod pipeline;
pub mod tool_registry;
