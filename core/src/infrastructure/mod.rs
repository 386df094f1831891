// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Infrastructure
//!
//! Startup-built lookup tables, the audit sink chain and the in-memory
//! episode store behind the memory tools.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure Layer
//! - **Purpose:** Implements credential, policy and audit storage

pub mod audit;
pub mod credential_store;
pub mod episode_store;
pub mod policy_engine;
