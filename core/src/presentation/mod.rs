// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Presentation
//!
//! # Architecture
//!
//! - **Layer:** Presentation Layer
//! - **Purpose:** HTTP and stdio transports over a shared JSON-RPC handler

pub mod api;
pub mod jsonrpc;
pub mod mcp;
pub mod stdio;
