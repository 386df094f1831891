// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Recall core
//!
//! Request-security pipeline for the Recall memory server: bearer-token
//! authentication, role-based tool authorization and redacting audit
//! logging, plus the in-memory tool surface they guard.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Domain types, pipeline stages, infrastructure tables and transports

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
