// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Value objects and errors shared by every layer of the security pipeline.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Principals, roles, policies, operations, audit records, configuration

pub mod audit;
pub mod errors;
pub mod operation;
pub mod policy;
pub mod principal;
pub mod security_config;
