// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Security Audit Logger
//!
//! Single emitter for security events. Both pipeline stages hand it an
//! [`AuditEvent`]; it redacts the event into an [`AuditLogEntry`] (see
//! [`crate::domain::audit`]) and writes that entry synchronously to every
//! registered [`AuditSink`] before the stage returns.
//!
//! Call sites never format credentials themselves, so the redaction rule holds
//! even if a caller passes a raw token.
//!
//! The default sink is [`TracingAuditSink`], which emits through `tracing`
//! under the `recall::audit` target at the entry's level.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::audit::{AuditEvent, AuditEventKind, AuditLevel, AuditLogEntry};

pub const AUDIT_TARGET: &str = "recall::audit";

/// Destination for redacted audit entries.
pub trait AuditSink: Send + Sync {
    fn write(&self, entry: &AuditLogEntry);
}

/// Writes entries to the process `tracing` subscriber.
#[derive(Debug, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn write(&self, entry: &AuditLogEntry) {
        let correlation_id = entry.correlation_id.as_deref().unwrap_or("-");
        let operation = entry.operation.as_deref().unwrap_or("-");
        match entry.level {
            AuditLevel::Info => info!(
                target: AUDIT_TARGET,
                event = entry.kind.as_str(),
                operation,
                correlation_id,
                "{}",
                entry.message
            ),
            AuditLevel::Warn => warn!(
                target: AUDIT_TARGET,
                event = entry.kind.as_str(),
                operation,
                correlation_id,
                "{}",
                entry.message
            ),
        }
    }
}

/// Keeps entries in memory. Used by tests and embedders that ship audit
/// records elsewhere.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    entries: Mutex<Vec<AuditLogEntry>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<AuditLogEntry> {
        self.entries.lock().clone()
    }

    pub fn count(&self, kind: AuditEventKind) -> usize {
        self.entries.lock().iter().filter(|e| e.kind == kind).count()
    }

    /// Rendered lines, as they would appear in a log file.
    pub fn lines(&self) -> Vec<String> {
        self.entries.lock().iter().map(|e| e.to_string()).collect()
    }
}

impl AuditSink for MemoryAuditSink {
    fn write(&self, entry: &AuditLogEntry) {
        self.entries.lock().push(entry.clone());
    }
}

pub struct AuditLogger {
    sinks: Vec<Arc<dyn AuditSink>>,
}

impl AuditLogger {
    /// Logger writing to `tracing` only.
    pub fn new() -> Self {
        Self {
            sinks: vec![Arc::new(TracingAuditSink)],
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Redact, count and write one event. Returns the entry that was written.
    pub fn record(&self, event: AuditEvent) -> AuditLogEntry {
        let entry = AuditLogEntry::from_event(event);
        metrics::counter!(
            "recall_auth_decisions_total",
            "event" => entry.kind.as_str(),
            "outcome" => entry.outcome.as_str()
        )
        .increment(1);
        for sink in &self.sinks {
            sink.write(&entry);
        }
        entry
    }
}

impl Default for AuditLogger {
    fn default() -> Self {
        Self::new()
    }
}
