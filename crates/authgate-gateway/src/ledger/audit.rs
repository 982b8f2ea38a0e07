//! Audit ledger: one entry per authorization decision.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, NoneAsEmptyString};

use authgate_core::{AuthContext, Verdict};

use super::{contains_ci, entry_id, newest_first, percent, rank_by_count, BoundedLog, TOP_N};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub principal: String,
    pub action: String,
    pub resource: String,
    pub context: AuthContext,
    pub result: Verdict,
    pub reason: String,
    pub duration_ms: f64,
    pub fallback: bool,
}

/// Query filters. Unset or empty fields match everything.
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditFilter {
    /// Case-insensitive substring of the principal.
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default, alias = "user")]
    pub principal: Option<String>,
    /// Case-insensitive substring of the action.
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub action: Option<String>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub result: Option<Verdict>,
}

impl AuditFilter {
    fn matches(&self, e: &AuditLogEntry) -> bool {
        if let Some(p) = &self.principal {
            if !contains_ci(&e.principal, p) {
                return false;
            }
        }
        if let Some(a) = &self.action {
            if !contains_ci(&e.action, a) {
                return false;
            }
        }
        if let Some(r) = self.result {
            if e.result != r {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionCount {
    pub action: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrincipalSummary {
    pub principal: String,
    pub requests: u64,
    pub success_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditStats {
    pub total_requests: u64,
    pub allowed_requests: u64,
    pub denied_requests: u64,
    pub success_rate: f64,
    pub top_actions: Vec<ActionCount>,
    pub top_principals: Vec<PrincipalSummary>,
}

pub struct AuditLedger {
    log: BoundedLog<AuditLogEntry>,
}

impl AuditLedger {
    pub fn new(capacity: usize) -> Self {
        Self {
            log: BoundedLog::new(capacity),
        }
    }

    /// Fresh entry id for a decision taken at `at`.
    pub fn next_id(&self, at: &DateTime<Utc>) -> String {
        entry_id("auth", self.log.next_seq(), at)
    }

    pub fn record(&self, entry: AuditLogEntry) {
        if let Some(old) = self.log.push(entry) {
            tracing::trace!(id = %old.id, "audit entry evicted");
        }
    }

    /// Append an entry stamped at append time. `build` receives the fresh id
    /// and timestamp; entries recorded this way stay in chronological order.
    pub fn record_now<F>(&self, build: F)
    where
        F: FnOnce(String, DateTime<Utc>) -> AuditLogEntry,
    {
        let evicted = self.log.push_with(|seq| {
            let at = Utc::now();
            build(entry_id("auth", seq, &at), at)
        });
        if let Some(old) = evicted {
            tracing::trace!(id = %old.id, "audit entry evicted");
        }
    }

    pub fn query(&self, limit: usize, filter: &AuditFilter) -> Vec<AuditLogEntry> {
        let hits = self
            .log
            .snapshot()
            .into_iter()
            .filter(|e| filter.matches(e))
            .collect();
        newest_first(hits, |e| e.timestamp, limit)
    }

    pub fn stats(&self) -> AuditStats {
        let entries = self.log.snapshot();
        let total = entries.len() as u64;
        let allowed = entries.iter().filter(|e| e.result == Verdict::Allow).count() as u64;

        let top_actions = rank_by_count(entries.iter().map(|e| e.action.as_str()))
            .into_iter()
            .take(TOP_N)
            .map(|(action, count)| ActionCount { action, count })
            .collect();

        let mut allowed_by: HashMap<&str, u64> = HashMap::new();
        for e in entries.iter().filter(|e| e.result == Verdict::Allow) {
            *allowed_by.entry(e.principal.as_str()).or_default() += 1;
        }
        let top_principals = rank_by_count(entries.iter().map(|e| e.principal.as_str()))
            .into_iter()
            .take(TOP_N)
            .map(|(principal, requests)| {
                let ok = allowed_by.get(principal.as_str()).copied().unwrap_or(0);
                PrincipalSummary {
                    success_rate: percent(ok, requests),
                    principal,
                    requests,
                }
            })
            .collect();

        AuditStats {
            total_requests: total,
            allowed_requests: allowed,
            denied_requests: total - allowed,
            success_rate: percent(allowed, total),
            top_actions,
            top_principals,
        }
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.log.capacity()
    }
}
