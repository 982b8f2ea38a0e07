//! Traffic ledger: one entry per non-static HTTP request.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, NoneAsEmptyString};

use super::{
    contains_ci, entry_id, newest_first, percent, rank_by_count, round2, BoundedLog, TOP_N,
};

/// Principal recorded when the request carries no resolvable identity.
pub const ANONYMOUS: &str = "anonymous";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficLogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub method: String,
    pub path: String,
    /// Matched route pattern, `"unknown"` when no route matched.
    pub endpoint: String,
    pub status_code: u16,
    pub duration_ms: f64,
    pub ip_address: String,
    pub user_agent: String,
    pub principal: String,
    pub content_length: u64,
    #[serde(default)]
    pub referrer: Option<String>,
    #[serde(default)]
    pub args: BTreeMap<String, String>,
}

/// Query filters. Unset or empty fields match everything.
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrafficFilter {
    /// Case-insensitive substring of the principal.
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default, alias = "user")]
    pub principal: Option<String>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub method: Option<String>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub status_code: Option<u16>,
    /// Inclusive lower bound on `duration_ms`.
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub min_duration: Option<f64>,
}

impl TrafficFilter {
    fn matches(&self, e: &TrafficLogEntry) -> bool {
        if let Some(p) = &self.principal {
            if !contains_ci(&e.principal, p) {
                return false;
            }
        }
        if let Some(m) = self.method.as_deref().filter(|m| !m.is_empty()) {
            if e.method != m {
                return false;
            }
        }
        if let Some(s) = self.status_code {
            if e.status_code != s {
                return false;
            }
        }
        if let Some(d) = self.min_duration {
            if e.duration_ms < d {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointSummary {
    pub endpoint: String,
    pub count: u64,
    pub avg_duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrincipalCount {
    pub principal: String,
    pub requests: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrafficStats {
    pub total_requests: u64,
    pub error_requests: u64,
    pub error_rate: f64,
    pub avg_duration_ms: f64,
    pub max_duration_ms: f64,
    pub min_duration_ms: f64,
    pub status_codes: BTreeMap<u16, u64>,
    pub methods: BTreeMap<String, u64>,
    pub top_endpoints: Vec<EndpointSummary>,
    pub top_principals: Vec<PrincipalCount>,
}

pub struct TrafficLedger {
    log: BoundedLog<TrafficLogEntry>,
}

impl TrafficLedger {
    pub fn new(capacity: usize) -> Self {
        Self {
            log: BoundedLog::new(capacity),
        }
    }

    pub fn next_id(&self, at: &DateTime<Utc>) -> String {
        entry_id("traffic", self.log.next_seq(), at)
    }

    pub fn record(&self, entry: TrafficLogEntry) {
        if let Some(old) = self.log.push(entry) {
            tracing::trace!(id = %old.id, "traffic entry evicted");
        }
    }

    /// Append an entry stamped at append time. `build` receives the fresh id
    /// and timestamp; entries recorded this way stay in chronological order.
    pub fn record_now<F>(&self, build: F)
    where
        F: FnOnce(String, DateTime<Utc>) -> TrafficLogEntry,
    {
        let evicted = self.log.push_with(|seq| {
            let at = Utc::now();
            build(entry_id("traffic", seq, &at), at)
        });
        if let Some(old) = evicted {
            tracing::trace!(id = %old.id, "traffic entry evicted");
        }
    }

    pub fn query(&self, limit: usize, filter: &TrafficFilter) -> Vec<TrafficLogEntry> {
        let hits = self
            .log
            .snapshot()
            .into_iter()
            .filter(|e| filter.matches(e))
            .collect();
        newest_first(hits, |e| e.timestamp, limit)
    }

    pub fn stats(&self) -> TrafficStats {
        let entries = self.log.snapshot();
        let total = entries.len() as u64;

        let mut status_codes = BTreeMap::new();
        let mut methods = BTreeMap::new();
        let mut endpoint_ms: HashMap<&str, f64> = HashMap::new();
        let mut sum = 0.0;
        let mut max = f64::MIN;
        let mut min = f64::MAX;
        let mut errors = 0u64;

        for e in &entries {
            *status_codes.entry(e.status_code).or_insert(0u64) += 1;
            *methods.entry(e.method.clone()).or_insert(0u64) += 1;
            *endpoint_ms.entry(e.endpoint.as_str()).or_default() += e.duration_ms;
            sum += e.duration_ms;
            max = max.max(e.duration_ms);
            min = min.min(e.duration_ms);
            if e.status_code >= 400 {
                errors += 1;
            }
        }

        let (avg, max, min) = if total == 0 {
            (0.0, 0.0, 0.0)
        } else {
            (round2(sum / total as f64), round2(max), round2(min))
        };

        let top_endpoints = rank_by_count(entries.iter().map(|e| e.endpoint.as_str()))
            .into_iter()
            .take(TOP_N)
            .map(|(endpoint, count)| {
                let ms = endpoint_ms.get(endpoint.as_str()).copied().unwrap_or(0.0);
                EndpointSummary {
                    avg_duration: round2(ms / count as f64),
                    endpoint,
                    count,
                }
            })
            .collect();

        let top_principals = rank_by_count(entries.iter().map(|e| e.principal.as_str()))
            .into_iter()
            .take(TOP_N)
            .map(|(principal, requests)| PrincipalCount { principal, requests })
            .collect();

        TrafficStats {
            total_requests: total,
            error_requests: errors,
            error_rate: percent(errors, total),
            avg_duration_ms: avg,
            max_duration_ms: max,
            min_duration_ms: min,
            status_codes,
            methods,
            top_endpoints,
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
