//! Sample traffic for fresh deployments (operator dashboards need something to draw).

use std::collections::BTreeMap;

use chrono::{Duration, Utc};

use super::traffic::{TrafficLedger, TrafficLogEntry, ANONYMOUS};

const PRINCIPALS: [&str; 4] = ["player@example.com", "admin@example.com", "test@example.com", ANONYMOUS];

// (method, path, endpoint, status)
const ROUTES: [(&str, &str, &str, u16); 10] = [
    ("GET", "/", "/", 200),
    ("GET", "/gamelist", "/gamelist", 200),
    ("GET", "/admin", "/admin", 200),
    ("GET", "/api/admin/traffic/stats", "/api/admin/traffic/stats", 200),
    ("GET", "/api/admin/traffic/logs", "/api/admin/traffic/logs", 200),
    ("POST", "/login", "/login", 200),
    ("GET", "/profile", "/profile", 200),
    ("GET", "/premium", "/premium", 200),
    ("GET", "/nonexistent", "unknown", 404),
    ("GET", "/api/games/free", "/api/games/free", 500),
];

/// Insert `count` deterministic entries spread over the last two hours.
/// Does nothing when the ledger already holds traffic. Returns entries added.
pub fn seed_traffic(ledger: &TrafficLedger, count: usize) -> usize {
    if !ledger.is_empty() {
        return 0;
    }

    let base = Utc::now() - Duration::hours(2);
    for i in 0..count {
        let (method, path, endpoint, status) = ROUTES[(i * 7) % ROUTES.len()];
        let principal = PRINCIPALS[(i * 3) % PRINCIPALS.len()];

        let jitter = ((i * 37) % 100) as f64;
        let duration_ms = if status >= 500 {
            800.0 + jitter * 12.0
        } else if path.starts_with("/api") {
            50.0 + jitter * 2.5
        } else {
            100.0 + jitter * 7.0
        };

        let timestamp = base + Duration::minutes(((i * 120) / count.max(1)) as i64);
        ledger.record(TrafficLogEntry {
            id: ledger.next_id(&timestamp),
            timestamp,
            method: method.to_string(),
            path: path.to_string(),
            endpoint: endpoint.to_string(),
            status_code: status,
            duration_ms,
            ip_address: format!("192.168.1.{}", 1 + (i * 13) % 254),
            user_agent: "Mozilla/5.0 (X11; Linux x86_64)".to_string(),
            principal: principal.to_string(),
            content_length: 1024 + ((i * 997) % 49_000) as u64,
            referrer: (i % 3 == 0).then(|| "https://example.org".to_string()),
            args: BTreeMap::new(),
        });
    }

    tracing::info!(count, "seeded demo traffic");
    count
}
