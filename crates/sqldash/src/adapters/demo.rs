use std::{
    collections::VecDeque,
    sync::{Mutex, MutexGuard},
};

use chrono::{Local, NaiveDateTime};

use crate::{
    core::{
        guard,
        types::{DbRow, QueryResponse, Summary},
    },
    error::{AppError, AppResult},
};

const STEP_SECS: i64 = 2;
const HISTORY_LEN: usize = 150;
const SAMPLE_CAP: usize = 1000;

/// Offline stand-in for the console service. Serves a seeded random-walk
/// `stats` feed with the service's own semantics: it remembers the last
/// submitted SQL for body-less refreshes, validates every statement the way
/// the server does, honors LIMIT, and returns rows newest first.
pub struct DemoBackend {
    state: Mutex<DemoState>,
}

impl DemoBackend {
    pub fn new(initial_sql: &str) -> Self {
        Self {
            state: Mutex::new(DemoState::new(initial_sql)),
        }
    }

    pub fn submit(&self, sql: &str) -> AppResult<QueryResponse> {
        let raw = sql.trim().to_string();
        if raw.is_empty() {
            return Err(AppError::Backend("Missing 'sql' in JSON body.".into()));
        }
        let mut state = self.lock()?;
        // The service records the posted text before validating it, so a bad
        // statement poisons refresh until the next good submit. Kept as is.
        state.last_sql = raw.clone();
        state.respond(raw)
    }

    pub fn refresh(&self) -> AppResult<QueryResponse> {
        let mut state = self.lock()?;
        let sql = state.last_sql.clone();
        state.respond(sql)
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, DemoState>> {
        self.state
            .lock()
            .map_err(|_| AppError::Internal("poisoned lock".into()))
    }
}

struct DemoState {
    rng: fastrand::Rng,
    samples: VecDeque<Sample>,
    last_sql: String,
    cpu: f64,
    mem: f64,
    clock: NaiveDateTime,
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    at: NaiveDateTime,
    cpu: f64,
    mem: f64,
}

impl DemoState {
    fn new(initial_sql: &str) -> Self {
        let backfill = chrono::Duration::seconds(STEP_SECS * HISTORY_LEN as i64);
        let mut state = Self {
            rng: fastrand::Rng::with_seed(0x5eed_da5b),
            samples: VecDeque::with_capacity(HISTORY_LEN + 1),
            last_sql: initial_sql.trim().to_string(),
            cpu: 25.0,
            mem: 55.0,
            clock: Local::now().naive_local() - backfill,
        };
        for _ in 0..HISTORY_LEN {
            state.step();
        }
        state
    }

    fn respond(&mut self, echo_sql: String) -> AppResult<QueryResponse> {
        let cleaned = guard::validate(&echo_sql).map_err(|e| AppError::Backend(e.to_string()))?;
        let limit = guard::limit_of(&cleaned).unwrap_or(100) as usize;

        self.step();

        let rows: Vec<DbRow> = self
            .samples
            .iter()
            .rev()
            .take(limit)
            .map(|s| {
                let mut row = DbRow::with_capacity(3);
                row.insert("memory_usage".into(), serde_json::Value::from(s.mem));
                row.insert("cpu_usage".into(), serde_json::Value::from(s.cpu));
                row.insert(
                    "timestamp".into(),
                    serde_json::Value::from(s.at.format("%Y-%m-%d %H:%M:%S").to_string()),
                );
                row
            })
            .collect();

        Ok(QueryResponse {
            sql: echo_sql,
            columns: vec![
                "memory_usage".into(),
                "cpu_usage".into(),
                "timestamp".into(),
            ],
            summary: summarize(&rows),
            rows,
        })
    }

    fn step(&mut self) {
        self.cpu = round1((self.cpu + self.rng.f64() * 8.0 - 4.0).clamp(2.0, 95.0));
        self.mem = round1((self.mem + self.rng.f64() * 3.0 - 1.5).clamp(10.0, 90.0));
        self.clock = self.clock + chrono::Duration::seconds(STEP_SECS);
        self.samples.push_back(Sample {
            at: self.clock,
            cpu: self.cpu,
            mem: self.mem,
        });
        if self.samples.len() > SAMPLE_CAP {
            self.samples.pop_front();
        }
    }
}

/// Same KPI rule as the service: mean of the numeric values per column over
/// the returned rows, rounded to two decimals; all-null when empty.
fn summarize(rows: &[DbRow]) -> Summary {
    if rows.is_empty() {
        return Summary {
            avg_memory: None,
            avg_cpu: None,
            count: Some(0),
        };
    }
    Summary {
        avg_memory: column_mean(rows, "memory_usage"),
        avg_cpu: column_mean(rows, "cpu_usage"),
        count: Some(rows.len() as u64),
    }
}

fn column_mean(rows: &[DbRow], col: &str) -> Option<f64> {
    let values: Vec<f64> = rows
        .iter()
        .filter_map(|r| r.get(col).and_then(serde_json::Value::as_f64))
        .collect();
    if values.is_empty() {
        return None;
    }
    Some(round2(values.iter().sum::<f64>() / values.len() as f64))
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::DEFAULT_QUERY;

    #[test]
    fn refresh_reruns_last_submitted_sql() {
        let demo = DemoBackend::new(DEFAULT_QUERY);
        let posted = "SELECT * FROM stats LIMIT 5";
        let first = demo.submit(posted).unwrap();
        assert_eq!(first.sql, posted);
        assert_eq!(first.rows.len(), 5);

        let refreshed = demo.refresh().unwrap();
        assert_eq!(refreshed.sql, posted);
        assert_eq!(refreshed.rows.len(), 5);
    }

    #[test]
    fn rows_come_newest_first_up_to_limit() {
        let demo = DemoBackend::new(DEFAULT_QUERY);
        let resp = demo.submit("SELECT * FROM stats LIMIT 10").unwrap();
        assert_eq!(resp.rows.len(), 10);
        let stamps: Vec<&str> = resp
            .rows
            .iter()
            .map(|r| r["timestamp"].as_str().unwrap())
            .collect();
        // The timestamp format sorts lexicographically.
        for pair in stamps.windows(2) {
            assert!(pair[0] > pair[1], "{} should be newer than {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn summary_is_rounded_mean_of_returned_rows() {
        let demo = DemoBackend::new(DEFAULT_QUERY);
        let resp = demo.submit("SELECT * FROM stats LIMIT 20").unwrap();
        let mean: f64 = resp
            .rows
            .iter()
            .map(|r| r["cpu_usage"].as_f64().unwrap())
            .sum::<f64>()
            / resp.rows.len() as f64;
        assert_eq!(resp.summary.avg_cpu, Some(round2(mean)));
        assert_eq!(resp.summary.count, Some(20));
    }

    #[test]
    fn rejected_sql_poisons_refresh_like_the_service() {
        let demo = DemoBackend::new(DEFAULT_QUERY);
        let err = demo.submit("DELETE FROM stats LIMIT 1").unwrap_err();
        assert_eq!(err.to_string(), "Only SELECT statements are allowed.");

        let err = demo.refresh().unwrap_err();
        assert_eq!(err.to_string(), "Only SELECT statements are allowed.");
    }

    #[test]
    fn walk_values_are_deterministic() {
        let a = DemoBackend::new(DEFAULT_QUERY);
        let b = DemoBackend::new(DEFAULT_QUERY);
        let ra = a.submit("SELECT * FROM stats LIMIT 30").unwrap();
        let rb = b.submit("SELECT * FROM stats LIMIT 30").unwrap();
        let cpus = |r: &QueryResponse| -> Vec<f64> {
            r.rows.iter().map(|row| row["cpu_usage"].as_f64().unwrap()).collect()
        };
        assert_eq!(cpus(&ra), cpus(&rb));
    }
}
