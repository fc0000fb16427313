use chrono::{DateTime, Local, NaiveDateTime, TimeZone};

use crate::core::types::DbRow;

/// Chart-ready view of a response, oldest row first. Series values are NaN
/// where a row has no usable number; plotting skips non-finite points but
/// the slot is kept so series and labels stay aligned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub memory: Vec<f64>,
    pub cpu: Vec<f64>,
}

impl ChartSeries {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Build both series from a response. Column roles are picked by
/// case-insensitive substring match, first match in column order; a missing
/// time-like column falls back to the first column. Rows arrive newest
/// first and are reversed here.
pub fn build(columns: &[String], rows: &[DbRow]) -> ChartSeries {
    let mem_col = find_col(columns, "memory");
    let cpu_col = find_col(columns, "cpu");
    let ts_col = find_col(columns, "time").or_else(|| columns.first());

    let mut series = ChartSeries {
        labels: Vec::with_capacity(rows.len()),
        memory: Vec::with_capacity(rows.len()),
        cpu: Vec::with_capacity(rows.len()),
    };

    for row in rows.iter().rev() {
        let ts = ts_col.and_then(|c| row.get(c.as_str()));
        series.labels.push(time_label(ts));
        series.memory.push(numeric(mem_col.and_then(|c| row.get(c.as_str()))));
        series.cpu.push(numeric(cpu_col.and_then(|c| row.get(c.as_str()))));
    }

    series
}

fn find_col<'a>(columns: &'a [String], needle: &str) -> Option<&'a String> {
    columns.iter().find(|c| c.to_lowercase().contains(needle))
}

fn numeric(value: Option<&serde_json::Value>) -> f64 {
    match value {
        Some(serde_json::Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(serde_json::Value::String(s)) => s.trim().parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

/// Format a timestamp cell as a local `HH:MM:SS` label, or fall back to the
/// raw text when the value does not parse as a date. The service encodes
/// datetimes as RFC 2822 strings; RFC 3339 and bare `YYYY-MM-DD HH:MM:SS`
/// cover other backends, integers are read as Unix epoch seconds.
fn time_label(value: Option<&serde_json::Value>) -> String {
    match value {
        Some(serde_json::Value::String(s)) => {
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return dt.with_timezone(&Local).format("%H:%M:%S").to_string();
            }
            if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
                return dt.with_timezone(&Local).format("%H:%M:%S").to_string();
            }
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
                return dt.format("%H:%M:%S").to_string();
            }
            s.clone()
        }
        Some(serde_json::Value::Number(n)) => match n.as_i64().and_then(|secs| Local.timestamp_opt(secs, 0).single()) {
            Some(dt) => dt.format("%H:%M:%S").to_string(),
            None => n.to_string(),
        },
        Some(other) => super::types::cell_text(Some(other)),
        None => String::new(),
    }
}
