use std::path::Path;

use crate::{
    adapters::Backend,
    core::{guard, types::cell_text},
    error::AppResult,
};

/// One-shot mode: run the query once and write the rows to a CSV file,
/// oldest row first (the same orientation as the chart).
pub async fn run(path: &Path, query: &str, backend: &Backend) -> AppResult<()> {
    let sql = guard::validate(query)?;
    let resp = backend.submit(&sql).await?;

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&resp.columns)?;
    for row in resp.rows.iter().rev() {
        let record: Vec<String> = resp
            .columns
            .iter()
            .map(|col| cell_text(row.get(col.as_str())))
            .collect();
        writer.write_record(&record)?;
    }
    writer.flush()?;

    tracing::info!(rows = resp.rows.len(), path = %path.display(), "wrote csv snapshot");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::DEFAULT_QUERY;

    fn rt() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
    }

    #[test]
    fn writes_header_and_rows_oldest_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.csv");
        let backend = Backend::demo(DEFAULT_QUERY);

        rt().block_on(run(&path, "SELECT * FROM stats LIMIT 4", &backend))
            .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "memory_usage,cpu_usage,timestamp");
        assert_eq!(lines.len(), 5);

        // Third CSV field is the timestamp; the file must read oldest to
        // newest while the wire response is newest first.
        let stamps: Vec<&str> = lines[1..]
            .iter()
            .map(|l| l.rsplit(',').next().unwrap())
            .collect();
        for pair in stamps.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn invalid_query_fails_before_any_io() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.csv");
        let backend = Backend::demo(DEFAULT_QUERY);

        let err = rt()
            .block_on(run(&path, "SELECT * FROM stats", &backend))
            .unwrap_err();
        assert_eq!(err.to_string(), "Please include a LIMIT (e.g. LIMIT 100).");
        assert!(!path.exists());
    }
}
