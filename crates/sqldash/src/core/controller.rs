use crate::core::{
    guard, series,
    series::ChartSeries,
    types::{cell_text, QueryResponse, Summary},
};

pub const KPI_PLACEHOLDER: &str = "—";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    User,
    Refresh,
}

/// A request the transport layer still has to resolve. `sql` is the POST
/// body for user runs; refresh runs carry no body (the service re-runs its
/// own last query).
#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub seq: u64,
    pub kind: RunKind,
    pub sql: Option<String>,
}

/// Outcome of one request, delivered back to the UI thread. The error arm
/// is the ready-to-display message text.
#[derive(Debug)]
pub struct Completion {
    pub seq: u64,
    pub kind: RunKind,
    pub outcome: Result<QueryResponse, String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableModel {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub row_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KpiModel {
    pub avg_memory: String,
    pub avg_cpu: String,
}

impl Default for KpiModel {
    fn default() -> Self {
        Self {
            avg_memory: KPI_PLACEHOLDER.into(),
            avg_cpu: KPI_PLACEHOLDER.into(),
        }
    }
}

/// Controller state for the dashboard. All mutation happens on the UI
/// thread; the transport layer only ever sees [`PendingRequest`] values out
/// and hands [`Completion`] values back in.
///
/// Requests carry monotonic sequence numbers and a completion is applied
/// only if it is newer than the last applied one, so an overlapping slow
/// response can never overwrite a fresher render.
#[derive(Debug)]
pub struct Dashboard {
    pub input: String,
    pub live: bool,
    pub status: String,
    pub table: TableModel,
    pub kpis: KpiModel,
    pub chart: ChartSeries,
    last_sql: String,
    next_seq: u64,
    applied_seq: u64,
}

impl Dashboard {
    pub fn new(initial_query: &str, live: bool) -> Self {
        Self {
            input: initial_query.to_string(),
            live,
            status: String::new(),
            table: TableModel::default(),
            kpis: KpiModel::default(),
            chart: ChartSeries::default(),
            last_sql: initial_query.to_string(),
            next_seq: 0,
            applied_seq: 0,
        }
    }

    pub fn last_sql(&self) -> &str {
        &self.last_sql
    }

    /// Validate the input line and issue a user run, or surface the guard
    /// message without touching anything else.
    pub fn begin_user_run(&mut self) -> Option<PendingRequest> {
        match guard::validate(&self.input) {
            Ok(sql) => {
                self.status = "Running…".into();
                let seq = self.bump_seq();
                tracing::debug!(seq, %sql, "submitting query");
                Some(PendingRequest {
                    seq,
                    kind: RunKind::User,
                    sql: Some(sql),
                })
            }
            Err(e) => {
                tracing::debug!(code = e.code(), "query rejected before submit");
                self.status = format!("Error: {e}");
                None
            }
        }
    }

    pub fn begin_refresh(&mut self) -> PendingRequest {
        self.status = "Refreshing…".into();
        let seq = self.bump_seq();
        tracing::debug!(seq, "refreshing last query");
        PendingRequest {
            seq,
            kind: RunKind::Refresh,
            sql: None,
        }
    }

    pub fn apply(&mut self, completion: Completion) {
        if completion.seq <= self.applied_seq {
            tracing::trace!(
                seq = completion.seq,
                applied = self.applied_seq,
                "discarding stale completion"
            );
            return;
        }
        self.applied_seq = completion.seq;

        match completion.outcome {
            Ok(resp) => self.apply_response(completion.kind, resp),
            Err(message) => {
                // Prior render models stay as they are.
                self.status = format!("Error: {message}");
            }
        }
    }

    pub fn toggle_live(&mut self) -> bool {
        self.live = !self.live;
        self.live
    }

    pub fn push_input(&mut self, c: char) {
        self.input.push(c);
    }

    pub fn backspace_input(&mut self) {
        self.input.pop();
    }

    pub fn clear_input(&mut self) {
        self.input.clear();
    }

    fn bump_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    fn apply_response(&mut self, kind: RunKind, resp: QueryResponse) {
        // The echo is authoritative for what actually ran, but only a user
        // run may move last_sql or rewrite the input line.
        if kind == RunKind::User {
            self.last_sql = resp.sql.clone();
            self.input = resp.sql.clone();
        }

        self.table = build_table(&resp);
        self.kpis = build_kpis(&resp.summary);
        self.chart = series::build(&resp.columns, &resp.rows);
        self.status = format!("OK ({} rows)", resp.rows.len());
        tracing::debug!(rows = resp.rows.len(), "applied response");
    }
}

fn build_table(resp: &QueryResponse) -> TableModel {
    let rows: Vec<Vec<String>> = resp
        .rows
        .iter()
        .map(|row| {
            resp.columns
                .iter()
                .map(|col| cell_text(row.get(col.as_str())))
                .collect()
        })
        .collect();
    TableModel {
        columns: resp.columns.clone(),
        row_count: rows.len(),
        rows,
    }
}

fn build_kpis(summary: &Summary) -> KpiModel {
    KpiModel {
        avg_memory: kpi_text(summary.avg_memory),
        avg_cpu: kpi_text(summary.avg_cpu),
    }
}

fn kpi_text(value: Option<f64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => KPI_PLACEHOLDER.into(),
    }
}
