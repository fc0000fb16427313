pub mod demo;
pub mod export;
pub mod http;
pub mod tui;

use crate::{cli::Args, core::types::QueryResponse, error::AppResult};

use demo::DemoBackend;
use http::HttpBackend;

/// The two ways to reach a console service. Concrete dispatch keeps the
/// spawned request futures `Send` without boxing.
pub enum Backend {
    Http(HttpBackend),
    Demo(DemoBackend),
}

impl Backend {
    pub fn from_args(args: &Args) -> AppResult<Self> {
        if args.demo {
            Ok(Self::demo(&args.query))
        } else {
            Ok(Backend::Http(HttpBackend::new(
                &args.endpoint,
                args.request_timeout(),
            )?))
        }
    }

    pub fn demo(initial_sql: &str) -> Self {
        Backend::Demo(DemoBackend::new(initial_sql))
    }

    pub async fn submit(&self, sql: &str) -> AppResult<QueryResponse> {
        match self {
            Backend::Http(h) => h.submit(sql).await,
            Backend::Demo(d) => d.submit(sql),
        }
    }

    pub async fn refresh(&self) -> AppResult<QueryResponse> {
        match self {
            Backend::Http(h) => h.refresh().await,
            Backend::Demo(d) => d.refresh(),
        }
    }

    /// Source label for the header line.
    pub fn describe(&self) -> String {
        match self {
            Backend::Http(h) => h.endpoint().to_string(),
            Backend::Demo(_) => "demo (simulated)".into(),
        }
    }
}
