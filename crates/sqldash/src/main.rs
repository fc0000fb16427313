mod adapters;
mod cli;
mod core;
mod error;
mod logging;

use clap::Parser;

use crate::{cli::Args, error::AppResult};

fn main() -> AppResult<()> {
    let args = Args::parse();
    logging::init(&args.log_level, args.log_file.as_deref())?;

    if let Some(path) = args.export.clone() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| error::AppError::Internal(e.to_string()))?;
        let backend = adapters::Backend::from_args(&args)?;
        rt.block_on(adapters::export::run(&path, &args.query, &backend))
    } else {
        adapters::tui::run(args)
    }
}
