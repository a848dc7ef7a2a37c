/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 4/8/26
******************************************************************************/

//! Replays FIX logs against an Orchestra reference document and prints the
//! updated document plus run statistics.
//!
//! Usage:
//! ```bash
//! cargo run --example analyze_logs -- orchestra.xml session1.log [session2.log ...]
//! ```

use anyhow::{bail, Context, Result};
use orchfix_engine::Analyzer;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let Some(reference) = args.next() else {
        bail!("usage: analyze_logs <orchestra.xml> <log> [log ...]");
    };
    let logs: Vec<String> = args.collect();
    if logs.is_empty() {
        bail!("at least one log file is required");
    }

    let mut builder = Analyzer::builder()
        .with_reference_file(&reference)
        .append_only(std::env::var("ORCHFIX_APPEND_ONLY").is_ok());
    for log in &logs {
        builder = builder.add_log(log);
    }

    let report = builder.build().run().await.context("analyzer run failed")?;

    info!("run statistics:\n{}", report.stats);
    if !report.warnings.is_empty() {
        info!("warnings:\n{}", report.warnings);
    }

    let output = format!("{reference}.updated.xml");
    tokio::fs::write(&output, report.document.as_bytes())
        .await
        .with_context(|| format!("writing {output}"))?;
    info!("updated document written to {output}");
    Ok(())
}
