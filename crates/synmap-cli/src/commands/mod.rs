//! CLI command implementations.

pub mod classify;
pub mod export;
pub mod import;
pub mod init;
pub mod matrix;
pub mod stats;

use anyhow::{Context, Result};
use synmap::prelude::*;
use tracing::debug;

use crate::config::Config;

/// Open the configured store, pointing at `synmap import` when the
/// catalog dataset is missing.
pub fn open_source(config: &Config) -> Result<DynPairSource> {
    let store_config = config.store_config();
    debug!(?store_config, "opening store");
    open_store(&store_config).with_context(|| match &config.dataset.path {
        Some(path) => format!("Failed to open dataset {}", path.display()),
        None => format!(
            "Failed to open dataset {} (run `synmap import <file>` first)",
            config.dataset_ref()
        ),
    })
}

/// Query the store and cross-tabulate one metric in display order.
pub fn cross_tabulate(
    config: &Config,
    scheme: &ClassScheme,
    metric: Metric,
    order: &[String],
) -> Result<CrossTabResult> {
    let source = open_source(config)?;
    let pairs = source.query_pairs(&config.pair_query())?;
    debug!(pairs = pairs.len(), %metric, "cross-tabulating");

    let mut crosstab = CrossTab::new(scheme);
    if !order.is_empty() {
        crosstab = crosstab.with_order(order);
    }
    let result = crosstab
        .run_metric(&pairs, metric)
        .with_context(|| format!("Cannot build the {} matrix", metric))?;
    Ok(result)
}
