//! Static path enumeration.
//!
//! Lists the buckets that get a page rendered ahead of time: every bucket the
//! experiment defines, plus the fallback bucket.

use crate::config::ExperimentConfig;
use crate::decision::{DecisionGateway, DecisionResult};

/// Bucket names to pre-render, in order, without empties or duplicates.
///
/// A failing collaborator leaves only the fallback bucket.
pub async fn static_paths(gateway: &DecisionGateway, experiment: &ExperimentConfig) -> Vec<String> {
    let listed = match gateway.experiment_buckets(experiment).await {
        Ok(buckets) => buckets,
        Err(e) => {
            tracing::warn!(error = %e, experiment = %experiment.name, "Could not list experiment buckets");
            Vec::new()
        }
    };
    merge_paths(listed, &experiment.fallback_bucket)
}

/// Like `static_paths`, but surfaces the collaborator error.
pub async fn try_static_paths(gateway: &DecisionGateway, experiment: &ExperimentConfig) -> DecisionResult<Vec<String>> {
    let listed = gateway.experiment_buckets(experiment).await?;
    Ok(merge_paths(listed, &experiment.fallback_bucket))
}

fn merge_paths(listed: Vec<String>, fallback: &str) -> Vec<String> {
    let mut paths: Vec<String> = Vec::with_capacity(listed.len() + 1);
    for bucket in listed.into_iter().chain(std::iter::once(fallback.to_string())) {
        if !bucket.is_empty() && !paths.contains(&bucket) {
            paths.push(bucket);
        }
    }
    paths
}
