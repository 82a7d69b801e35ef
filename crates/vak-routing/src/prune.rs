use vak_common::error::Result;

use crate::config::RoutingConfig;

/// Drop every cluster whose backing release was removed this run, and every
/// route that referenced one of those clusters. Entries backed by surviving
/// releases are left untouched.
pub fn prune(mut config: RoutingConfig, removed_releases: &[String]) -> Result<RoutingConfig> {
    if removed_releases.is_empty() {
        tracing::info!("no unused clusters to clear");
        return Ok(config);
    }

    let mut dropped_clusters: Vec<String> = Vec::new();
    config.clusters_mut().retain(|cluster| {
        let address = cluster.target_address().map(str::trim).unwrap_or_default();
        if removed_releases.iter().any(|r| r == address) {
            tracing::info!(cluster=%cluster.name, release=%address, "removing cluster for uninstalled release");
            dropped_clusters.push(cluster.name.clone());
            false
        } else {
            true
        }
    });

    if dropped_clusters.is_empty() {
        return Ok(config);
    }

    let routes = config.routes_mut()?;
    routes.retain(|route| match &route.route {
        Some(action) => !dropped_clusters.contains(&action.cluster),
        None => true,
    });

    Ok(config)
}
