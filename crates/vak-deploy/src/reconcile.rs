use serde::Deserialize;

use vak_common::deployment::infra_release_names;
use vak_common::DeploymentUnit;

use crate::helm::{list_args, run_logged, HelmAction, HelmCommand, HelmRunner};

/// The release names the topology wants live: one per deployment unit.
pub fn desired_releases(units: &[DeploymentUnit]) -> Vec<String> {
    units.iter().map(|u| u.release_name().to_string()).collect()
}

#[derive(Debug, Deserialize)]
struct ReleaseEntry {
    name: String,
}

/// List the live releases under `base_name` in the namespace, excluding the
/// two infra releases (envoy gateway, proxy) which are managed separately.
///
/// A failed or unparseable listing is logged and yields an empty set, which
/// makes the stale-release pass a no-op for this run — nothing gets
/// uninstalled on bad data.
pub async fn list_releases(
    runner: &dyn HelmRunner,
    base_name: &str,
    namespace: &str,
) -> Vec<String> {
    let args = list_args(base_name, namespace);
    let output = match runner.run(&args).await {
        Ok(output) => output,
        Err(e) => {
            tracing::warn!(error=%e, "helm list failed, treating existing release set as empty");
            return Vec::new();
        }
    };

    let entries: Vec<ReleaseEntry> = match serde_json::from_str(&output.stdout) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(error=%e, "unable to parse helm list output, treating existing release set as empty");
            return Vec::new();
        }
    };

    let infra = infra_release_names(base_name);
    entries
        .into_iter()
        .map(|entry| entry.name)
        .filter(|name| !infra.contains(name))
        .collect()
}

/// Uninstall every existing release that is not in the desired set, in the
/// order `existing` lists them, and return the names that were removed.
///
/// Removal is best-effort: a failed uninstall is logged but the release is
/// still reported as removed so its routing entries get purged. Creation of
/// missing releases is not this function's job — `deploy_unit` handles it.
pub async fn remove_unwanted_releases(
    runner: &dyn HelmRunner,
    desired: &[String],
    existing: &[String],
    namespace: &str,
) -> Vec<String> {
    let mut removed = Vec::new();
    for release in existing {
        if desired.contains(release) {
            continue;
        }
        tracing::info!(%release, "uninstalling release no longer in topology");
        let command = HelmCommand::new(HelmAction::Uninstall, release, namespace);
        let context = format!("remove: {release}");
        match run_logged(runner, &command.to_args(), &context).await {
            Some(output) if output.success => {}
            _ => {
                tracing::warn!(%release, "uninstall did not succeed, still purging its routing entries");
            }
        }
        removed.push(release.clone());
    }
    removed
}
