mod args;
mod deploy;
mod helm;
mod infra;
mod inspect;
mod reconcile;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use vak_common::{DeploymentUnit, Topology};
use vak_routing::{apply_unit, prune, RoutingConfig};

use crate::args::Args;
use crate::deploy::{deploy_unit, DeployContext};
use crate::helm::ProcessRunner;
use crate::reconcile::{desired_releases, list_releases, remove_unwanted_releases};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    tracing::info!(namespace=%args.namespace, "vak-deploy starting");

    // Structural input errors are fatal before anything is mutated.
    let topology = Topology::load_from_yaml(&args.app_config)?;
    let mut routing = RoutingConfig::load_from_yaml(&args.envoy_config)?;

    let runner = ProcessRunner;
    let ctx = DeployContext {
        namespace: args.namespace.clone(),
        api_changed: args.api_updated,
        image_repository: args.image_name.clone(),
        image_tag: args.image_version.clone(),
        chart_path: args.model_chart.clone(),
    };

    let existing = list_releases(&runner, &topology.base_name, &args.namespace).await;

    // Validation happens for the whole topology before any release is touched.
    let mut units = Vec::new();
    for entry in &topology.config {
        match DeploymentUnit::from_entry(&topology.base_name, entry)? {
            Some(unit) => units.push(unit),
            None => tracing::info!("skipping topology entry with no languages"),
        }
    }
    let desired = desired_releases(&units);

    for unit in &units {
        deploy_unit(&runner, unit, &ctx).await;
        routing = apply_unit(routing, unit)?;
    }

    let removed =
        remove_unwanted_releases(&runner, &desired, &existing, &args.namespace).await;
    routing = prune(routing, &removed)?;
    routing.save_to_yaml(&args.envoy_config)?;
    tracing::info!(path=%args.envoy_config, "routing config written");

    infra::deploy_envoy(
        &runner,
        &topology.base_name,
        &args.envoy_chart,
        &args.namespace,
        args.enable_ingress,
    )
    .await;
    infra::deploy_proxy(&runner, &topology.base_name, &args.proxy_chart, &args.namespace).await;

    tracing::info!("reconciliation complete");
    Ok(())
}
