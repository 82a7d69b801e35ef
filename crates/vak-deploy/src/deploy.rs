use vak_common::{DeploymentUnit, ResourceProfile};

use crate::helm::{run_logged, HelmAction, HelmCommand, HelmRunner};
use crate::inspect::{release_state, ReleaseState};

const HELM_TIMEOUT: &str = "180s";
const GPU_LIMIT_KEY: &str = r"resources.limits.nvidia\.com/gpu";
const CPU_REQUEST_KEY: &str = "resources.requests.cpu";

#[derive(Debug, Clone)]
pub struct DeployContext {
    pub namespace: String,
    pub api_changed: bool,
    pub image_repository: String,
    pub image_tag: String,
    pub chart_path: String,
}

/// How a unit gets to its desired state. `Replace` is the destructive path
/// for an API-incompatible image: uninstall, then install from clean state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployPlan {
    Install,
    Upgrade,
    Replace,
}

pub fn plan_for(state: ReleaseState, api_changed: bool) -> DeployPlan {
    match (state, api_changed) {
        (ReleaseState::Absent, _) => DeployPlan::Install,
        (ReleaseState::Deployed, true) => DeployPlan::Replace,
        (ReleaseState::Deployed, false) => DeployPlan::Upgrade,
        // No retry loop in a single-shot run: assume the release is there
        // and upgrade, which is the non-destructive choice.
        (ReleaseState::Unknown, _) => DeployPlan::Upgrade,
    }
}

/// Render the language list as the JSON array helm receives in
/// `env.languages`. Commas are escaped so helm does not split the value.
fn languages_value(codes: &[String]) -> String {
    let json = serde_json::to_string(codes).unwrap_or_else(|_| "[]".to_string());
    json.replace(',', r"\,")
}

/// Deploy one unit: install, upgrade, or destructively replace it, with
/// resource and image overrides derived from the unit's profile. Helm
/// failures are logged and the run continues.
pub async fn deploy_unit(runner: &dyn HelmRunner, unit: &DeploymentUnit, ctx: &DeployContext) {
    let context = format!("language: {}", unit.language_codes().join(","));
    let release = unit.release_name();

    let state = release_state(runner, release, &ctx.namespace).await;
    if state == ReleaseState::Unknown {
        tracing::warn!(%release, "release state unknown, proceeding as upgrade");
    }
    tracing::info!(%release, ?state, "deploying unit");

    let action = match plan_for(state, ctx.api_changed) {
        DeployPlan::Install => HelmAction::Install,
        DeployPlan::Upgrade => HelmAction::Upgrade,
        DeployPlan::Replace => {
            tracing::info!(%release, "api changed, uninstalling before reinstall");
            let uninstall = HelmCommand::new(HelmAction::Uninstall, release, &ctx.namespace);
            run_logged(runner, &uninstall.to_args(), &context).await;
            tracing::info!(%release, "installing replacement");
            HelmAction::Install
        }
    };

    let pull_policy = if ctx.api_changed { "Always" } else { "IfNotPresent" };

    let mut command = HelmCommand::new(action, release, &ctx.namespace)
        .timeout(HELM_TIMEOUT)
        .chart(&ctx.chart_path)
        .set("env.languages", languages_value(unit.language_codes()))
        .set("image.pullPolicy", pull_policy)
        .set("image.repository", &ctx.image_repository)
        .set("image.tag", &ctx.image_tag);

    command = match unit.resource_profile() {
        ResourceProfile::Gpu { count } => command
            .set(GPU_LIMIT_KEY, count.to_string())
            .set("env.gpu", "true"),
        ResourceProfile::Cpu { count } => command
            .set(CPU_REQUEST_KEY, count.to_string())
            .set("env.gpu", "false"),
    };

    run_logged(runner, &command.to_args(), &context).await;
}
