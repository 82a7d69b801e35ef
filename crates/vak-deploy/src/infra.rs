use vak_common::deployment::{ENVOY_INFRA_SUFFIX, PROXY_INFRA_SUFFIX};

use crate::helm::{run_logged, HelmAction, HelmCommand, HelmRunner};
use crate::inspect::{release_state, ReleaseState};

const HELM_TIMEOUT: &str = "180s";

/// Install-or-upgrade one of the fixed infra releases. These sit outside the
/// reconciliation core: never diffed, never pruned, deployed last so the
/// routing config they consume is already written.
async fn install_or_upgrade(
    runner: &dyn HelmRunner,
    release: &str,
    chart: &str,
    namespace: &str,
    sets: &[(&str, String)],
    context: &str,
) {
    let state = release_state(runner, release, namespace).await;
    let action = match state {
        ReleaseState::Absent => HelmAction::Install,
        ReleaseState::Deployed | ReleaseState::Unknown => HelmAction::Upgrade,
    };
    tracing::info!(%release, ?state, action=action.as_str(), "deploying infra release");

    let mut command = HelmCommand::new(action, release, namespace)
        .timeout(HELM_TIMEOUT)
        .chart(chart);
    for (key, value) in sets {
        command = command.set(*key, value.clone());
    }
    run_logged(runner, &command.to_args(), context).await;
}

pub async fn deploy_envoy(
    runner: &dyn HelmRunner,
    base_name: &str,
    chart: &str,
    namespace: &str,
    ingress_enabled: bool,
) {
    let release = format!("{base_name}-{ENVOY_INFRA_SUFFIX}");
    let sets = [("ingress.enabled", ingress_enabled.to_string())];
    install_or_upgrade(runner, &release, chart, namespace, &sets, "envoy").await;
}

pub async fn deploy_proxy(runner: &dyn HelmRunner, base_name: &str, chart: &str, namespace: &str) {
    let release = format!("{base_name}-{PROXY_INFRA_SUFFIX}");
    install_or_upgrade(runner, &release, chart, namespace, &[], "proxy").await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helm::testing::MockRunner;
    use crate::helm::CommandOutput;

    #[tokio::test]
    async fn test_envoy_install_when_absent() {
        let runner = MockRunner::new(|args| {
            if args.first().map(String::as_str) == Some("status") {
                CommandOutput {
                    stdout: String::new(),
                    stderr: "Error: release: not found".to_string(),
                    success: false,
                }
            } else {
                CommandOutput { stdout: "ok".into(), stderr: String::new(), success: true }
            }
        });
        deploy_envoy(&runner, "asr-model-v2", "infra/envoy", "test-v2", true).await;

        let calls = runner.recorded_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1][0], "install");
        assert!(calls[1].contains(&"asr-model-v2-envoy".to_string()));
        assert!(calls[1].contains(&"ingress.enabled=true".to_string()));
    }

    #[tokio::test]
    async fn test_proxy_upgrade_when_deployed() {
        let runner = MockRunner::new(|args| {
            if args.first().map(String::as_str) == Some("status") {
                CommandOutput {
                    stdout: "name: asr-model-v2-proxy".to_string(),
                    stderr: String::new(),
                    success: true,
                }
            } else {
                CommandOutput { stdout: "ok".into(), stderr: String::new(), success: true }
            }
        });
        deploy_proxy(&runner, "asr-model-v2", "infra/asr-proxy", "test-v2").await;

        let calls = runner.recorded_calls();
        assert_eq!(calls[1][0], "upgrade");
        assert!(calls[1].contains(&"asr-model-v2-proxy".to_string()));
        assert!(calls[1].contains(&"infra/asr-proxy".to_string()));
    }
}
