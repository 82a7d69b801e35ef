use crate::helm::{status_args, HelmRunner};

const NOT_FOUND_MARKER: &str = "release: not found";

/// What `helm status` told us about a release. `Unknown` is its own state:
/// a runner failure or empty output is not evidence that the release exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseState {
    Absent,
    Deployed,
    Unknown,
}

/// Query whether a named release currently exists in the namespace.
pub async fn release_state(
    runner: &dyn HelmRunner,
    release: &str,
    namespace: &str,
) -> ReleaseState {
    let args = status_args(release, namespace);
    let output = match runner.run(&args).await {
        Ok(output) => output,
        Err(e) => {
            tracing::warn!(%release, error=%e, "helm status failed, release state unknown");
            return ReleaseState::Unknown;
        }
    };

    let combined = output.combined();
    if combined.to_lowercase().contains(NOT_FOUND_MARKER) {
        ReleaseState::Absent
    } else if combined.trim().is_empty() {
        tracing::warn!(%release, "helm status returned nothing, release state unknown");
        ReleaseState::Unknown
    } else {
        ReleaseState::Deployed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helm::testing::MockRunner;
    use crate::helm::CommandOutput;

    #[tokio::test]
    async fn test_not_found_marker_means_absent() {
        let runner = MockRunner::new(|_| CommandOutput {
            stdout: String::new(),
            stderr: "Error: release: not found\n".to_string(),
            success: false,
        });
        assert_eq!(
            release_state(&runner, "asr-model-v2-hi", "test-v2").await,
            ReleaseState::Absent
        );
    }

    #[tokio::test]
    async fn test_marker_match_is_case_insensitive() {
        let runner = MockRunner::new(|_| CommandOutput {
            stdout: "Error: RELEASE: NOT FOUND".to_string(),
            stderr: String::new(),
            success: false,
        });
        assert_eq!(
            release_state(&runner, "asr-model-v2-hi", "test-v2").await,
            ReleaseState::Absent
        );
    }

    #[tokio::test]
    async fn test_status_payload_means_deployed() {
        let runner = MockRunner::new(|_| CommandOutput {
            stdout: "name: asr-model-v2-hi\ninfo:\n  status: deployed\n".to_string(),
            stderr: String::new(),
            success: true,
        });
        assert_eq!(
            release_state(&runner, "asr-model-v2-hi", "test-v2").await,
            ReleaseState::Deployed
        );
    }

    #[tokio::test]
    async fn test_empty_output_is_unknown_not_deployed() {
        let runner = MockRunner::new(|_| CommandOutput::default());
        assert_eq!(
            release_state(&runner, "asr-model-v2-hi", "test-v2").await,
            ReleaseState::Unknown
        );
    }

    #[tokio::test]
    async fn test_queries_by_release_and_namespace() {
        let runner = MockRunner::succeeding();
        release_state(&runner, "asr-model-v2-hi", "test-v2").await;
        let calls = runner.recorded_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0][..4], ["status", "asr-model-v2-hi", "-n", "test-v2"]);
    }
}
