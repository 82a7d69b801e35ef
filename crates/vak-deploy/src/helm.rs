use async_trait::async_trait;
use tokio::process::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelmAction {
    Install,
    Upgrade,
    Uninstall,
}

impl HelmAction {
    pub fn as_str(self) -> &'static str {
        match self {
            HelmAction::Install => "install",
            HelmAction::Upgrade => "upgrade",
            HelmAction::Uninstall => "uninstall",
        }
    }
}

/// A helm invocation built from typed fields and rendered to argv only at
/// the runner boundary, so construction is testable without running helm.
#[derive(Debug, Clone)]
pub struct HelmCommand {
    action: HelmAction,
    release: String,
    namespace: String,
    chart: Option<String>,
    timeout: Option<String>,
    sets: Vec<(String, String)>,
}

impl HelmCommand {
    pub fn new(action: HelmAction, release: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            action,
            release: release.into(),
            namespace: namespace.into(),
            chart: None,
            timeout: None,
            sets: Vec::new(),
        }
    }

    pub fn chart(mut self, chart: impl Into<String>) -> Self {
        self.chart = Some(chart.into());
        self
    }

    pub fn timeout(mut self, timeout: impl Into<String>) -> Self {
        self.timeout = Some(timeout.into());
        self
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.sets.push((key.into(), value.into()));
        self
    }

    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![self.action.as_str().to_string()];
        if let Some(timeout) = &self.timeout {
            args.push("--timeout".to_string());
            args.push(timeout.clone());
        }
        args.push(self.release.clone());
        if let Some(chart) = &self.chart {
            args.push(chart.clone());
        }
        args.push("--namespace".to_string());
        args.push(self.namespace.clone());
        for (key, value) in &self.sets {
            args.push("--set".to_string());
            args.push(format!("{key}={value}"));
        }
        args
    }
}

pub fn status_args(release: &str, namespace: &str) -> Vec<String> {
    ["status", release, "-n", namespace, "--output", "yaml"]
        .map(str::to_string)
        .to_vec()
}

pub fn list_args(base_name: &str, namespace: &str) -> Vec<String> {
    vec![
        "list".to_string(),
        "-f".to_string(),
        format!("^{base_name}-(.*)"),
        "-n".to_string(),
        namespace.to_string(),
        "-o".to_string(),
        "json".to_string(),
    ]
}

#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
}

impl CommandOutput {
    /// stdout and stderr together; status checks look for marker substrings
    /// anywhere in what helm printed.
    pub fn combined(&self) -> String {
        format!("{}{}", self.stdout, self.stderr)
    }
}

/// Seam for executing helm. Tests substitute a recording mock.
#[async_trait]
pub trait HelmRunner: Send + Sync {
    async fn run(&self, args: &[String]) -> std::io::Result<CommandOutput>;
}

/// Runs the real helm binary via tokio's process API.
pub struct ProcessRunner;

#[async_trait]
impl HelmRunner for ProcessRunner {
    async fn run(&self, args: &[String]) -> std::io::Result<CommandOutput> {
        let output = Command::new("helm").args(args).output().await?;
        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            success: output.status.success(),
        })
    }
}

/// Run a helm command, surface its output in the log, and swallow failures.
/// Executor errors are observed, never propagated: the run continues even
/// when helm exits non-zero or cannot be spawned.
pub async fn run_logged(
    runner: &dyn HelmRunner,
    args: &[String],
    context: &str,
) -> Option<CommandOutput> {
    tracing::debug!(%context, command=%args.join(" "), "running helm");
    let output = match runner.run(args).await {
        Ok(output) => output,
        Err(e) => {
            tracing::error!(%context, error=%e, "failed to invoke helm");
            return None;
        }
    };
    if !output.stderr.is_empty() {
        tracing::warn!(%context, stderr=%output.stderr.trim_end(), "helm reported errors");
    }
    if !output.stdout.is_empty() {
        tracing::info!(%context, stdout=%output.stdout.trim_end(), "helm output");
    }
    Some(output)
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    type Responder = Box<dyn Fn(&[String]) -> CommandOutput + Send + Sync>;

    /// Records every argv it receives and answers via a canned responder.
    pub struct MockRunner {
        pub calls: Mutex<Vec<Vec<String>>>,
        responder: Responder,
    }

    impl MockRunner {
        pub fn new(responder: impl Fn(&[String]) -> CommandOutput + Send + Sync + 'static) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                responder: Box::new(responder),
            }
        }

        pub fn succeeding() -> Self {
            Self::new(|_| CommandOutput {
                stdout: "ok".to_string(),
                stderr: String::new(),
                success: true,
            })
        }

        pub fn recorded_calls(&self) -> Vec<Vec<String>> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HelmRunner for MockRunner {
        async fn run(&self, args: &[String]) -> std::io::Result<CommandOutput> {
            self.calls.lock().unwrap().push(args.to_vec());
            Ok((self.responder)(args))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_command_rendering() {
        let args = HelmCommand::new(HelmAction::Install, "asr-model-v2-hi", "test-v2")
            .timeout("180s")
            .chart("infra/asr-model-v2")
            .set("env.languages", r#"["hi"]"#)
            .set("image.pullPolicy", "IfNotPresent")
            .to_args();
        assert_eq!(
            args,
            vec![
                "install",
                "--timeout",
                "180s",
                "asr-model-v2-hi",
                "infra/asr-model-v2",
                "--namespace",
                "test-v2",
                "--set",
                r#"env.languages=["hi"]"#,
                "--set",
                "image.pullPolicy=IfNotPresent",
            ]
        );
    }

    #[test]
    fn test_uninstall_has_no_chart_or_sets() {
        let args = HelmCommand::new(HelmAction::Uninstall, "asr-model-v2-hi", "test-v2").to_args();
        assert_eq!(args, vec!["uninstall", "asr-model-v2-hi", "--namespace", "test-v2"]);
    }

    #[test]
    fn test_status_and_list_args() {
        assert_eq!(
            status_args("asr-model-v2-hi", "test-v2"),
            vec!["status", "asr-model-v2-hi", "-n", "test-v2", "--output", "yaml"]
        );
        assert_eq!(
            list_args("asr-model-v2", "test-v2"),
            vec!["list", "-f", "^asr-model-v2-(.*)", "-n", "test-v2", "-o", "json"]
        );
    }
}
