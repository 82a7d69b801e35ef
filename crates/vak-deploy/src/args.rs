use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "vak-deploy")]
#[command(about = "Reconcile per-language ASR model releases and the shared Envoy routing config")]
pub struct Args {
    /// Namespace to reconcile against
    #[arg(long, default_value = "test-v2")]
    pub namespace: String,

    /// Deploy the envoy gateway with ingress enabled
    #[arg(long, default_value_t = false)]
    pub enable_ingress: bool,

    /// Model API image name
    #[arg(long, required = true)]
    pub image_name: String,

    /// Model API image version
    #[arg(long, required = true)]
    pub image_version: String,

    /// The model API contract changed: force re-pull and destructive replace
    #[arg(long, default_value_t = false)]
    pub api_updated: bool,

    /// Path of the desired topology file
    #[arg(long, default_value = "app_config.yaml")]
    pub app_config: String,

    /// Path of the Envoy routing config that gets edited in place
    #[arg(long, default_value = "infra/envoy/config.yaml")]
    pub envoy_config: String,

    /// Helm chart for per-language model releases
    #[arg(long, default_value = "infra/asr-model-v2")]
    pub model_chart: String,

    /// Helm chart for the envoy gateway release
    #[arg(long, default_value = "infra/envoy")]
    pub envoy_chart: String,

    /// Helm chart for the proxy release
    #[arg(long, default_value = "infra/asr-proxy")]
    pub proxy_chart: String,
}
