use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::topology::TopologyEntry;

/// Releases that back the routing layer itself. They live in the same
/// namespace under the same base name but are never part of the desired set
/// and never candidates for removal.
pub const ENVOY_INFRA_SUFFIX: &str = "envoy";
pub const PROXY_INFRA_SUFFIX: &str = "proxy";

/// Resource sizing for one deployment unit. GPU wins when a topology entry
/// carries both hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceProfile {
    Gpu { count: u32 },
    Cpu { count: u32 },
}

/// One releasable unit: a single language, or a bundle of languages sharing
/// one helm release.
///
/// The release name is derived from the base name and the joined codes, with
/// underscores normalized to hyphens so it is a valid release identifier.
/// The raw codes (underscores intact) are a separate namespace: they are
/// what gets embedded in `env.languages` and in routing match values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentUnit {
    language_codes: Vec<String>,
    release_name: String,
    resource_profile: ResourceProfile,
}

impl DeploymentUnit {
    pub fn new(
        base_name: &str,
        language_codes: Vec<String>,
        resource_profile: ResourceProfile,
    ) -> Result<Self> {
        if language_codes.is_empty() {
            return Err(Error::Validation(
                "no language codes present; add codes or remove the entry from the topology"
                    .to_string(),
            ));
        }
        let joined = language_codes.join("-");
        let release_name = format!("{base_name}-{joined}").replace('_', "-");
        tracing::debug!(release=%release_name, "derived release name");
        Ok(Self {
            language_codes,
            release_name,
            resource_profile,
        })
    }

    /// Build a unit from a topology entry. Returns `None` for entries with
    /// no languages, which are skipped with no side effect.
    pub fn from_entry(base_name: &str, entry: &TopologyEntry) -> Result<Option<Self>> {
        if entry.languages.is_empty() {
            return Ok(None);
        }
        let profile = match (entry.gpu, entry.cpu) {
            (Some(gpu), _) => ResourceProfile::Gpu { count: gpu.count },
            (None, Some(cpu)) => ResourceProfile::Cpu { count: cpu.count },
            (None, None) => ResourceProfile::Cpu { count: 0 },
        };
        Self::new(base_name, entry.languages.clone(), profile).map(Some)
    }

    pub fn language_codes(&self) -> &[String] {
        &self.language_codes
    }

    /// The code used to derive the cluster name in the routing config. A
    /// multi-language unit shares one cluster, keyed by its first code.
    pub fn representative_code(&self) -> &str {
        &self.language_codes[0]
    }

    pub fn release_name(&self) -> &str {
        &self.release_name
    }

    pub fn resource_profile(&self) -> ResourceProfile {
        self.resource_profile
    }
}

/// Release names for the two fixed infra deployments under `base_name`.
pub fn infra_release_names(base_name: &str) -> [String; 2] {
    [
        format!("{base_name}-{ENVOY_INFRA_SUFFIX}"),
        format!("{base_name}-{PROXY_INFRA_SUFFIX}"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{CpuSpec, GpuSpec};

    fn cpu(count: u32) -> ResourceProfile {
        ResourceProfile::Cpu { count }
    }

    #[test]
    fn test_release_name_single_language() {
        let unit = DeploymentUnit::new("asr-model-v2", vec!["hi".into()], cpu(1)).unwrap();
        assert_eq!(unit.release_name(), "asr-model-v2-hi");
        assert_eq!(unit.representative_code(), "hi");
    }

    #[test]
    fn test_release_name_multi_language() {
        let unit =
            DeploymentUnit::new("asr-model-v2", vec!["en".into(), "hi".into(), "ta".into()], cpu(1))
                .unwrap();
        assert_eq!(unit.release_name(), "asr-model-v2-en-hi-ta");
        assert_eq!(unit.representative_code(), "en");
    }

    #[test]
    fn test_underscores_normalized_in_release_name_only() {
        let unit = DeploymentUnit::new("base", vec!["zh_tw".into()], cpu(1)).unwrap();
        // release identifier is hyphenated
        assert_eq!(unit.release_name(), "base-zh-tw");
        // the language value itself keeps its underscore
        assert_eq!(unit.language_codes(), ["zh_tw"]);
        assert_eq!(unit.representative_code(), "zh_tw");
    }

    #[test]
    fn test_empty_codes_rejected() {
        let err = DeploymentUnit::new("base", vec![], cpu(1)).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_from_entry_gpu_precedence() {
        let entry = TopologyEntry {
            languages: vec!["en".into()],
            gpu: Some(GpuSpec { count: 2 }),
            cpu: Some(CpuSpec { count: 8 }),
        };
        let unit = DeploymentUnit::from_entry("base", &entry).unwrap().unwrap();
        assert_eq!(unit.resource_profile(), ResourceProfile::Gpu { count: 2 });
    }

    #[test]
    fn test_from_entry_empty_languages_skipped() {
        let entry = TopologyEntry {
            languages: vec![],
            gpu: None,
            cpu: Some(CpuSpec { count: 1 }),
        };
        assert!(DeploymentUnit::from_entry("base", &entry).unwrap().is_none());
    }

    #[test]
    fn test_infra_release_names() {
        let [envoy, proxy] = infra_release_names("asr-model-v2");
        assert_eq!(envoy, "asr-model-v2-envoy");
        assert_eq!(proxy, "asr-model-v2-proxy");
    }
}
