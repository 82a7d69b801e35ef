use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Declared target state for one reconciliation run: the release base name
/// plus one entry per deployment unit.
///
/// ```yaml
/// base_name: asr-model-v2
/// config:
///   - languages: ["en"]
///     gpu:
///       count: 1
///   - languages: ["hi", "ta"]
///     cpu:
///       count: 2
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topology {
    pub base_name: String,
    pub config: Vec<TopologyEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologyEntry {
    /// Short language codes served by this unit. An entry with no codes is
    /// skipped entirely by the loader.
    #[serde(default)]
    pub languages: Vec<String>,

    /// GPU sizing hint. Takes precedence over `cpu` when both are present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpu: Option<GpuSpec>,

    /// CPU sizing hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<CpuSpec>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GpuSpec {
    pub count: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CpuSpec {
    pub count: u32,
}

impl Topology {
    /// Load the desired topology from a YAML file.
    ///
    /// An unreadable or unparseable file is fatal for the run: nothing has
    /// been mutated yet, so the safest move is to stop.
    pub fn load_from_yaml(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("unable to read topology {}: {e}", path.display())))?;
        let topology: Topology = serde_yaml::from_str(&raw)
            .map_err(|e| Error::Config(format!("unable to parse topology {}: {e}", path.display())))?;
        Ok(topology)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_topology() {
        let yaml = r#"
base_name: asr-model-v2
config:
  - languages: ["en"]
    gpu:
      count: 2
  - languages: ["hi", "ta"]
    cpu:
      count: 4
  - languages: []
"#;
        let topology: Topology = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(topology.base_name, "asr-model-v2");
        assert_eq!(topology.config.len(), 3);
        assert_eq!(topology.config[0].gpu.unwrap().count, 2);
        assert!(topology.config[0].cpu.is_none());
        assert_eq!(topology.config[1].languages, vec!["hi", "ta"]);
        assert!(topology.config[2].languages.is_empty());
    }

    #[test]
    fn test_missing_languages_field_defaults_empty() {
        let yaml = r#"
base_name: base
config:
  - cpu:
      count: 1
"#;
        let topology: Topology = serde_yaml::from_str(yaml).unwrap();
        assert!(topology.config[0].languages.is_empty());
    }
}
