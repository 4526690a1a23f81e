//! Build configuration loaded from `sitegraph.toml`

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Deserializer, Serialize};
use sitegraph_core::{ClusterClassifier, ClusterRule, Inventory, ProjectTable};
use sitegraph_federation::PeerLocation;

pub const DEFAULT_CONFIG: &str = "sitegraph.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub base_url: String,
    /// JSON inventory table for display-name lookups.
    #[serde(default)]
    pub inventory: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub auto_cluster_by_directory: bool,
    /// Malformed entries are reported and dropped.
    #[serde(deserialize_with = "lenient_rules")]
    pub clusters: Vec<ClusterRule>,
    /// Known projects. Equal-length base URL ties resolve in name order.
    pub projects: BTreeMap<String, ProjectConfig>,
    /// Peers whose published graphs are merged, in order.
    pub federate: Vec<String>,
    pub fetch_timeout_secs: u64,
    pub graph_document: String,
    /// Directory relative local peer paths are resolved against.
    pub source_dir: PathBuf,
    pub root_doc: String,
    #[serde(skip)]
    base_dir: PathBuf,
}

fn lenient_rules<'de, D>(deserializer: D) -> Result<Vec<ClusterRule>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<toml::Value>::deserialize(deserializer)?;
    let rules = raw
        .into_iter()
        .enumerate()
        .filter_map(|(position, value)| match value.try_into::<ClusterRule>() {
            Ok(rule) if rule.name.trim().is_empty() => {
                tracing::warn!("Cluster rule #{} has an empty name; skipping it", position + 1);
                None
            }
            Ok(rule) => Some(rule),
            Err(e) => {
                tracing::warn!("Skipping malformed cluster rule #{}: {}", position + 1, e);
                None
            }
        })
        .collect();
    Ok(rules)
}

impl Default for Config {
    fn default() -> Self {
        Config {
            auto_cluster_by_directory: false,
            clusters: Vec::new(),
            projects: BTreeMap::new(),
            federate: Vec::new(),
            fetch_timeout_secs: 10,
            graph_document: "graph.json".to_string(),
            source_dir: PathBuf::from("."),
            root_doc: "index".to_string(),
            base_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Load `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Config {
                base_dir,
                ..Config::default()
            });
        }

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let mut config = Self::from_toml(&text)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        config.base_dir = base_dir;
        Ok(config)
    }

    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn source_dir(&self) -> PathBuf {
        self.resolve(&self.source_dir)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn classifier(&self) -> ClusterClassifier {
        ClusterClassifier::new(&self.clusters, self.auto_cluster_by_directory)
    }

    pub fn project_table(&self) -> ProjectTable {
        let mut table = ProjectTable::new();
        for (name, project) in &self.projects {
            if project.base_url.trim().is_empty() {
                tracing::warn!("Project '{}' has no base_url; ignoring it", name);
                continue;
            }
            table.insert(name, project.base_url.as_str());
        }
        table
    }

    /// Load configured inventories. Unreadable ones are reported and skipped.
    pub fn inventories(&self) -> HashMap<String, Inventory> {
        let mut inventories = HashMap::new();
        for (name, project) in &self.projects {
            let Some(path) = project.inventory.as_deref() else {
                continue;
            };
            let path = self.resolve(path);
            match Inventory::load(&path) {
                Ok(inventory) => {
                    inventories.insert(name.clone(), inventory);
                }
                Err(e) => tracing::warn!("Skipping inventory for '{}' ({}): {}", name, path.display(), e),
            }
        }
        inventories
    }

    /// Peers to federate. Names missing from the project table are reported and skipped.
    pub fn peer_locations(&self, table: &ProjectTable) -> Vec<PeerLocation> {
        let source_dir = self.source_dir();
        self.federate
            .iter()
            .filter_map(|name| match table.get(name) {
                Some(project) => Some(PeerLocation::resolve(project, &source_dir, &self.graph_document)),
                None => {
                    tracing::warn!("Peer '{}' is not a configured project; skipping", name);
                    None
                }
            })
            .collect()
    }
}
