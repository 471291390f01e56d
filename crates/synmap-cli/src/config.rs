//! Configuration management for the synmap CLI.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use synmap::prelude::*;

const CONFIG_FILE: &str = "synmap.toml";

/// synmap project configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Display order of the classes; empty means definition order.
    #[serde(default = "default_order")]
    pub order: Vec<String>,
    #[serde(default)]
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub heatmap: HeatmapConfig,
    #[serde(default = "default_classes")]
    pub classes: Vec<NamedClass>,

    /// Directory relative paths are resolved against.
    #[serde(skip)]
    base_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    #[serde(default = "default_catalog_dir")]
    pub catalog_dir: PathBuf,
    #[serde(default = "default_dataset_name")]
    pub name: String,
    #[serde(default = "default_dataset_version")]
    pub version: String,
    /// JSON or SQLite file read instead of the catalog.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Projects to include; empty means all.
    #[serde(default)]
    pub projects: Vec<String>,
    #[serde(default = "default_has_synapse", skip_serializing_if = "Option::is_none")]
    pub has_synapse: Option<bool>,
    /// Let the store skip pairs without dynamics. They are then absent from
    /// the filter report instead of counted as missing a metric.
    #[serde(default)]
    pub require_dynamics: bool,
    #[serde(default)]
    pub metric: Metric,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeatmapConfig {
    #[serde(default = "default_vmin")]
    pub vmin: f64,
    #[serde(default = "default_vmax")]
    pub vmax: f64,
    #[serde(default = "default_colormap")]
    pub colormap: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// A `[[classes]]` entry: a name plus its attribute criteria.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedClass {
    pub name: String,
    #[serde(flatten)]
    pub definition: ClassDefinition,
}

// Default value functions
fn default_order() -> Vec<String> {
    ["ex", "pvalb", "sst", "vip"].map(String::from).to_vec()
}
fn default_catalog_dir() -> PathBuf { PathBuf::from(".synmap/datasets") }
fn default_dataset_name() -> String { "synphys".to_string() }
fn default_dataset_version() -> String { "small".to_string() }
fn default_has_synapse() -> Option<bool> { Some(true) }
fn default_vmin() -> f64 { -0.5 }
fn default_vmax() -> f64 { 0.5 }
fn default_colormap() -> String { "bwr".to_string() }

fn default_classes() -> Vec<NamedClass> {
    let mut classes = vec![NamedClass {
        name: "ex".to_string(),
        definition: ClassDefinition::by_category(CellCategory::Excitatory),
    }];
    for cre in ["pvalb", "sst", "vip"] {
        classes.push(NamedClass {
            name: cre.to_string(),
            definition: ClassDefinition::by_cre_type([cre]),
        });
    }
    classes
}

impl Default for Config {
    fn default() -> Self {
        Self {
            order: default_order(),
            dataset: DatasetConfig::default(),
            query: QueryConfig::default(),
            heatmap: HeatmapConfig::default(),
            classes: default_classes(),
            base_dir: PathBuf::from("."),
        }
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            catalog_dir: default_catalog_dir(),
            name: default_dataset_name(),
            version: default_dataset_version(),
            path: None,
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            projects: Vec::new(),
            has_synapse: default_has_synapse(),
            require_dynamics: false,
            metric: Metric::default(),
        }
    }
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            vmin: default_vmin(),
            vmax: default_vmax(),
            colormap: default_colormap(),
            title: None,
        }
    }
}

impl Config {
    /// Load config from an explicit path, or from synmap.toml in the
    /// current or parent directories, falling back to defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) if !path.exists() => bail!("Config not found: {}", path.display()),
            Some(path) => Some(path.to_path_buf()),
            None => find_config_file(),
        };
        match path {
            Some(path) => Self::read(&path),
            None => Ok(Config {
                base_dir: std::env::current_dir()?,
                ..Config::default()
            }),
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        config.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(config)
    }

    /// Save config to the specified path.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = Self::to_toml(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn catalog(&self) -> DatasetCatalog {
        DatasetCatalog::new(self.resolve(&self.dataset.catalog_dir))
    }

    pub fn dataset_ref(&self) -> DatasetRef {
        DatasetRef::new(&self.dataset.name, &self.dataset.version)
    }

    /// Where pair records come from: an explicit file, or the catalog entry.
    pub fn store_config(&self) -> StoreConfig {
        match &self.dataset.path {
            Some(path) => StoreConfig::from_path(self.resolve(path)),
            None => StoreConfig::catalog(
                self.resolve(&self.dataset.catalog_dir),
                self.dataset_ref(),
            ),
        }
    }

    pub fn pair_query(&self) -> PairQuery {
        let mut query = PairQuery::new();
        for project in &self.query.projects {
            query = query.project(project.clone());
        }
        if let Some(has_synapse) = self.query.has_synapse {
            query = query.synapse(has_synapse);
        }
        if self.query.require_dynamics {
            query = query.with_dynamics();
        }
        query
    }

    pub fn scheme(&self) -> Result<ClassScheme> {
        let scheme = ClassScheme::from_definitions(
            self.classes
                .iter()
                .map(|c| (c.name.clone(), c.definition.clone())),
        )
        .context("Invalid [[classes]] in config")?;
        Ok(scheme)
    }

    /// Metric from the command line, else from config.
    pub fn metric(&self, requested: Option<&str>) -> Result<Metric> {
        match requested {
            Some(name) => name
                .parse()
                .with_context(|| format!("Unknown metric '{}'", name)),
            None => Ok(self.query.metric),
        }
    }

    pub fn color_scale(&self) -> Result<ColorScale> {
        let scale = ColorScale::new(self.heatmap.vmin, self.heatmap.vmax)
            .context("Invalid [heatmap] color domain")?;
        Ok(scale.with_colormap(self.heatmap.colormap.clone()))
    }
}

/// Find synmap.toml in current or parent directories.
fn find_config_file() -> Option<PathBuf> {
    let mut dir = std::env::current_dir().ok()?;
    loop {
        let config_path = dir.join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }
        if !dir.pop() {
            break;
        }
    }
    None
}

/// Config file name inside a project directory.
pub fn config_path(base: &Path) -> PathBuf {
    base.join(CONFIG_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let text = Config::default().to_toml().unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.order, vec!["ex", "pvalb", "sst", "vip"]);
        assert_eq!(parsed.classes, default_classes());
        assert_eq!(parsed.query.metric, Metric::StpInduction50Hz);
        assert_eq!(parsed.heatmap.colormap, "bwr");
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        let scheme = config.scheme().unwrap();
        assert_eq!(scheme.names().collect::<Vec<_>>(), vec!["ex", "pvalb", "sst", "vip"]);
        assert_eq!(config.query.has_synapse, Some(true));
        assert_eq!(config.color_scale().unwrap().vmax, 0.5);
    }

    #[test]
    fn classes_accept_single_values_and_lists() {
        let config: Config = toml::from_str(
            r#"
            order = ["l23pyr", "inhib"]

            [query]
            metric = "paired_pulse_ratio_50hz"

            [[classes]]
            name = "l23pyr"
            cell_class = "ex"
            target_layer = "2/3"

            [[classes]]
            name = "inhib"
            cre_type = ["pvalb", "sst", "vip"]
            "#,
        )
        .unwrap();

        assert_eq!(config.classes.len(), 2);
        assert_eq!(
            config.classes[0].definition,
            ClassDefinition::by_category(CellCategory::Excitatory).with_layer(["2/3"])
        );
        assert_eq!(config.classes[1].definition.cre_type.values().len(), 3);
        assert_eq!(config.metric(None).unwrap(), Metric::PairedPulseRatio50Hz);
    }

    #[test]
    fn metric_flag_overrides_config() {
        let config = Config::default();
        assert_eq!(
            config.metric(Some("stp_recovery_250ms")).unwrap(),
            Metric::StpRecovery250ms
        );
        assert!(config.metric(Some("latency")).is_err());
    }

    #[test]
    fn criterion_free_class_is_rejected() {
        let config: Config = toml::from_str(
            r#"
            [[classes]]
            name = "everything"
            "#,
        )
        .unwrap();
        assert!(config.scheme().is_err());
    }

    #[test]
    fn inverted_color_domain_is_rejected() {
        let mut config = Config::default();
        config.heatmap.vmin = 1.0;
        config.heatmap.vmax = -1.0;
        assert!(config.color_scale().is_err());
    }

    #[test]
    fn relative_paths_resolve_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_path(dir.path());
        std::fs::write(&path, "[dataset]\npath = \"data/pairs.json\"\n").unwrap();

        let config = Config::load(Some(path.as_path())).unwrap();
        match config.store_config() {
            StoreConfig::Json { path } => {
                assert_eq!(path, dir.path().join("data/pairs.json"));
            }
            other => panic!("expected a JSON store, got {:?}", other),
        }

        assert_eq!(config.catalog().root(), dir.path().join(".synmap/datasets"));
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(dir.path().join("nope.toml").as_path())).is_err());
    }

    #[test]
    fn query_settings_reach_the_store_query() {
        let config: Config = toml::from_str(
            r#"
            [query]
            projects = ["mouse V1 coarse matrix"]
            require_dynamics = true
            "#,
        )
        .unwrap();
        let query = config.pair_query();
        assert_eq!(query.projects, vec!["mouse V1 coarse matrix"]);
        assert_eq!(query.has_synapse, Some(true));
        assert!(query.require_dynamics);

        assert!(!Config::default().pair_query().require_dynamics);
    }
}
