use crate::error::{DeflexError, Result};
use crate::models::TurbineDefaults;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// How capacity is prorated in the year a plant is decommissioned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DecommissionProration {
    /// `capacity * com_month / 12`, the historical deflex formula
    #[default]
    CommissioningMonth,
    /// `capacity * decom_month / 12`
    DecommissioningMonth,
}

/// What to do when a power line has grid capacity in both directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AmbiguousCapacity {
    /// Log an error and leave the line out
    #[default]
    Drop,
    /// Fail with `DeflexError::AmbiguousGridCapacity`
    Error,
    /// Use the mean of both directions
    Average,
}

/// Directories and path patterns; relative paths are resolved against the data directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub powerplants: PathBuf,
    pub data_deflex: PathBuf,
    pub geometries: PathBuf,
    /// Feed-in output directory pattern with `{map}` and `{year}`
    pub feedin: String,
    pub mastr: PathBuf,
    pub weather: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            powerplants: PathBuf::from("powerplants"),
            data_deflex: PathBuf::from("deflex"),
            geometries: PathBuf::from("geometries"),
            feedin: "feedin/{map}/{year}".to_string(),
            mastr: PathBuf::from("mastr"),
            weather: PathBuf::from("weather"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PowerplantsConfig {
    /// File name of the national reegis register
    pub reegis_pp: String,
    /// File name pattern of the region-tagged register, with `{map}`
    pub deflex_pp: String,
    /// Drop pumped storage plants
    pub remove_phes: bool,
    /// Administrative states whose plants are dropped
    pub remove_states: Vec<String>,
    /// Move onshore technologies out of offshore regions
    pub clean_offshore: bool,
}

impl Default for PowerplantsConfig {
    fn default() -> Self {
        Self {
            reegis_pp: "reegis_pp.csv".to_string(),
            deflex_pp: "deflex_pp_{map}.csv".to_string(),
            remove_phes: true,
            remove_states: vec!["AT".to_string(), "CH".to_string(), "LU".to_string()],
            clean_offshore: true,
        }
    }
}

/// Buffering of the spatial join, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpatialJoinConfig {
    pub step: f64,
    pub limit: f64,
}

impl Default for SpatialJoinConfig {
    fn default() -> Self {
        Self { step: 0.05, limit: 1.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransmissionConfig {
    pub security_factor: f64,
    /// Rated current per circuit in A
    pub current_max: f64,
    /// Grid table inside `paths.data_deflex`
    pub renpass_file: String,
    /// Model-region sets with physical grid data
    pub renpass_maps: Vec<String>,
    pub scenario_name: String,
    pub ambiguous_capacity: AmbiguousCapacity,
}

impl Default for TransmissionConfig {
    fn default() -> Self {
        Self {
            security_factor: 0.7,
            current_max: 2720.0,
            renpass_file: "renpass_transmission.csv".to_string(),
            renpass_maps: vec!["de21".to_string(), "de22".to_string()],
            scenario_name: "status_quo_2012_distance".to_string(),
            ambiguous_capacity: AmbiguousCapacity::Drop,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeedinConfig {
    /// File name pattern with `{year}`, `{map}` and `{type}`
    pub pattern: String,
    /// File name pattern for weather variations, additionally with `{weather_year}`
    pub pattern_weather: String,
}

impl Default for FeedinConfig {
    fn default() -> Self {
        Self {
            pattern: "{year}_feedin_{map}_{type}.csv".to_string(),
            pattern_weather: "{year}_feedin_{map}_{type}_weather_{weather_year}.csv".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MastrConfig {
    pub wind_file: String,
    /// CSV with `turbine_type,has_power_curve`
    pub turbine_library: String,
    /// GeoJSON with one polygon per wind zone
    pub wind_zones: String,
    /// Default turbine per wind zone
    pub wind_zone_defaults: BTreeMap<String, TurbineDefaults>,
}

impl Default for MastrConfig {
    fn default() -> Self {
        let defaults = [
            ("1", "E-126/4200", 135.0, 127.0),
            ("2", "E-115/3200", 122.0, 115.0),
            ("3", "E-101/3050", 99.0, 101.0),
            ("4", "E-82/3000", 78.0, 82.0),
        ];
        Self {
            wind_file: "bnetza_mastr_wind_v1_4_clean_50hertz.csv".to_string(),
            turbine_library: "turbine_library.csv".to_string(),
            wind_zones: "wind_zones.geojson".to_string(),
            wind_zone_defaults: defaults
                .into_iter()
                .map(|(zone, turbine_type, hub_height, rotor_diameter)| {
                    (
                        zone.to_string(),
                        TurbineDefaults {
                            turbine_type: turbine_type.to_string(),
                            hub_height,
                            rotor_diameter,
                        },
                    )
                })
                .collect(),
        }
    }
}

/// Offshore region labels per model-region set
pub fn default_offshore_regions() -> BTreeMap<String, Vec<String>> {
    let table: [(&str, &[&str]); 4] = [
        ("de02", &["DE02"]),
        ("de17", &["DE17"]),
        ("de21", &["DE19", "DE20", "DE21"]),
        ("de22", &["DE19", "DE20", "DE21"]),
    ];
    table
        .into_iter()
        .map(|(map, regions)| {
            (map.to_string(), regions.iter().map(|r| r.to_string()).collect())
        })
        .collect()
}

/// Mainland substitute region per coastal state, per model-region set
pub fn default_coast_regions() -> BTreeMap<String, BTreeMap<String, String>> {
    let table: [(&str, [(&str, &str); 3]); 4] = [
        ("de02", [("MV", "DE01"), ("SH", "DE01"), ("NI", "DE01")]),
        ("de17", [("MV", "DE13"), ("SH", "DE01"), ("NI", "DE03")]),
        ("de21", [("MV", "DE01"), ("SH", "DE13"), ("NI", "DE14")]),
        ("de22", [("MV", "DE01"), ("SH", "DE13"), ("NI", "DE14")]),
    ];
    table
        .into_iter()
        .map(|(map, states)| {
            (
                map.to_string(),
                states
                    .into_iter()
                    .map(|(state, region)| (state.to_string(), region.to_string()))
                    .collect(),
            )
        })
        .collect()
}

/// Layered configuration for deflex
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub map: ConfigValue<String>,
    pub data_dir: ConfigValue<PathBuf>,
    pub decommission_proration: ConfigValue<DecommissionProration>,
    pub paths: ConfigValue<PathsConfig>,
    pub powerplants: ConfigValue<PowerplantsConfig>,
    pub spatial_join: ConfigValue<SpatialJoinConfig>,
    pub transmission: ConfigValue<TransmissionConfig>,
    pub feedin: ConfigValue<FeedinConfig>,
    pub mastr: ConfigValue<MastrConfig>,
    pub offshore_regions: ConfigValue<BTreeMap<String, Vec<String>>>,
    pub coast_regions: ConfigValue<BTreeMap<String, BTreeMap<String, String>>>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            map: ConfigValue::new("de21".to_string(), ConfigSource::Default),
            data_dir: ConfigValue::new(PathBuf::from("data"), ConfigSource::Default),
            decommission_proration: ConfigValue::new(
                DecommissionProration::default(),
                ConfigSource::Default,
            ),
            paths: ConfigValue::new(PathsConfig::default(), ConfigSource::Default),
            powerplants: ConfigValue::new(PowerplantsConfig::default(), ConfigSource::Default),
            spatial_join: ConfigValue::new(SpatialJoinConfig::default(), ConfigSource::Default),
            transmission: ConfigValue::new(TransmissionConfig::default(), ConfigSource::Default),
            feedin: ConfigValue::new(FeedinConfig::default(), ConfigSource::Default),
            mastr: ConfigValue::new(MastrConfig::default(), ConfigSource::Default),
            offshore_regions: ConfigValue::new(default_offshore_regions(), ConfigSource::Default),
            coast_regions: ConfigValue::new(default_coast_regions(), ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| DeflexError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        self.load_from_str(&content)
    }

    /// Load configuration from TOML text
    pub fn load_from_str(mut self, content: &str) -> Result<Self> {
        let file_config: FileConfig =
            toml::from_str(content).map_err(|e| DeflexError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(map) = file_config.map {
            self.map.update(map, ConfigSource::File);
        }

        if let Some(data_dir) = file_config.data_dir {
            self.data_dir.update(data_dir, ConfigSource::File);
        }

        if let Some(proration) = file_config.decommission_proration {
            self.decommission_proration.update(proration, ConfigSource::File);
        }

        if let Some(paths) = file_config.paths {
            self.paths.update(paths, ConfigSource::File);
        }

        if let Some(powerplants) = file_config.powerplants {
            self.powerplants.update(powerplants, ConfigSource::File);
        }

        if let Some(spatial_join) = file_config.spatial_join {
            self.spatial_join.update(spatial_join, ConfigSource::File);
        }

        if let Some(transmission) = file_config.transmission {
            self.transmission.update(transmission, ConfigSource::File);
        }

        if let Some(feedin) = file_config.feedin {
            self.feedin.update(feedin, ConfigSource::File);
        }

        if let Some(mastr) = file_config.mastr {
            self.mastr.update(mastr, ConfigSource::File);
        }

        // Per-map tables extend the built-in ones
        if let Some(offshore) = file_config.offshore_regions {
            let mut merged = self.offshore_regions.value.clone();
            merged.extend(offshore);
            self.offshore_regions.update(merged, ConfigSource::File);
        }

        if let Some(coast) = file_config.coast_regions {
            let mut merged = self.coast_regions.value.clone();
            merged.extend(coast);
            self.coast_regions.update(merged, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        // DEFLEX_MAP
        if let Ok(map) = env::var("DEFLEX_MAP") {
            if map.trim().is_empty() {
                tracing::warn!("Ignoring empty DEFLEX_MAP");
            } else {
                self.map.update(map.trim().to_string(), ConfigSource::Environment);
            }
        }

        // DEFLEX_DATA_DIR
        if let Ok(dir) = env::var("DEFLEX_DATA_DIR") {
            self.data_dir.update(PathBuf::from(dir), ConfigSource::Environment);
        }

        // DEFLEX_DECOMMISSION_PRORATION
        if let Ok(value) = env::var("DEFLEX_DECOMMISSION_PRORATION") {
            match parse_decommission_proration(&value) {
                Ok(mode) => self.decommission_proration.update(mode, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid DEFLEX_DECOMMISSION_PRORATION value '{}': expected commissioning_month or decommissioning_month",
                    value
                ),
            }
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(map) = overrides.map {
            self.map.update(map, ConfigSource::Cli);
        }

        if let Some(data_dir) = overrides.data_dir {
            self.data_dir.update(data_dir, ConfigSource::Cli);
        }

        if let Some(proration) = overrides.decommission_proration {
            self.decommission_proration.update(proration, ConfigSource::Cli);
        }
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert("map".to_string(), (self.map.value.clone(), self.map.source));
        map.insert(
            "data_dir".to_string(),
            (self.data_dir.value.display().to_string(), self.data_dir.source),
        );
        map.insert(
            "decommission_proration".to_string(),
            (
                format!("{:?}", self.decommission_proration.value),
                self.decommission_proration.source,
            ),
        );

        let paths = &self.paths.value;
        for (key, value) in [
            ("paths.powerplants", paths.powerplants.display().to_string()),
            ("paths.data_deflex", paths.data_deflex.display().to_string()),
            ("paths.geometries", paths.geometries.display().to_string()),
            ("paths.feedin", paths.feedin.clone()),
            ("paths.mastr", paths.mastr.display().to_string()),
            ("paths.weather", paths.weather.display().to_string()),
        ] {
            map.insert(key.to_string(), (value, self.paths.source));
        }

        let pp = &self.powerplants.value;
        for (key, value) in [
            ("powerplants.reegis_pp", pp.reegis_pp.clone()),
            ("powerplants.deflex_pp", pp.deflex_pp.clone()),
            ("powerplants.remove_phes", pp.remove_phes.to_string()),
            ("powerplants.remove_states", pp.remove_states.join(", ")),
            ("powerplants.clean_offshore", pp.clean_offshore.to_string()),
        ] {
            map.insert(key.to_string(), (value, self.powerplants.source));
        }

        let join = &self.spatial_join.value;
        map.insert(
            "spatial_join.step".to_string(),
            (join.step.to_string(), self.spatial_join.source),
        );
        map.insert(
            "spatial_join.limit".to_string(),
            (join.limit.to_string(), self.spatial_join.source),
        );

        let tr = &self.transmission.value;
        for (key, value) in [
            ("transmission.security_factor", tr.security_factor.to_string()),
            ("transmission.current_max", tr.current_max.to_string()),
            ("transmission.renpass_file", tr.renpass_file.clone()),
            ("transmission.renpass_maps", tr.renpass_maps.join(", ")),
            ("transmission.scenario_name", tr.scenario_name.clone()),
            ("transmission.ambiguous_capacity", format!("{:?}", tr.ambiguous_capacity)),
        ] {
            map.insert(key.to_string(), (value, self.transmission.source));
        }

        map.insert(
            "feedin.pattern".to_string(),
            (self.feedin.value.pattern.clone(), self.feedin.source),
        );
        map.insert(
            "feedin.pattern_weather".to_string(),
            (self.feedin.value.pattern_weather.clone(), self.feedin.source),
        );

        map.insert(
            "mastr.wind_file".to_string(),
            (self.mastr.value.wind_file.clone(), self.mastr.source),
        );

        let active = &self.map.value;
        map.insert(
            "offshore_regions".to_string(),
            (
                self.offshore_regions
                    .value
                    .get(active)
                    .map(|r| r.join(", "))
                    .unwrap_or_default(),
                self.offshore_regions.source,
            ),
        );
        map.insert(
            "coast_regions".to_string(),
            (
                self.coast_regions
                    .value
                    .get(active)
                    .map(|t| {
                        t.iter().map(|(s, r)| format!("{}={}", s, r)).collect::<Vec<_>>().join(", ")
                    })
                    .unwrap_or_default(),
                self.coast_regions.source,
            ),
        );

        map
    }

    /// Freeze the layers into the explicit configuration handed to components
    pub fn resolve(&self) -> Result<DeflexConfig> {
        let map = self.map.value.trim().to_string();
        if map.is_empty() {
            return Err(DeflexError::ConfigMissing { key: "map".to_string() });
        }

        let join = self.spatial_join.value;
        if !(join.step > 0.0) || join.limit < 0.0 {
            return Err(DeflexError::ConfigInvalid {
                key: "spatial_join".to_string(),
                reason: format!(
                    "step must be positive and limit non-negative (step={}, limit={})",
                    join.step, join.limit
                ),
            });
        }

        let data_dir = self.data_dir.value.clone();
        let paths = &self.paths.value;
        let resolve = |p: &Path| if p.is_absolute() { p.to_path_buf() } else { data_dir.join(p) };

        let feedin_dir = Path::new(&paths.feedin);
        let feedin_dir_pattern = if feedin_dir.is_absolute() {
            paths.feedin.clone()
        } else {
            data_dir.join(feedin_dir).display().to_string()
        };

        Ok(DeflexConfig {
            map,
            data_dir: data_dir.clone(),
            powerplants_dir: resolve(&paths.powerplants),
            data_deflex_dir: resolve(&paths.data_deflex),
            geometries_dir: resolve(&paths.geometries),
            feedin_dir_pattern,
            mastr_dir: resolve(&paths.mastr),
            weather_dir: resolve(&paths.weather),
            powerplants: self.powerplants.value.clone(),
            decommission_proration: self.decommission_proration.value,
            spatial_join: join,
            transmission: self.transmission.value.clone(),
            feedin: self.feedin.value.clone(),
            mastr: self.mastr.value.clone(),
            offshore_regions: self.offshore_regions.value.clone(),
            coast_regions: self.coast_regions.value.clone(),
        })
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    map: Option<String>,
    data_dir: Option<PathBuf>,
    decommission_proration: Option<DecommissionProration>,
    paths: Option<PathsConfig>,
    powerplants: Option<PowerplantsConfig>,
    spatial_join: Option<SpatialJoinConfig>,
    transmission: Option<TransmissionConfig>,
    feedin: Option<FeedinConfig>,
    mastr: Option<MastrConfig>,
    offshore_regions: Option<BTreeMap<String, Vec<String>>>,
    coast_regions: Option<BTreeMap<String, BTreeMap<String, String>>>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub map: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub decommission_proration: Option<DecommissionProration>,
}

/// Effective configuration of one run
///
/// Every option a component reads is a field here; nothing is looked up
/// from process-wide state.
#[derive(Debug, Clone, PartialEq)]
pub struct DeflexConfig {
    /// Active model-region identifier (e.g. "de21")
    pub map: String,
    pub data_dir: PathBuf,
    pub powerplants_dir: PathBuf,
    pub data_deflex_dir: PathBuf,
    pub geometries_dir: PathBuf,
    /// Feed-in output directory pattern with `{map}` and `{year}`
    pub feedin_dir_pattern: String,
    pub mastr_dir: PathBuf,
    pub weather_dir: PathBuf,
    pub powerplants: PowerplantsConfig,
    pub decommission_proration: DecommissionProration,
    pub spatial_join: SpatialJoinConfig,
    pub transmission: TransmissionConfig,
    pub feedin: FeedinConfig,
    pub mastr: MastrConfig,
    pub offshore_regions: BTreeMap<String, Vec<String>>,
    pub coast_regions: BTreeMap<String, BTreeMap<String, String>>,
}

impl DeflexConfig {
    /// Configuration built from defaults only
    pub fn defaults() -> Result<Self> {
        LayeredConfig::with_defaults().resolve()
    }

    /// Copy of this configuration for another model-region set
    pub fn with_map(&self, map: impl Into<String>) -> Self {
        Self { map: map.into(), ..self.clone() }
    }

    /// Register column holding the region label, e.g. "de21_region"
    pub fn region_column(&self) -> String {
        format!("{}_region", self.map)
    }

    /// Offshore regions of the active map (empty if none are configured)
    pub fn offshore_regions_for_map(&self) -> &[String] {
        self.offshore_regions.get(&self.map).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Coastal substitution table of the active map
    pub fn coast_regions_for_map(&self) -> Result<&BTreeMap<String, String>> {
        self.coast_regions
            .get(&self.map)
            .ok_or_else(|| DeflexError::CoastRegionsUndefined { map: self.map.clone() })
    }

    /// Whether the active map has physical grid data
    pub fn is_renpass_map(&self) -> bool {
        self.transmission.renpass_maps.iter().any(|m| m == &self.map)
    }

    pub fn reegis_pp_path(&self) -> PathBuf {
        self.powerplants_dir.join(&self.powerplants.reegis_pp)
    }

    pub fn deflex_pp_path(&self) -> PathBuf {
        self.powerplants_dir
            .join(fill_pattern(&self.powerplants.deflex_pp, &[("map", &self.map)]))
    }

    pub fn renpass_grid_path(&self) -> PathBuf {
        self.data_deflex_dir.join(&self.transmission.renpass_file)
    }

    pub fn mastr_wind_path(&self) -> PathBuf {
        self.mastr_dir.join(&self.mastr.wind_file)
    }
}

/// Replace `{key}` placeholders in a pattern
pub fn fill_pattern(pattern: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(pattern.to_string(), |acc, (key, value)| {
        acc.replace(&format!("{{{}}}", key), value)
    })
}

/// Parse decommission proration mode from string
pub fn parse_decommission_proration(s: &str) -> Result<DecommissionProration> {
    match s.trim().to_lowercase().replace('-', "_").as_str() {
        "commissioning_month" | "com_month" => Ok(DecommissionProration::CommissioningMonth),
        "decommissioning_month" | "decom_month" => Ok(DecommissionProration::DecommissioningMonth),
        _ => Err(DeflexError::ConfigInvalid {
            key: "decommission_proration".to_string(),
            reason: format!(
                "Invalid proration mode: {}. Use commissioning_month or decommissioning_month",
                s
            ),
        }),
    }
}
