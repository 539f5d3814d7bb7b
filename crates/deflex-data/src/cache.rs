//! Parameter-keyed file cache
//!
//! Derived tables are written once to a path computed from the parameters
//! that produced them and reused on every later request. The cache never
//! invalidates anything on its own: a changed upstream register or weather
//! set is only picked up after the cached file is removed, either by hand or
//! through [`FileCache::invalidate`].

use deflex_core::config::{fill_pattern, DeflexConfig};
use deflex_core::error::{DeflexError, Result};
use deflex_core::models::FeedinCategory;
use std::fs;
use std::path::{Path, PathBuf};

/// Sub-directory holding feed-in files computed from another weather year
const WEATHER_VARIATIONS: &str = "weather_variations";

/// Parameters identifying one derived file
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Region-tagged power-plant register of a model-region set
    DeflexRegister { map: String },
    /// Feed-in series of one category
    Feedin {
        map: String,
        year: i32,
        category: FeedinCategory,
        weather_year: Option<i32>,
    },
}

impl CacheKey {
    pub fn deflex_register(map: impl Into<String>) -> Self {
        CacheKey::DeflexRegister { map: map.into() }
    }

    pub fn feedin(
        map: impl Into<String>,
        year: i32,
        category: FeedinCategory,
        weather_year: Option<i32>,
    ) -> Self {
        CacheKey::Feedin { map: map.into(), year, category, weather_year }
    }
}

/// File cache rooted at the directories of a [`DeflexConfig`]
#[derive(Debug, Clone)]
pub struct FileCache {
    config: DeflexConfig,
}

impl FileCache {
    pub fn new(config: &DeflexConfig) -> Self {
        Self { config: config.clone() }
    }

    /// Deterministic location of the file for a key
    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        match key {
            CacheKey::DeflexRegister { map } => {
                let name = fill_pattern(&self.config.powerplants.deflex_pp, &[("map", map.as_str())]);
                self.config.powerplants_dir.join(name)
            }
            CacheKey::Feedin { map, year, category, weather_year } => {
                let year = year.to_string();
                let dir = PathBuf::from(fill_pattern(
                    &self.config.feedin_dir_pattern,
                    &[("map", map.as_str()), ("year", year.as_str())],
                ));
                let vars = [
                    ("year", year.as_str()),
                    ("map", map.as_str()),
                    ("type", category.file_key()),
                ];
                match weather_year {
                    None => dir.join(fill_pattern(&self.config.feedin.pattern, &vars)),
                    Some(weather_year) => {
                        let weather_year = weather_year.to_string();
                        let mut vars = vars.to_vec();
                        vars.push(("weather_year", weather_year.as_str()));
                        dir.join(WEATHER_VARIATIONS)
                            .join(fill_pattern(&self.config.feedin.pattern_weather, &vars))
                    }
                }
            }
        }
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.path_for(key).is_file()
    }

    /// Path of the cached file, running `create` first if it does not exist
    ///
    /// `create` receives the target path and must leave a file there. An
    /// existing file is returned as is, however old it is.
    pub fn get_or_create<F>(&self, key: &CacheKey, create: F) -> Result<PathBuf>
    where
        F: FnOnce(&Path) -> Result<()>,
    {
        let path = self.path_for(key);
        if path.is_file() {
            tracing::debug!("Using cached file {}", path.display());
            return Ok(path);
        }

        tracing::debug!("File '{}' does not exist. Will create it.", path.display());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        create(&path)?;

        if !path.is_file() {
            return Err(DeflexError::FileNotFound {
                path,
                hint: "The producing step did not write its output.".to_string(),
            });
        }
        Ok(path)
    }

    /// Remove a cached file; returns whether there was one
    pub fn invalidate(&self, key: &CacheKey) -> Result<bool> {
        let path = self.path_for(key);
        if !path.is_file() {
            return Ok(false);
        }
        fs::remove_file(&path)?;
        tracing::info!("Removed cached file {}", path.display());
        Ok(true)
    }
}
