use deflex_core::config::{AmbiguousCapacity, CliConfigOverrides, LayeredConfig};
use deflex_core::models::{
    FeedinCategory, FeedinTable, Geometry, LineId, MastrPlant, ModelRegion, RegionSet,
    TurbineDefaults,
};
use deflex_core::ports::{
    CapacityWeights, RegionProvider, RegisterSource, TurbineLibrary, WeatherAggregator,
    WindZoneAssigner,
};
use deflex_core::{DeflexConfig, DeflexError, Result};
use deflex_data::transmission::{get_electrical_transmission_deflex, renpass_capacity};
use deflex_data::{FeedinAggregator, MastrPreparer, PowerPlantLoader};
use std::cell::Cell;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const REEGIS: &str = "\
id,lat,lon,energy_source_level_2,technology,federal_states,capacity,efficiency,com_year,com_month,decom_year,coastdat2,geometry
1,52.0,10.0,Wind,Onshore,NI,2.0,,2005,1,,100,POINT (10 52)
2,55.0,10.0,Wind,Onshore,MV,3.0,,2014,6,,200,POINT (10 55)
3,55.0,10.0,Wind,Offshore,MV,6.0,,2008,1,,200,POINT (10 55)
4,52.0,10.0,Hydro,Pumped storage,NI,100.0,0.8,1970,,,100,POINT (10 52)
5,47.5,9.5,Hydro,Run-of-river,AT,50.0,,1980,,,300,POINT (9.5 47.5)
6,52.0,10.0,Bioenergy,,NI,1.0,0.5,2000,,2014,100,POINT (10 52)
";

struct Regions;

impl RegionProvider for Regions {
    fn model_regions(&self, map: &str) -> Result<RegionSet> {
        Ok(RegionSet::new(
            map,
            vec![
                ModelRegion::new("DE01", Geometry::rectangle([5.0, 47.0], [15.0, 54.0])),
                ModelRegion::new("DE02", Geometry::rectangle([5.0, 54.0], [15.0, 56.0])),
            ],
        ))
    }

    fn power_lines(&self, _map: &str) -> Result<Vec<LineId>> {
        Ok(vec![LineId::new("DE01", "DE02")])
    }
}

struct Register {
    path: PathBuf,
    calls: Cell<usize>,
}

impl RegisterSource for Register {
    fn create_reegis_register(&self) -> Result<PathBuf> {
        self.calls.set(self.calls.get() + 1);
        fs::create_dir_all(self.path.parent().unwrap())?;
        fs::write(&self.path, REEGIS)?;
        Ok(self.path.clone())
    }
}

struct Weather {
    calls: Cell<usize>,
}

impl Weather {
    fn table(&self, regions: &BTreeSet<String>, levels: usize) -> Result<FeedinTable> {
        self.calls.set(self.calls.get() + 1);
        let names = ["region", "type", "set"].iter().take(levels).map(|s| s.to_string()).collect();
        let mut table = FeedinTable::new(names, vec!["2014-01-01 00:00".to_string()]);
        for region in regions {
            let mut labels = vec![region.clone()];
            labels.extend(["x".to_string(), "y".to_string()].into_iter().take(levels - 1));
            table.push_column(labels, vec![0.5])?;
        }
        Ok(table)
    }
}

impl WeatherAggregator for Weather {
    fn wind_solar(
        &self,
        _weights: &CapacityWeights,
        regions: &BTreeSet<String>,
        _year: i32,
        _category: FeedinCategory,
        _weather_year: Option<i32>,
    ) -> Result<FeedinTable> {
        self.table(regions, 3)
    }

    fn hydro(
        &self,
        _weights: &CapacityWeights,
        regions: &BTreeSet<String>,
        _year: i32,
        _weather_year: Option<i32>,
    ) -> Result<FeedinTable> {
        self.table(regions, 1)
    }

    fn geothermal(
        &self,
        regions: &BTreeSet<String>,
        _year: i32,
        _weather_year: Option<i32>,
    ) -> Result<FeedinTable> {
        self.table(regions, 1)
    }
}

fn config(dir: &Path, map: &str) -> DeflexConfig {
    let mut layered = LayeredConfig::with_defaults();
    layered.update_from_cli(CliConfigOverrides {
        map: Some(map.to_string()),
        data_dir: Some(dir.to_path_buf()),
        decommission_proration: None,
    });
    layered.resolve().unwrap()
}

#[test]
fn test_deflex_register_is_built_once_and_filtered() {
    let dir = TempDir::new().unwrap();
    let config = config(dir.path(), "de02");
    let source = Register { path: config.reegis_pp_path(), calls: Cell::new(0) };
    let loader = PowerPlantLoader::new(&config, &Regions, &source);

    let pp = loader.get_deflex_pp_by_year(2014, false).unwrap();
    assert_eq!(source.calls.get(), 1);
    assert!(config.deflex_pp_path().is_file());

    // Pumped storage and the Austrian plant are gone
    let ids: Vec<&str> = pp.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3", "6"]);

    let by_id = |id: &str| pp.iter().find(|p| p.id == id).unwrap();
    // Onshore wind in MV moved out of the offshore region, offshore wind stays
    assert_eq!(by_id("2").region.as_deref(), Some("DE01"));
    assert_eq!(by_id("3").region.as_deref(), Some("DE02"));
    assert!(!by_id("1").attributes.contains_key("geometry"));

    assert_eq!(by_id("1").capacity_for(2014).capacity, 2.0);
    assert_eq!(by_id("2").capacity_for(2014).capacity, 1.5);
    // Decommissioned in 2014 without commissioning month: full year
    assert_eq!(by_id("6").capacity_for(2014).capacity, 1.0);
    assert_eq!(by_id("6").capacity_in, Some(2.0));

    // Second call reads the cached register
    loader.get_deflex_pp_by_year(2015, true).unwrap();
    assert_eq!(source.calls.get(), 1);
}

#[test]
fn test_feedin_aggregated_on_cache_miss() {
    let dir = TempDir::new().unwrap();
    let config = config(dir.path(), "de02");
    let source = Register { path: config.reegis_pp_path(), calls: Cell::new(0) };
    let loader = PowerPlantLoader::new(&config, &Regions, &source);
    let weather = Weather { calls: Cell::new(0) };
    let feedin = FeedinAggregator::new(&config, &weather, &loader);

    let wind = feedin.get_feedin(2014, "wind", None).unwrap().unwrap();
    assert_eq!(wind.levels(), 3);
    assert_eq!(wind.column(&["DE01", "x", "y"]), Some(&[0.5][..]));
    assert_eq!(weather.calls.get(), 4);

    let hydro = feedin.get_feedin(2014, "hydro", None).unwrap().unwrap();
    assert_eq!(hydro.levels(), 1);
    assert_eq!(weather.calls.get(), 4);

    assert!(feedin.get_feedin(2014, "pv", None).unwrap().is_none());

    feedin.get_feedin(2014, "solar", Some(2012)).unwrap().unwrap();
    assert_eq!(weather.calls.get(), 8);
}

#[test]
fn test_transmission_default_map() {
    let dir = TempDir::new().unwrap();
    let config = config(dir.path(), "de02");
    let lines = get_electrical_transmission_deflex(&config, &Regions, true).unwrap();
    assert_eq!(lines.len(), 2);
    assert!(lines.iter().all(|l| l.capacity.is_infinite() && l.distance.is_none()));
}

#[test]
fn test_transmission_renpass_map() {
    let dir = TempDir::new().unwrap();
    let config = config(dir.path(), "de21");
    fs::create_dir_all(&config.data_deflex_dir).unwrap();
    fs::write(
        config.renpass_grid_path(),
        "plus_region_id,minus_region_id,scenario_name,circuits,voltage,distance\n\
         11002,11001,status_quo_2012_distance,2,380,80\n",
    )
    .unwrap();

    let lines = get_electrical_transmission_deflex(&config, &Regions, false).unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].id.to_string(), "DE01-DE02");
    assert_eq!(lines[0].distance, Some(80.0));
    assert!(lines[0].capacity > 0.0);
}

/// Three lines: data in both directions, no data at all, data in one direction
struct GridRegions;

impl RegionProvider for GridRegions {
    fn model_regions(&self, map: &str) -> Result<RegionSet> {
        Regions.model_regions(map)
    }

    fn power_lines(&self, _map: &str) -> Result<Vec<LineId>> {
        Ok(vec![
            LineId::new("DE01", "DE02"),
            LineId::new("DE01", "DE03"),
            LineId::new("DE02", "DE03"),
        ])
    }
}

fn renpass_config(dir: &Path, policy: AmbiguousCapacity) -> DeflexConfig {
    let mut config = config(dir, "de21");
    config.transmission.ambiguous_capacity = policy;
    fs::create_dir_all(&config.data_deflex_dir).unwrap();
    fs::write(
        config.renpass_grid_path(),
        "plus_region_id,minus_region_id,scenario_name,circuits,voltage,distance\n\
         11001,11002,status_quo_2012_distance,2,380,100\n\
         11002,11001,status_quo_2012_distance,1,380,90\n\
         11003,11002,status_quo_2012_distance,1,220,50\n",
    )
    .unwrap();
    config
}

fn line_capacity(config: &DeflexConfig, circuits: f64, voltage: f64) -> f64 {
    let tr = &config.transmission;
    renpass_capacity(circuits, voltage, tr.current_max, tr.security_factor)
}

#[test]
fn test_transmission_ambiguous_capacity_dropped() {
    let dir = TempDir::new().unwrap();
    let config = renpass_config(dir.path(), AmbiguousCapacity::Drop);
    let lines = get_electrical_transmission_deflex(&config, &GridRegions, false).unwrap();

    let ids: Vec<String> = lines.iter().map(|l| l.id.to_string()).collect();
    assert_eq!(ids, vec!["DE01-DE03", "DE02-DE03"]);

    // No grid data in either direction
    assert_eq!(lines[0].capacity, 0.0);
    assert_eq!(lines[0].distance, Some(0.0));

    // Only the backward direction has data
    assert_eq!(lines[1].capacity, line_capacity(&config, 1.0, 220.0));
    assert_eq!(lines[1].distance, Some(50.0));
}

#[test]
fn test_transmission_ambiguous_capacity_error() {
    let dir = TempDir::new().unwrap();
    let config = renpass_config(dir.path(), AmbiguousCapacity::Error);
    let err = get_electrical_transmission_deflex(&config, &GridRegions, false).unwrap_err();
    match err {
        DeflexError::AmbiguousGridCapacity { line, forward, backward } => {
            assert_eq!(line, "DE01-DE02");
            assert_eq!(forward, line_capacity(&config, 2.0, 380.0));
            assert_eq!(backward, line_capacity(&config, 1.0, 380.0));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_transmission_ambiguous_capacity_average() {
    let dir = TempDir::new().unwrap();
    let config = renpass_config(dir.path(), AmbiguousCapacity::Average);
    let lines = get_electrical_transmission_deflex(&config, &GridRegions, false).unwrap();
    assert_eq!(lines.len(), 3);

    let both = &lines[0];
    assert_eq!(both.id.to_string(), "DE01-DE02");
    let expected = (line_capacity(&config, 2.0, 380.0) + line_capacity(&config, 1.0, 380.0)) / 2.0;
    assert!((both.capacity - expected).abs() < 1e-9);
    assert_eq!(both.distance, Some(100.0));
    assert_eq!(both.efficiency, None);
}

#[test]
fn test_transmission_renpass_without_grid_file() {
    let dir = TempDir::new().unwrap();
    let config = config(dir.path(), "de21");
    let err = get_electrical_transmission_deflex(&config, &Regions, false).unwrap_err();
    assert!(matches!(err, DeflexError::FileNotFound { .. }));
}

struct Turbines;

impl TurbineLibrary for Turbines {
    fn types_with_power_curve(&self) -> Result<BTreeSet<String>> {
        Ok(BTreeSet::from(["E-82/2300".to_string()]))
    }
}

struct Zones;

impl WindZoneAssigner for Zones {
    fn assign(&self, plants: &[MastrPlant]) -> Result<Vec<Option<TurbineDefaults>>> {
        Ok(plants
            .iter()
            .map(|p| {
                (p.lat? < 54.0).then(|| TurbineDefaults {
                    turbine_type: "E-101/3050".to_string(),
                    hub_height: 99.0,
                    rotor_diameter: 101.0,
                })
            })
            .collect())
    }
}

#[test]
fn test_mastr_turbine_substitution() {
    let dir = TempDir::new().unwrap();
    let config = config(dir.path(), "de21");
    fs::create_dir_all(&config.mastr_dir).unwrap();
    fs::write(
        config.mastr_wind_path(),
        "\
Nabenhoehe,Rotordurchmesser,Typenbezeichnung,Laengengrad,Breitengrad,Inbetriebnahmedatum,DatumEndgueltigeStilllegung,DatumBeginnVoruebergehendeStilllegung,DatumWiederaufnahmeBetrieb,Lage,InstallierteLeistung,Seelage,lat,lon
98,82,E-82/2300,12.0,53.0,2010-01-01,,,,Land,2300,,53.0,12.0
80,70,Unknown,12.0,53.0,2011-01-01,,,,Land,1500,,53.0,12.0
80,70,,12.0,54.5,2011-01-01,,,,Land,1500,,54.5,12.0
80,70,Unknown,12.0,53.0,2016-01-01,,,,Land,1500,,53.0,12.0
",
    )
    .unwrap();

    let preparer = MastrPreparer::new(&config, &Turbines, &Zones);
    let plants = preparer.get_mastr_pp_filtered_by_year("Wind", 2014).unwrap();
    assert_eq!(plants.len(), 3);

    assert!(plants[0].has_power_curve);
    assert_eq!(plants[0].turbine_type.as_deref(), Some("E-82/2300"));
    assert_eq!(plants[0].hub_height, Some(98.0));

    assert_eq!(plants[1].turbine_type.as_deref(), Some("E-101/3050"));
    assert_eq!(plants[1].rotor_diameter, Some(101.0));

    // Outside every wind zone: own values are kept
    assert_eq!(plants[2].turbine_type, None);
    assert_eq!(plants[2].hub_height, Some(80.0));

    let err = preparer.get_mastr_pp_filtered_by_year("Biomass", 2014).unwrap_err();
    assert!(matches!(err, DeflexError::UnsupportedCategory { .. }));
}

#[test]
fn test_mastr_missing_file() {
    let dir = TempDir::new().unwrap();
    let config = config(dir.path(), "de21");
    let preparer = MastrPreparer::new(&config, &Turbines, &Zones);
    let err = preparer.get_mastr_pp_filtered_by_year("Wind", 2014).unwrap_err();
    assert!(matches!(err, DeflexError::FileNotFound { .. }));
}
