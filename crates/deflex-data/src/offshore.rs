use deflex_core::config::DeflexConfig;
use deflex_core::error::Result;
use deflex_core::models::{technology, PowerPlant, PowerPlantTable};
use std::collections::{BTreeMap, BTreeSet};

/// Whether a plant of this technology cannot stand in the sea
fn is_onshore_only(plant: &PowerPlant) -> bool {
    match plant.energy_source_level_2.as_str() {
        technology::SOLAR | technology::BIOENERGY => true,
        technology::WIND => plant.technology == technology::ONSHORE,
        _ => false,
    }
}

/// Move onshore-only plants out of offshore regions
///
/// Solar, bioenergy and onshore wind plants labelled with one of the
/// `offshore_regions` get the mainland region their federal state maps to
/// in `coast_regions`. Offshore wind stays where it is. Returns the number
/// of relabelled plants.
pub fn reclassify_offshore(
    table: &mut PowerPlantTable,
    offshore_regions: &[String],
    coast_regions: &BTreeMap<String, String>,
) -> usize {
    let offshore: BTreeSet<&str> = offshore_regions.iter().map(String::as_str).collect();
    let mut moved = 0;
    let mut unmapped: BTreeMap<String, usize> = BTreeMap::new();

    for plant in table.iter_mut() {
        let in_offshore = plant.region.as_deref().is_some_and(|r| offshore.contains(r));
        if !in_offshore || !is_onshore_only(plant) {
            continue;
        }
        match coast_regions.get(&plant.federal_states) {
            Some(mainland) => {
                tracing::debug!(
                    "Clean {} from {:?}: plant {} -> {}",
                    plant.energy_source_level_2,
                    plant.region,
                    plant.id,
                    mainland.trim()
                );
                plant.region = Some(mainland.trim().to_string());
                moved += 1;
            }
            None => *unmapped.entry(plant.federal_states.clone()).or_insert(0) += 1,
        }
    }

    for (state, count) in unmapped {
        tracing::warn!(
            "{} onshore plants of state '{}' stay in an offshore region: no coastal region defined",
            count,
            state
        );
    }
    moved
}

/// [`reclassify_offshore`] with the tables of the active model-region set
///
/// Fails if the configuration has no coastal table for the map.
pub fn remove_onshore_technology_from_offshore_regions(
    table: &mut PowerPlantTable,
    config: &DeflexConfig,
) -> Result<usize> {
    tracing::info!("Removing onshore technology from offshore regions.");
    let coast_regions = config.coast_regions_for_map()?;
    let moved = reclassify_offshore(table, config.offshore_regions_for_map(), coast_regions);
    tracing::info!("{} plants moved from offshore to mainland regions", moved);
    Ok(moved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use deflex_core::error::DeflexError;
    use proptest::prelude::*;

    fn plant(source: &str, tech: &str, state: &str, region: &str) -> PowerPlant {
        PowerPlant {
            energy_source_level_2: source.to_string(),
            technology: tech.to_string(),
            federal_states: state.to_string(),
            region: Some(region.to_string()),
            capacity: 1.0,
            ..Default::default()
        }
    }

    fn config(map: &str) -> DeflexConfig {
        DeflexConfig::defaults().unwrap().with_map(map)
    }

    #[test]
    fn test_onshore_wind_moves_to_mainland() {
        let mut table = PowerPlantTable::new(vec![plant("Wind", "Onshore", "MV", "DE02")]);
        let moved =
            remove_onshore_technology_from_offshore_regions(&mut table, &config("de02")).unwrap();
        assert_eq!(moved, 1);
        assert_eq!(table.plants()[0].region.as_deref(), Some("DE01"));
    }

    #[test]
    fn test_offshore_wind_and_other_columns_untouched() {
        let mut offshore = plant("Wind", "Offshore", "MV", "DE19");
        offshore.attributes.insert("name".to_string(), "Baltic 1".to_string());
        let solar = plant("Solar", "", "SH", "DE20");
        let hydro = plant("Hydro", "", "NI", "DE21");
        let mut table = PowerPlantTable::new(vec![offshore.clone(), solar.clone(), hydro.clone()]);

        remove_onshore_technology_from_offshore_regions(&mut table, &config("de21")).unwrap();

        assert_eq!(table.plants()[0], offshore);
        assert_eq!(table.plants()[1], PowerPlant { region: Some("DE13".to_string()), ..solar });
        assert_eq!(table.plants()[2], hydro);
    }

    #[test]
    fn test_trailing_space_in_coastal_label_is_trimmed() {
        let coast = BTreeMap::from([("NI".to_string(), "DE01 ".to_string())]);
        let mut table = PowerPlantTable::new(vec![plant("Bioenergy", "", "NI", "DE02")]);
        reclassify_offshore(&mut table, &["DE02".to_string()], &coast);
        assert_eq!(table.plants()[0].region.as_deref(), Some("DE01"));
    }

    #[test]
    fn test_unknown_state_is_left_in_place() {
        let mut table = PowerPlantTable::new(vec![plant("Solar", "", "BY", "DE02")]);
        let moved =
            remove_onshore_technology_from_offshore_regions(&mut table, &config("de02")).unwrap();
        assert_eq!(moved, 0);
        assert_eq!(table.plants()[0].region.as_deref(), Some("DE02"));
    }

    #[test]
    fn test_undefined_coast_regions_fail() {
        let mut table = PowerPlantTable::default();
        let err = remove_onshore_technology_from_offshore_regions(&mut table, &config("de05"))
            .unwrap_err();
        assert!(matches!(err, DeflexError::CoastRegionsUndefined { .. }));
    }

    fn arb_plant() -> impl Strategy<Value = PowerPlant> {
        (
            prop::sample::select(vec!["Wind", "Solar", "Bioenergy", "Hydro"]),
            prop::sample::select(vec!["Onshore", "Offshore", ""]),
            prop::sample::select(vec!["MV", "SH", "NI", "BY"]),
            prop::sample::select(vec!["DE01", "DE13", "DE14", "DE19", "DE20", "DE21"]),
        )
            .prop_map(|(source, tech, state, region)| plant(source, tech, state, region))
    }

    proptest! {
        #[test]
        fn prop_reclassifier_is_idempotent(plants in prop::collection::vec(arb_plant(), 0..40)) {
            let config = config("de21");
            let mut once = PowerPlantTable::new(plants);
            remove_onshore_technology_from_offshore_regions(&mut once, &config).unwrap();
            let mut twice = once.clone();
            let moved = remove_onshore_technology_from_offshore_regions(&mut twice, &config).unwrap();
            prop_assert_eq!(moved, 0);
            prop_assert_eq!(once, twice);
        }
    }
}
