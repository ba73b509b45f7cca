//! CF attribute blocks and unit harmonization.

use tracing::debug;

use crate::config::{WrfConfig, INVALID_UNIT};
use crate::dataset::{AttributeValue, Attributes, Dataset};

fn merge_attribute_blocks<'a>(
    ds: &mut Dataset,
    blocks: impl IntoIterator<Item = (&'a String, &'a Attributes)>,
) {
    for (name, block) in blocks {
        if let Some(var) = ds.get_mut(name) {
            debug!(variable = %name, keys = block.len(), "Applying CF attributes");
            var.attrs
                .extend(block.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
    }
}

/// Merge the configured CF attribute block into every matching variable.
///
/// A second pass applies the vertical-coordinate blocks selected by the
/// `HYBRID_OPT` global attribute; an absent attribute counts as zero.
pub fn modify_attrs_to_cf(mut ds: Dataset, config: &WrfConfig) -> Dataset {
    merge_attribute_blocks(&mut ds, &config.cf_attribute_map);

    let hybrid_opt_nonzero = ds.global_f64("HYBRID_OPT").is_some_and(|v| v != 0.0);
    if let Some(blocks) = config.conditional_attrs(hybrid_opt_nonzero) {
        merge_attribute_blocks(&mut ds, blocks);
    }
    ds
}

/// Clean and canonicalize `units` attributes.
///
/// Bracket characters are removed from every variable's units. Data
/// variables whose units are a known synonym get the canonical spelling;
/// synonyms of the `invalid` sentinel lose their `units` entirely.
pub fn make_units_pint_friendly(mut ds: Dataset, config: &WrfConfig) -> Dataset {
    let brackets: Vec<char> = config
        .brackets_to_clean_from_units
        .iter()
        .filter_map(|b| b.chars().next())
        .collect();

    for name in ds.variable_names() {
        if let Some(var) = ds.get_mut(&name) {
            if let Some(AttributeValue::Text(units)) = var.attrs.get_mut("units") {
                units.retain(|c| !brackets.contains(&c));
            }
        }
    }

    let unit_map = config.inverted_unit_map();
    for name in ds.data_var_names() {
        let Some(var) = ds.get_mut(&name) else {
            continue;
        };
        match var.units().and_then(|u| unit_map.get(u).copied()) {
            Some(INVALID_UNIT) => {
                debug!(variable = %name, "Removing non-physical units");
                var.attrs.remove("units");
            }
            Some(canonical) => {
                var.attrs
                    .insert("units".to_string(), AttributeValue::from(canonical));
            }
            None => {}
        }
    }
    ds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Variable;

    fn with_units(units: &str) -> Variable {
        let mut var = Variable::from_vec("west_east", vec![0.0, 1.0]);
        var.attrs
            .insert("units".to_string(), AttributeValue::from(units));
        var
    }

    fn units_of<'a>(ds: &'a Dataset, name: &str) -> Option<&'a str> {
        ds.get(name).and_then(Variable::units)
    }

    #[test]
    fn test_cf_attrs_merge_over_existing() {
        let config = WrfConfig::builtin();
        let mut ds = Dataset::new();
        let mut t2 = with_units("K");
        t2.attrs
            .insert("description".to_string(), AttributeValue::from("TEMP at 2 M"));
        ds.insert("T2", t2).unwrap();
        ds.insert("UNKNOWN", with_units("K")).unwrap();

        let out = modify_attrs_to_cf(ds, config);
        let t2 = out.get("T2").unwrap();
        assert_eq!(
            t2.attrs["standard_name"],
            AttributeValue::from("air_temperature")
        );
        assert_eq!(
            t2.attrs["description"],
            AttributeValue::from("TEMP at 2 M")
        );
        assert!(!out.get("UNKNOWN").unwrap().attrs.contains_key("standard_name"));
    }

    #[test]
    fn test_hybrid_opt_selects_conditional_block() {
        let config = WrfConfig::builtin();
        let znu = |nonzero: bool| {
            let mut ds = Dataset::new();
            if nonzero {
                ds.attrs
                    .insert("HYBRID_OPT".to_string(), AttributeValue::Number(2.0));
            }
            ds.insert("ZNU", Variable::from_vec("bottom_top", vec![0.99, 0.5]))
                .unwrap();
            modify_attrs_to_cf(ds, config)
                .get("ZNU")
                .unwrap()
                .attrs
                .get("standard_name")
                .cloned()
        };
        let expected = |nonzero| {
            config
                .conditional_attrs(nonzero)
                .and_then(|blocks| blocks.get("ZNU"))
                .and_then(|attrs| attrs.get("standard_name"))
                .cloned()
        };
        assert_eq!(znu(false), expected(false));
        assert_eq!(znu(true), expected(true));
        assert_ne!(znu(false), znu(true));
    }

    #[test]
    fn test_units_harmonized() {
        let config = WrfConfig::builtin();
        let mut ds = Dataset::new();
        ds.insert("WIND", with_units("m/s")).unwrap();
        ds.insert("LU_INDEX", with_units("category")).unwrap();
        ds.insert("LANDMASK", with_units("flag")).unwrap();
        ds.insert("RAINNC", with_units("{mm}")).unwrap();
        ds.insert("PSFC", with_units("Pa")).unwrap();

        let out = make_units_pint_friendly(ds, config);
        assert_eq!(units_of(&out, "WIND"), Some("m s-1"));
        assert_eq!(units_of(&out, "LU_INDEX"), None);
        assert_eq!(units_of(&out, "LANDMASK"), None);
        assert_eq!(units_of(&out, "RAINNC"), Some("mm"));
        assert_eq!(units_of(&out, "PSFC"), Some("Pa"));
    }

    #[test]
    fn test_every_synonym_maps_to_canonical() {
        let config = WrfConfig::builtin();
        for (canonical, synonyms) in &config.unit_harmonization_map {
            for (i, raw) in synonyms.iter().enumerate() {
                let cleaned: String = raw.chars().filter(|c| *c != '{' && *c != '}').collect();
                if cleaned != *raw {
                    continue;
                }
                let mut ds = Dataset::new();
                ds.insert(format!("VAR{}", i), with_units(raw)).unwrap();
                let out = make_units_pint_friendly(ds, config);
                let expected = (canonical != INVALID_UNIT).then_some(canonical.as_str());
                assert_eq!(units_of(&out, &format!("VAR{}", i)), expected, "{:?}", raw);
            }
        }
    }

    #[test]
    fn test_harmonization_is_idempotent() {
        let config = WrfConfig::builtin();
        let mut ds = Dataset::new();
        ds.insert("T2", with_units("K")).unwrap();
        ds.insert("WIND", with_units("m/s")).unwrap();

        let once = make_units_pint_friendly(modify_attrs_to_cf(ds, config), config);
        let twice = make_units_pint_friendly(modify_attrs_to_cf(once.clone(), config), config);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_coordinate_units_only_cleaned() {
        let config = WrfConfig::builtin();
        let mut ds = Dataset::new();
        ds.insert_coord("XTIME", with_units("{m/s}")).unwrap();
        let out = make_units_pint_friendly(ds, config);
        assert_eq!(units_of(&out, "XTIME"), Some("m/s"));
    }
}
