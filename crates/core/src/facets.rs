//! Distinct values per filter dimension, used to populate filter selectors

use crate::record::{Dimension, KpiRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Distinct non-empty values of `dimension`, in order of first appearance.
///
/// Empty values are excluded for every dimension, `variable` included.
/// Sorting is left to the caller.
pub fn unique_values(records: &[KpiRecord], dimension: Dimension) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut values = Vec::new();

    for record in records {
        let value = record.field(dimension);
        if value.is_empty() {
            continue;
        }
        if seen.insert(value) {
            values.push(value.to_string());
        }
    }

    values
}

/// Facet lists for every filter dimension
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Facets {
    pub variables: Vec<String>,
    pub batt_aliases: Vec<String>,
    pub continents: Vec<String>,
    pub climates: Vec<String>,
    pub model_series: Vec<String>,
}

impl Facets {
    pub fn from_records(records: &[KpiRecord]) -> Self {
        Self {
            variables: unique_values(records, Dimension::Variable),
            batt_aliases: unique_values(records, Dimension::BattAlias),
            continents: unique_values(records, Dimension::Continent),
            climates: unique_values(records, Dimension::Climate),
            model_series: unique_values(records, Dimension::ModelSeries),
        }
    }

    /// Values for one dimension
    pub fn get(&self, dimension: Dimension) -> &[String] {
        match dimension {
            Dimension::Variable => &self.variables,
            Dimension::BattAlias => &self.batt_aliases,
            Dimension::Continent => &self.continents,
            Dimension::Climate => &self.climates,
            Dimension::ModelSeries => &self.model_series,
        }
    }

    /// Copy with every list sorted lexicographically
    pub fn sorted(&self) -> Self {
        let mut facets = self.clone();
        for list in [
            &mut facets.variables,
            &mut facets.batt_aliases,
            &mut facets.continents,
            &mut facets.climates,
            &mut facets.model_series,
        ] {
            list.sort();
        }
        facets
    }

    pub fn is_empty(&self) -> bool {
        Dimension::ALL.iter().all(|d| self.get(*d).is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn make_record(continent: &str, variable: &str, batt_alias: &str) -> KpiRecord {
        KpiRecord {
            batt_alias: batt_alias.to_string(),
            country: "Germany".to_string(),
            continent: continent.to_string(),
            climate: String::new(),
            iso_a3: "DEU".to_string(),
            model_series: "S1".to_string(),
            variable: variable.to_string(),
            value: 1.0,
            description: String::new(),
            count: 1.0,
        }
    }

    #[test]
    fn test_unique_continents_skip_empty_and_duplicates() {
        let records = vec![
            make_record("Europe", "v1", "B1"),
            make_record("", "v1", "B1"),
            make_record("Europe", "v1", "B1"),
            make_record("Asia", "v1", "B1"),
        ];

        assert_eq!(
            unique_values(&records, Dimension::Continent),
            vec!["Europe".to_string(), "Asia".to_string()]
        );
    }

    #[test]
    fn test_first_appearance_order() {
        let records = vec![
            make_record("Europe", "zeta", "B9"),
            make_record("Europe", "alpha", "B1"),
            make_record("Europe", "zeta", "B5"),
        ];

        assert_eq!(
            unique_values(&records, Dimension::Variable),
            vec!["zeta".to_string(), "alpha".to_string()]
        );
        assert_eq!(
            unique_values(&records, Dimension::BattAlias),
            vec!["B9".to_string(), "B1".to_string(), "B5".to_string()]
        );
    }

    #[test]
    fn test_empty_variable_is_excluded() {
        let records = vec![make_record("Europe", "", "B1"), make_record("Europe", "v1", "B1")];
        assert_eq!(unique_values(&records, Dimension::Variable), vec!["v1".to_string()]);
    }

    #[test]
    fn test_facets_from_records() {
        let records = vec![
            make_record("Europe", "v2", "B2"),
            make_record("Asia", "v1", "B1"),
        ];

        let facets = Facets::from_records(&records);
        assert_eq!(facets.continents, vec!["Europe".to_string(), "Asia".to_string()]);
        assert!(facets.climates.is_empty());
        assert_eq!(facets.model_series, vec!["S1".to_string()]);
        assert_eq!(facets.get(Dimension::Variable), &["v2".to_string(), "v1".to_string()]);

        let sorted = facets.sorted();
        assert_eq!(sorted.continents, vec!["Asia".to_string(), "Europe".to_string()]);
        assert_eq!(sorted.variables, vec!["v1".to_string(), "v2".to_string()]);
    }

    #[test]
    fn test_empty_dataset() {
        let facets = Facets::from_records(&[]);
        assert!(facets.is_empty());
        assert_eq!(facets, Facets::default());
    }
}
