//! Per-country aggregation and color-scale bounds
//!
//! Sums are plain `f64` additions: a `NaN` value poisons its country's total,
//! and a poisoned total makes both scale bounds `NaN`.

use crate::error::{Error, Result};
use crate::filter::FilterSet;
use crate::record::{Dimension, KpiRecord, ValueField};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Summed value per ISO-3 country code
pub type CountryAggregate = BTreeMap<String, f64>;

/// Label used for records with an empty grouping key
pub const UNKNOWN_GROUP: &str = "Unknown";

/// Sum `value` per country over the records matching `filters`.
///
/// Returns [`Error::MissingVariable`] when `filters` does not constrain the
/// variable. Records without an ISO code are ignored.
pub fn aggregate_by_country(
    records: &[KpiRecord],
    filters: &FilterSet,
) -> Result<CountryAggregate> {
    if filters.get(Dimension::Variable).is_none() {
        return Err(Error::MissingVariable);
    }

    let mut aggregate = CountryAggregate::new();
    for record in records.iter().filter(|r| filters.matches(r)) {
        if !record.has_iso() {
            continue;
        }
        *aggregate.entry(record.iso_a3.clone()).or_insert(0.0) += record.value;
    }

    tracing::debug!("Aggregated {} countries", aggregate.len());
    Ok(aggregate)
}

/// Lower and upper bound of a country aggregate
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MinMax {
    pub min: f64,
    pub max: f64,
}

impl Default for MinMax {
    fn default() -> Self {
        Self { min: 0.0, max: 0.0 }
    }
}

impl MinMax {
    /// Whether either bound is `NaN`
    pub fn is_poisoned(&self) -> bool {
        self.min.is_nan() || self.max.is_nan()
    }

    /// Position of `value` within the scale, clamped to `[0, 1]`.
    ///
    /// Returns `None` when the value or a bound is `NaN`. A scale with
    /// `min == max` places every value at the midpoint.
    pub fn normalize(&self, value: f64) -> Option<f64> {
        if value.is_nan() || self.is_poisoned() {
            return None;
        }

        let range = self.max - self.min;
        if range == 0.0 {
            return Some(0.5);
        }

        Some(((value - self.min) / range).clamp(0.0, 1.0))
    }
}

/// Bounds of the aggregate values; `{0, 0}` when empty.
///
/// Any `NaN` value makes both bounds `NaN`.
pub fn min_max(aggregate: &CountryAggregate) -> MinMax {
    let mut values = aggregate.values().copied();

    let first = match values.next() {
        Some(v) => v,
        None => return MinMax::default(),
    };

    let mut scale = MinMax {
        min: first,
        max: first,
    };
    for value in values {
        if value.is_nan() || scale.is_poisoned() {
            return MinMax {
                min: f64::NAN,
                max: f64::NAN,
            };
        }
        if value < scale.min {
            scale.min = value;
        }
        if value > scale.max {
            scale.max = value;
        }
    }

    if scale.is_poisoned() {
        return MinMax {
            min: f64::NAN,
            max: f64::NAN,
        };
    }
    scale
}

/// Summary of one country's records, for detail panels
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CountrySummary {
    pub iso_a3: String,
    /// Display name, continent and climate of the country's first record
    pub country: String,
    pub continent: String,
    pub climate: String,
    /// Number of records for the country
    pub records: usize,
    /// Sum of `value` (NaN-propagating)
    pub value_sum: f64,
    /// Sum of `count` (NaN-propagating)
    pub vehicle_count: f64,
    /// Distinct battery aliases, in first-appearance order
    pub battery_types: Vec<String>,
    /// Distinct variables, in first-appearance order
    pub variables: Vec<String>,
}

impl CountrySummary {
    fn start(record: &KpiRecord) -> Self {
        Self {
            iso_a3: record.iso_a3.clone(),
            country: record.country.clone(),
            continent: record.continent.clone(),
            climate: record.climate.clone(),
            records: 0,
            value_sum: 0.0,
            vehicle_count: 0.0,
            battery_types: Vec::new(),
            variables: Vec::new(),
        }
    }

    fn add(&mut self, record: &KpiRecord) {
        self.records += 1;
        self.value_sum += record.value;
        self.vehicle_count += record.count;
        push_unique(&mut self.battery_types, &record.batt_alias);
        push_unique(&mut self.variables, &record.variable);
    }
}

fn push_unique(values: &mut Vec<String>, value: &str) {
    if !value.is_empty() && !values.iter().any(|v| v == value) {
        values.push(value.to_string());
    }
}

/// One summary per ISO code, keyed and ordered by code
pub fn country_summaries(records: &[KpiRecord]) -> BTreeMap<String, CountrySummary> {
    let mut summaries: BTreeMap<String, CountrySummary> = BTreeMap::new();

    for record in records.iter().filter(|r| r.has_iso()) {
        summaries
            .entry(record.iso_a3.clone())
            .or_insert_with(|| CountrySummary::start(record))
            .add(record);
    }

    summaries
}

/// Statistics of one group of records, for chart panels
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupStats {
    /// Group key; [`UNKNOWN_GROUP`] for empty keys
    pub key: String,
    /// Records in the group, including those with a `NaN` field
    pub count: usize,
    pub sum: f64,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    /// Distinct variables in the group, in first-appearance order
    pub variables: Vec<String>,
}

/// Group records by `dimension` and compute statistics of `field` per group.
///
/// Groups appear in first-appearance order. Unlike the country aggregate,
/// `NaN` fields are left out of the statistics here.
pub fn aggregate_by_dimension(
    records: &[KpiRecord],
    dimension: Dimension,
    field: ValueField,
) -> Vec<GroupStats> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<&KpiRecord>> = HashMap::new();

    for record in records {
        let key = match record.field(dimension) {
            "" => UNKNOWN_GROUP,
            key => key,
        };
        groups
            .entry(key)
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push(record);
    }

    order
        .into_iter()
        .map(|key| {
            let members = &groups[key];
            let stats = value_stats(members.iter().copied(), field);
            let mut variables = Vec::new();
            for member in members {
                push_unique(&mut variables, &member.variable);
            }
            GroupStats {
                key: key.to_string(),
                count: members.len(),
                sum: stats.sum,
                avg: stats.avg,
                min: stats.min,
                max: stats.max,
                variables,
            }
        })
        .collect()
}

/// Statistics over the finite values of one field of a record set
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct ValueStats {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub sum: f64,
    /// Number of finite values
    pub count: usize,
}

/// min/max/avg/sum over finite values of `field`; all zero when there are none
pub fn value_stats<'a, I>(records: I, field: ValueField) -> ValueStats
where
    I: IntoIterator<Item = &'a KpiRecord>,
{
    let mut stats = ValueStats {
        min: f64::INFINITY,
        max: f64::NEG_INFINITY,
        ..ValueStats::default()
    };

    for value in records
        .into_iter()
        .map(|r| r.numeric(field))
        .filter(|v| v.is_finite())
    {
        stats.min = stats.min.min(value);
        stats.max = stats.max.max(value);
        stats.sum += value;
        stats.count += 1;
    }

    if stats.count == 0 {
        return ValueStats::default();
    }

    stats.avg = stats.sum / stats.count as f64;
    stats
}

/// Tukey fences of one field: `[q1 - 1.5 * iqr, q3 + 1.5 * iqr]`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct OutlierBounds {
    pub q1: f64,
    pub q3: f64,
    pub lower: f64,
    pub upper: f64,
}

impl OutlierBounds {
    /// Fences over the finite values of `field`; `None` when there are none.
    ///
    /// Quartiles are the sorted values at `floor(n * 0.25)` and
    /// `floor(n * 0.75)`, without interpolation.
    pub fn from_records(records: &[KpiRecord], field: ValueField) -> Option<Self> {
        let mut values: Vec<f64> = records
            .iter()
            .map(|r| r.numeric(field))
            .filter(|v| v.is_finite())
            .collect();
        if values.is_empty() {
            return None;
        }
        values.sort_by(f64::total_cmp);

        let n = values.len();
        let q1 = values[n / 4];
        let q3 = values[(n * 3) / 4];
        let iqr = q3 - q1;

        Some(Self {
            q1,
            q3,
            lower: q1 - 1.5 * iqr,
            upper: q3 + 1.5 * iqr,
        })
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// Records whose finite `field` lies outside the Tukey fences, in input order.
///
/// Records with a `NaN` field are never reported.
pub fn outliers(records: &[KpiRecord], field: ValueField) -> Vec<KpiRecord> {
    let bounds = match OutlierBounds::from_records(records, field) {
        Some(bounds) => bounds,
        None => return Vec::new(),
    };

    let found: Vec<KpiRecord> = records
        .iter()
        .filter(|r| {
            let value = r.numeric(field);
            value.is_finite() && !bounds.contains(value)
        })
        .cloned()
        .collect();

    tracing::debug!(
        "{} outliers of {} outside [{}, {}]",
        found.len(),
        field,
        bounds.lower,
        bounds.upper
    );
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn make_record(iso: &str, variable: &str, value: f64) -> KpiRecord {
        KpiRecord {
            batt_alias: "B1".to_string(),
            country: format!("Country {}", iso),
            continent: "Europe".to_string(),
            climate: "normal".to_string(),
            iso_a3: iso.to_string(),
            model_series: "S1".to_string(),
            variable: variable.to_string(),
            value,
            description: String::new(),
            count: 2.0,
        }
    }

    #[test]
    fn test_sum_per_country() {
        let records = vec![
            make_record("DEU", "v1", 100.0),
            make_record("DEU", "v1", 50.0),
            make_record("FRA", "v1", 30.0),
        ];

        let aggregate = aggregate_by_country(&records, &FilterSet::new().variable("v1")).unwrap();

        let expected: CountryAggregate =
            [("DEU".to_string(), 150.0), ("FRA".to_string(), 30.0)].into_iter().collect();
        assert_eq!(aggregate, expected);
    }

    #[test]
    fn test_other_variables_and_empty_iso_are_excluded() {
        let records = vec![
            make_record("DEU", "v1", 100.0),
            make_record("DEU", "v2", 1000.0),
            make_record("", "v1", 7.0),
        ];

        let aggregate = aggregate_by_country(&records, &FilterSet::new().variable("v1")).unwrap();

        assert_eq!(aggregate.len(), 1);
        assert_eq!(aggregate["DEU"], 100.0);
    }

    #[test]
    fn test_requires_variable() {
        let records = vec![make_record("DEU", "v1", 100.0)];
        let result = aggregate_by_country(&records, &FilterSet::new().continent("Europe"));
        assert!(matches!(result, Err(Error::MissingVariable)));
    }

    #[test]
    fn test_empty_input() {
        let aggregate = aggregate_by_country(&[], &FilterSet::new().variable("v1")).unwrap();
        assert!(aggregate.is_empty());
        assert_eq!(min_max(&aggregate), MinMax { min: 0.0, max: 0.0 });
    }

    #[test]
    fn test_nan_poisons_country_total() {
        let records = vec![
            make_record("DEU", "v1", 100.0),
            make_record("DEU", "v1", f64::NAN),
            make_record("DEU", "v1", 5.0),
            make_record("FRA", "v1", 30.0),
        ];

        let aggregate = aggregate_by_country(&records, &FilterSet::new().variable("v1")).unwrap();

        assert!(aggregate["DEU"].is_nan());
        assert_eq!(aggregate["FRA"], 30.0);

        let scale = min_max(&aggregate);
        assert!(scale.min.is_nan());
        assert!(scale.max.is_nan());
        assert!(scale.is_poisoned());
    }

    #[test]
    fn test_min_max() {
        let aggregate: CountryAggregate =
            [("DEU".to_string(), 150.0), ("FRA".to_string(), 30.0)].into_iter().collect();
        assert_eq!(min_max(&aggregate), MinMax { min: 30.0, max: 150.0 });

        let single: CountryAggregate = [("ESP".to_string(), -4.0)].into_iter().collect();
        assert_eq!(min_max(&single), MinMax { min: -4.0, max: -4.0 });
    }

    #[test]
    fn test_min_max_nan_in_first_position() {
        // "AAA" sorts first in the BTreeMap
        let aggregate: CountryAggregate =
            [("AAA".to_string(), f64::NAN), ("ZZZ".to_string(), 3.0)].into_iter().collect();
        assert!(min_max(&aggregate).is_poisoned());

        let only_nan: CountryAggregate = [("AAA".to_string(), f64::NAN)].into_iter().collect();
        assert!(min_max(&only_nan).is_poisoned());
    }

    #[test]
    fn test_normalize() {
        let scale = MinMax { min: 30.0, max: 150.0 };
        assert_eq!(scale.normalize(30.0), Some(0.0));
        assert_eq!(scale.normalize(90.0), Some(0.5));
        assert_eq!(scale.normalize(150.0), Some(1.0));
        assert_eq!(scale.normalize(500.0), Some(1.0));
        assert_eq!(scale.normalize(f64::NAN), None);

        assert_eq!(MinMax::default().normalize(0.0), Some(0.5));
        let poisoned = MinMax { min: f64::NAN, max: f64::NAN };
        assert_eq!(poisoned.normalize(1.0), None);
    }

    #[test]
    fn test_country_summaries() {
        let mut b2 = make_record("DEU", "v2", 50.0);
        b2.batt_alias = "B2".to_string();
        let records = vec![
            make_record("DEU", "v1", 100.0),
            b2,
            make_record("FRA", "v1", 30.0),
            make_record("", "v1", 1.0),
        ];

        let summaries = country_summaries(&records);

        assert_eq!(summaries.len(), 2);
        let deu = &summaries["DEU"];
        assert_eq!(deu.country, "Country DEU");
        assert_eq!(deu.records, 2);
        assert_eq!(deu.value_sum, 150.0);
        assert_eq!(deu.vehicle_count, 4.0);
        assert_eq!(deu.battery_types, vec!["B1".to_string(), "B2".to_string()]);
        assert_eq!(deu.variables, vec!["v1".to_string(), "v2".to_string()]);
    }

    #[test]
    fn test_aggregate_by_dimension() {
        let mut asia = make_record("JPN", "v1", 8.0);
        asia.continent = "Asia".to_string();
        let mut unknown = make_record("XXX", "v1", 2.0);
        unknown.continent = String::new();
        let records = vec![
            make_record("DEU", "v1", 100.0),
            asia,
            make_record("FRA", "v1", 50.0),
            make_record("ESP", "v1", f64::NAN),
            unknown,
        ];

        let groups = aggregate_by_dimension(&records, Dimension::Continent, ValueField::Value);

        let keys: Vec<&str> = groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["Europe", "Asia", UNKNOWN_GROUP]);

        let europe = &groups[0];
        assert_eq!(europe.count, 3);
        assert_eq!(europe.sum, 150.0);
        assert_eq!(europe.avg, 75.0);
        assert_eq!(europe.min, 50.0);
        assert_eq!(europe.max, 100.0);
        assert_eq!(europe.variables, vec!["v1".to_string()]);
    }

    #[test]
    fn test_aggregate_vehicle_count_by_dimension() {
        let mut hot = make_record("ESP", "v2", 1.0);
        hot.climate = "hot".to_string();
        hot.count = 9.0;
        let mut missing = make_record("FRA", "v1", 1.0);
        missing.count = f64::NAN;
        let records = vec![make_record("DEU", "v1", 100.0), hot, missing];

        let groups = aggregate_by_dimension(&records, Dimension::Climate, ValueField::Count);

        assert_eq!(groups.len(), 2);
        let normal = &groups[0];
        assert_eq!(normal.key, "normal");
        assert_eq!(normal.count, 2);
        assert_eq!(normal.sum, 2.0);
        assert_eq!(normal.avg, 2.0);
        assert_eq!(groups[1].key, "hot");
        assert_eq!(groups[1].sum, 9.0);
        assert_eq!(groups[1].variables, vec!["v2".to_string()]);
    }

    fn with_values(values: &[f64]) -> Vec<KpiRecord> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| make_record(&format!("C{:02}", i), "v1", *v))
            .collect()
    }

    #[test]
    fn test_outliers_of_empty_input() {
        assert!(outliers(&[], ValueField::Value).is_empty());
        assert!(OutlierBounds::from_records(&[], ValueField::Value).is_none());

        let only_nan = with_values(&[f64::NAN, f64::NAN]);
        assert!(outliers(&only_nan, ValueField::Value).is_empty());
    }

    #[test]
    fn test_outliers_of_single_record() {
        let records = with_values(&[42.0]);
        let bounds = OutlierBounds::from_records(&records, ValueField::Value).unwrap();
        assert_eq!((bounds.lower, bounds.upper), (42.0, 42.0));
        assert!(outliers(&records, ValueField::Value).is_empty());
    }

    #[test]
    fn test_outliers_flag_values_beyond_fences() {
        let records = with_values(&[5.0, 1.0, 2.0, 3.0, 100.0, 4.0, 6.0, 7.0, f64::NAN, 8.0]);

        // Sorted finite values 1..8, 100: q1 = 3, q3 = 7, iqr = 4
        let bounds = OutlierBounds::from_records(&records, ValueField::Value).unwrap();
        assert_eq!(
            bounds,
            OutlierBounds {
                q1: 3.0,
                q3: 7.0,
                lower: -3.0,
                upper: 13.0,
            }
        );

        let found = outliers(&records, ValueField::Value);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].value, 100.0);
    }

    #[test]
    fn test_outliers_of_vehicle_count() {
        let mut records = with_values(&[1.0; 8]);
        records[2].count = 500.0;

        assert!(outliers(&records, ValueField::Value).is_empty());
        let found = outliers(&records, ValueField::Count);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].iso_a3, "C02");
    }

    #[test]
    fn test_value_stats() {
        let records = vec![
            make_record("DEU", "v1", 10.0),
            make_record("DEU", "v1", f64::NAN),
            make_record("FRA", "v1", 30.0),
        ];

        let stats = value_stats(&records, ValueField::Value);
        assert_eq!(
            stats,
            ValueStats {
                min: 10.0,
                max: 30.0,
                avg: 20.0,
                sum: 40.0,
                count: 2,
            }
        );

        assert_eq!(value_stats(&[], ValueField::Value), ValueStats::default());

        let counts = value_stats(&records, ValueField::Count);
        assert_eq!(counts.sum, 6.0);
        assert_eq!(counts.count, 3);
    }
}
