//! Data structures for KPI records and filter dimensions

use crate::error::Error;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Column order of the delimited wire format, index 0..9.
///
/// Columns are mapped by position, never by header text. Reordering the
/// columns of a source file silently shifts every field; bump this contract
/// together with any producer that writes the file.
pub const WIRE_COLUMNS: [&str; 10] = [
    "battAlias",
    "country",
    "continent",
    "climate",
    "iso_a3",
    "model_series",
    "var",
    "val",
    "descr",
    "cnt_vhcl",
];

/// One observation of a metric for a country/battery/model combination
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KpiRecord {
    /// Battery product identifier
    pub batt_alias: String,
    /// Country display name
    pub country: String,
    /// Continent name (may be empty)
    pub continent: String,
    /// Climate classification (may be empty)
    pub climate: String,
    /// 3-letter ISO country code, the join key to map geometry
    pub iso_a3: String,
    /// Vehicle/model series identifier
    pub model_series: String,
    /// Name of the measured quantity
    pub variable: String,
    /// Metric value; `NaN` when the source field was not an integer
    #[serde(deserialize_with = "nan_from_null")]
    pub value: f64,
    /// Free-text annotation
    pub description: String,
    /// Auxiliary count (vehicles); `NaN` when the source field was not an integer
    #[serde(deserialize_with = "nan_from_null")]
    pub count: f64,
}

impl KpiRecord {
    /// Value of the given filter dimension on this record
    pub fn field(&self, dimension: Dimension) -> &str {
        match dimension {
            Dimension::Variable => &self.variable,
            Dimension::Continent => &self.continent,
            Dimension::Climate => &self.climate,
            Dimension::BattAlias => &self.batt_alias,
            Dimension::ModelSeries => &self.model_series,
        }
    }

    /// Whether the record can take part in country aggregation
    pub fn has_iso(&self) -> bool {
        !self.iso_a3.is_empty()
    }

    /// Numeric column selected by `field`
    pub fn numeric(&self, field: ValueField) -> f64 {
        match field {
            ValueField::Value => self.value,
            ValueField::Count => self.count,
        }
    }
}

/// Numeric column a statistic is computed over
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueField {
    /// The metric value (`val`)
    #[default]
    Value,
    /// The vehicle count (`cnt_vhcl`)
    Count,
}

impl ValueField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueField::Value => "value",
            ValueField::Count => "count",
        }
    }
}

impl fmt::Display for ValueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueField {
    type Err = Error;

    /// Accepts `value`/`count` and the wire column names `val`/`cnt_vhcl`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "value" | "val" => Ok(ValueField::Value),
            "count" | "cnt_vhcl" | "vehicles" => Ok(ValueField::Count),
            _ => Err(Error::UnknownField(s.to_string())),
        }
    }
}

// serde_json writes non-finite floats as `null`; read them back as NaN.
fn nan_from_null<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

/// A filterable dimension of a KPI record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Dimension {
    Variable,
    Continent,
    Climate,
    BattAlias,
    ModelSeries,
}

impl Dimension {
    /// All dimensions, in the order filter selectors are usually shown
    pub const ALL: [Dimension; 5] = [
        Dimension::Variable,
        Dimension::BattAlias,
        Dimension::Continent,
        Dimension::Climate,
        Dimension::ModelSeries,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Variable => "variable",
            Dimension::Continent => "continent",
            Dimension::Climate => "climate",
            Dimension::BattAlias => "battAlias",
            Dimension::ModelSeries => "modelSeries",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = Error;

    /// Accepts camelCase, snake_case and kebab-case names, plus the raw
    /// column names of the wire format (`var`, `model_series`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "variable" | "var" | "metric" => Ok(Dimension::Variable),
            "continent" => Ok(Dimension::Continent),
            "climate" => Ok(Dimension::Climate),
            "battalias" | "battery" => Ok(Dimension::BattAlias),
            "modelseries" | "model" => Ok(Dimension::ModelSeries),
            _ => Err(Error::UnknownDimension(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_record() -> KpiRecord {
        KpiRecord {
            batt_alias: "Batt_1".to_string(),
            country: "Germany".to_string(),
            continent: "Europe".to_string(),
            climate: "normal".to_string(),
            iso_a3: "DEU".to_string(),
            model_series: "Series_1".to_string(),
            variable: "variable_1".to_string(),
            value: 100.0,
            description: "Test".to_string(),
            count: 10.0,
        }
    }

    #[test]
    fn test_field_access() {
        let record = make_record();
        assert_eq!(record.field(Dimension::Variable), "variable_1");
        assert_eq!(record.field(Dimension::Continent), "Europe");
        assert_eq!(record.field(Dimension::Climate), "normal");
        assert_eq!(record.field(Dimension::BattAlias), "Batt_1");
        assert_eq!(record.field(Dimension::ModelSeries), "Series_1");
        assert!(record.has_iso());
    }

    #[test]
    fn test_dimension_from_str() {
        assert_eq!("battAlias".parse::<Dimension>().unwrap(), Dimension::BattAlias);
        assert_eq!("batt_alias".parse::<Dimension>().unwrap(), Dimension::BattAlias);
        assert_eq!("model-series".parse::<Dimension>().unwrap(), Dimension::ModelSeries);
        assert_eq!("model_series".parse::<Dimension>().unwrap(), Dimension::ModelSeries);
        assert_eq!("var".parse::<Dimension>().unwrap(), Dimension::Variable);
        assert_eq!("Continent".parse::<Dimension>().unwrap(), Dimension::Continent);
        assert!("iso_a3".parse::<Dimension>().is_err());
        assert!("".parse::<Dimension>().is_err());
    }

    #[test]
    fn test_dimension_display_round_trip() {
        for dimension in Dimension::ALL {
            assert_eq!(dimension.to_string().parse::<Dimension>().unwrap(), dimension);
        }
    }

    #[test]
    fn test_numeric_field() {
        let record = make_record();
        assert_eq!(record.numeric(ValueField::Value), 100.0);
        assert_eq!(record.numeric(ValueField::Count), 10.0);

        assert_eq!("cnt_vhcl".parse::<ValueField>().unwrap(), ValueField::Count);
        assert_eq!("Val".parse::<ValueField>().unwrap(), ValueField::Value);
        assert_eq!(ValueField::Count.to_string(), "count");
        assert!("weight".parse::<ValueField>().is_err());
    }

    #[test]
    fn test_json_uses_camel_case_and_null_for_nan() {
        let mut record = make_record();
        record.value = f64::NAN;

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["battAlias"], "Batt_1");
        assert_eq!(json["isoA3"], "DEU");
        assert_eq!(json["modelSeries"], "Series_1");
        assert!(json["value"].is_null());

        let back: KpiRecord = serde_json::from_value(json).unwrap();
        assert!(back.value.is_nan());
        assert_eq!(back.count, 10.0);
    }
}
