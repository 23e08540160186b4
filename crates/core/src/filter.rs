//! Conjunctive equality filters over KPI records
//!
//! A [`FilterSet`] holds at most one exact-match value per [`Dimension`].
//! Absent or empty values impose no constraint. All present constraints must
//! hold (AND); there is no OR, range or substring matching here. The table's
//! free-text [`search`] is a separate operation.

use crate::error::{Error, Result};
use crate::facets::Facets;
use crate::record::{Dimension, KpiRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Active filter predicates, keyed by dimension
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct FilterSet {
    predicates: BTreeMap<Dimension, String>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or clear, with an empty value) the constraint on one dimension
    pub fn set(&mut self, dimension: Dimension, value: impl Into<String>) {
        let value = value.into();
        if value.is_empty() {
            self.predicates.remove(&dimension);
        } else {
            self.predicates.insert(dimension, value);
        }
    }

    /// Builder form of [`FilterSet::set`]
    pub fn with(mut self, dimension: Dimension, value: impl Into<String>) -> Self {
        self.set(dimension, value);
        self
    }

    /// Builder form for an optional value, as produced by CLI flags
    pub fn with_opt(self, dimension: Dimension, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.with(dimension, v),
            None => self,
        }
    }

    pub fn variable(self, value: impl Into<String>) -> Self {
        self.with(Dimension::Variable, value)
    }

    pub fn continent(self, value: impl Into<String>) -> Self {
        self.with(Dimension::Continent, value)
    }

    pub fn climate(self, value: impl Into<String>) -> Self {
        self.with(Dimension::Climate, value)
    }

    pub fn batt_alias(self, value: impl Into<String>) -> Self {
        self.with(Dimension::BattAlias, value)
    }

    pub fn model_series(self, value: impl Into<String>) -> Self {
        self.with(Dimension::ModelSeries, value)
    }

    /// The constraint on `dimension`, if any
    pub fn get(&self, dimension: Dimension) -> Option<&str> {
        self.predicates.get(&dimension).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Active constraints in dimension order
    pub fn iter(&self) -> impl Iterator<Item = (Dimension, &str)> {
        self.predicates.iter().map(|(d, v)| (*d, v.as_str()))
    }

    /// Whether a record satisfies every active constraint
    pub fn matches(&self, record: &KpiRecord) -> bool {
        self.predicates
            .iter()
            .all(|(dimension, value)| record.field(*dimension) == value)
    }

    /// Fill in the first known variable when no variable is selected
    pub fn with_default_variable(mut self, facets: &Facets) -> Self {
        if self.get(Dimension::Variable).is_none() {
            if let Some(first) = facets.variables.first() {
                self.set(Dimension::Variable, first.clone());
            }
        }
        self
    }

    /// Parse a `dimension=value` assignment, e.g. `continent=Europe`
    pub fn parse_assignment(expr: &str) -> Result<(Dimension, String)> {
        let (key, value) = expr.split_once('=').ok_or_else(|| {
            Error::InvalidFilter(format!("expected dimension=value, got '{}'", expr))
        })?;
        let dimension: Dimension = key.parse()?;
        Ok((dimension, value.to_string()))
    }

    /// Build a filter set from `dimension=value` assignments; later ones win
    pub fn from_assignments<'a, I>(exprs: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut filters = Self::new();
        for expr in exprs {
            let (dimension, value) = Self::parse_assignment(expr)?;
            filters.set(dimension, value);
        }
        Ok(filters)
    }
}

/// Records matching every active predicate, in input order
pub fn apply_filters(records: &[KpiRecord], filters: &FilterSet) -> Vec<KpiRecord> {
    records
        .iter()
        .filter(|record| filters.matches(record))
        .cloned()
        .collect()
}

/// Records of one country, optionally narrowed by further predicates.
///
/// The ISO restriction always applies first; `filters` only run on its output.
pub fn country_data(
    records: &[KpiRecord],
    iso_a3: &str,
    filters: Option<&FilterSet>,
) -> Vec<KpiRecord> {
    let in_country: Vec<KpiRecord> = records
        .iter()
        .filter(|record| record.iso_a3 == iso_a3)
        .cloned()
        .collect();

    match filters {
        Some(filters) => apply_filters(&in_country, filters),
        None => in_country,
    }
}

/// Case-insensitive substring scan over every field of each record
pub fn search(records: &[KpiRecord], query: &str) -> Vec<KpiRecord> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return records.to_vec();
    }

    records
        .iter()
        .filter(|record| record_matches_text(record, &needle))
        .cloned()
        .collect()
}

fn record_matches_text(record: &KpiRecord, needle: &str) -> bool {
    let text_fields = [
        record.batt_alias.as_str(),
        record.country.as_str(),
        record.continent.as_str(),
        record.climate.as_str(),
        record.iso_a3.as_str(),
        record.model_series.as_str(),
        record.variable.as_str(),
        record.description.as_str(),
    ];

    text_fields
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
        || record.value.to_string().to_lowercase().contains(needle)
        || record.count.to_string().to_lowercase().contains(needle)
}
