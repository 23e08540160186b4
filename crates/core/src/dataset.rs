//! One loaded dataset and the views the dashboard derives from it

use crate::aggregate::{
    aggregate_by_country, country_summaries, min_max, CountryAggregate, CountrySummary, MinMax,
};
use crate::error::{Error, Result};
use crate::facets::Facets;
use crate::filter::{apply_filters, country_data, search, FilterSet};
use crate::parser::{KpiParser, ParseReport};
use crate::record::KpiRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The records of one load. Every view is recomputed from them on demand.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KpiDataset {
    records: Vec<KpiRecord>,
    report: ParseReport,
}

impl KpiDataset {
    /// Create an empty dataset
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a dataset from raw delimited text
    pub fn from_text(text: &str) -> Self {
        let (records, report) = KpiParser::new().parse_with_report(text);
        Self { records, report }
    }

    /// Build a dataset from already parsed records
    pub fn from_records(records: Vec<KpiRecord>) -> Self {
        Self {
            records,
            report: ParseReport::default(),
        }
    }

    /// Load a dataset from a delimited text file
    pub fn load_from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;

        Ok(Self::from_text(&content))
    }

    pub fn records(&self) -> &[KpiRecord] {
        &self.records
    }

    /// What the parser skipped while loading
    pub fn parse_report(&self) -> &ParseReport {
        &self.report
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn facets(&self) -> Facets {
        Facets::from_records(&self.records)
    }

    pub fn filter(&self, filters: &FilterSet) -> Vec<KpiRecord> {
        apply_filters(&self.records, filters)
    }

    /// Records of one country, narrowed by `filters` when given
    pub fn country(&self, iso_a3: &str, filters: Option<&FilterSet>) -> Vec<KpiRecord> {
        country_data(&self.records, iso_a3, filters)
    }

    /// Summary of one country's records, narrowed by `filters` when given
    pub fn country_summary(
        &self,
        iso_a3: &str,
        filters: Option<&FilterSet>,
    ) -> Option<CountrySummary> {
        country_summaries(&self.country(iso_a3, filters)).remove(iso_a3)
    }

    /// Table search over the records matching `filters`
    pub fn search(&self, filters: &FilterSet, query: &str) -> Vec<KpiRecord> {
        search(&self.filter(filters), query)
    }

    pub fn aggregate(&self, filters: &FilterSet) -> Result<CountryAggregate> {
        aggregate_by_country(&self.records, filters)
    }

    /// Everything a map view needs for the given filters.
    ///
    /// Falls back to the first variable when `filters` does not select one.
    pub fn snapshot(&self, filters: &FilterSet) -> Result<DashboardSnapshot> {
        let facets = self.facets();
        let filters = filters.clone().with_default_variable(&facets);

        let aggregate = if filters.get(crate::record::Dimension::Variable).is_some() {
            self.aggregate(&filters)?
        } else {
            // No variable anywhere means no records at all
            CountryAggregate::new()
        };
        let scale = min_max(&aggregate);
        let matching_records = self.records.iter().filter(|r| filters.matches(r)).count();

        Ok(DashboardSnapshot {
            generated_at: Utc::now(),
            filters,
            facets,
            aggregate,
            scale,
            total_records: self.records.len(),
            matching_records,
            skipped_lines: self.report.skipped.len(),
        })
    }
}

/// Serializable view handed to a map/chart renderer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub generated_at: DateTime<Utc>,
    pub filters: FilterSet,
    pub facets: Facets,
    /// ISO-3 code to summed value
    pub aggregate: CountryAggregate,
    pub scale: MinMax,
    pub total_records: usize,
    pub matching_records: usize,
    pub skipped_lines: usize,
}

impl DashboardSnapshot {
    /// Save the snapshot as pretty-printed JSON
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::FileWriteError {
                path: parent.display().to_string(),
                source: e,
            })?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| Error::FileWriteError {
            path: path.display().to_string(),
            source: e,
        })?;

        Ok(())
    }
}
