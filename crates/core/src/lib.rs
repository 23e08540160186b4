//! world-kpi-core - Data pipeline for the battery KPI world dashboard
//!
//! This crate contains WASM-compatible code that can be shared between
//! the CLI and a browser dashboard.
//!
//! # Features
//!
//! - Parse the `;`-delimited KPI text format, dropping malformed rows
//! - Facet extraction for filter selectors
//! - Conjunctive equality filters, country scoping and table search
//! - Per-country aggregation and min/max bounds for choropleth coloring
//! - Grouped statistics and outlier detection for chart panels
//!
//! # Example
//!
//! ```
//! use world_kpi_core::{aggregate_by_country, min_max, parse_from_string, FilterSet};
//!
//! let text = "battAlias;country;continent;climate;iso_a3;model_series;var;val;descr;cnt_vhcl\n\
//!             B1;Germany;Europe;normal;DEU;S1;v1;100;d;10\n\
//!             B1;France;Europe;normal;FRA;S1;v1;30;d;3";
//!
//! let records = parse_from_string(text);
//! let aggregate = aggregate_by_country(&records, &FilterSet::new().variable("v1")).unwrap();
//! let scale = min_max(&aggregate);
//!
//! assert_eq!(aggregate["DEU"], 100.0);
//! assert_eq!((scale.min, scale.max), (30.0, 100.0));
//! ```

pub mod aggregate;
pub mod dataset;
pub mod error;
pub mod facets;
pub mod filter;
pub mod format;
pub mod parser;
pub mod record;

pub use aggregate::{
    aggregate_by_country, aggregate_by_dimension, country_summaries, min_max, outliers,
    value_stats, CountryAggregate, CountrySummary, GroupStats, MinMax, OutlierBounds, ValueStats,
};
pub use dataset::{DashboardSnapshot, KpiDataset};
pub use error::{Error, Result};
pub use facets::{unique_values, Facets};
pub use filter::{apply_filters, country_data, search, FilterSet};
pub use format::format_number;
pub use parser::{parse_from_file, parse_from_string, KpiParser, ParseReport, SkippedLine};
pub use record::{Dimension, KpiRecord, ValueField, WIRE_COLUMNS};
