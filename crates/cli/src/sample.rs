//! Synthetic datasets for trying the dashboard pipeline
//!
//! Scenarios:
//!   simple     - a few European countries, two variables
//!   malformed  - good rows mixed with short and long rows
//!   missing    - empty continents/ISO codes and non-numeric values
//!   full       - all scenarios combined (default)

use clap::ValueEnum;
use world_kpi_core::WIRE_COLUMNS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    Simple,
    Malformed,
    Missing,
    Full,
}

struct Country {
    name: &'static str,
    iso: &'static str,
    continent: &'static str,
    climate: &'static str,
}

const COUNTRIES: [Country; 6] = [
    Country {
        name: "Germany",
        iso: "DEU",
        continent: "Europe",
        climate: "normal",
    },
    Country {
        name: "France",
        iso: "FRA",
        continent: "Europe",
        climate: "normal",
    },
    Country {
        name: "Spain",
        iso: "ESP",
        continent: "Europe",
        climate: "hot",
    },
    Country {
        name: "Norway",
        iso: "NOR",
        continent: "Europe",
        climate: "cold",
    },
    Country {
        name: "Japan",
        iso: "JPN",
        continent: "Asia",
        climate: "normal",
    },
    Country {
        name: "United States",
        iso: "USA",
        continent: "North America",
        climate: "hot",
    },
];

/// Generate a dataset in the delimited wire format
pub fn generate(scenario: Scenario) -> String {
    let mut lines = vec![WIRE_COLUMNS.join(";")];

    match scenario {
        Scenario::Simple => lines.extend(simple_rows()),
        Scenario::Malformed => lines.extend(malformed_rows()),
        Scenario::Missing => lines.extend(missing_rows()),
        Scenario::Full => {
            lines.extend(simple_rows());
            lines.extend(malformed_rows());
            lines.extend(missing_rows());
        }
    }

    lines.join("\n") + "\n"
}

fn row(
    batt: &str,
    country: &Country,
    model: &str,
    variable: &str,
    value: &str,
    count: &str,
) -> String {
    [
        batt,
        country.name,
        country.continent,
        country.climate,
        country.iso,
        model,
        variable,
        value,
        "synthetic",
        count,
    ]
    .join(";")
}

fn simple_rows() -> Vec<String> {
    let mut rows = Vec::new();
    for (i, country) in COUNTRIES.iter().take(4).enumerate() {
        let base = 100 + 25 * i as u32;
        rows.push(row(
            "Batt_1",
            country,
            "Series_1",
            "variable_1",
            &base.to_string(),
            "10",
        ));
        rows.push(row(
            "Batt_2",
            country,
            "Series_2",
            "variable_1",
            &(base / 2).to_string(),
            "4",
        ));
        rows.push(row(
            "Batt_1",
            country,
            "Series_1",
            "variable_2",
            &(base * 3).to_string(),
            "10",
        ));
    }
    rows
}

fn malformed_rows() -> Vec<String> {
    let japan = &COUNTRIES[4];
    vec![
        row("Batt_3", japan, "Series_3", "variable_1", "80", "6"),
        // Missing trailing columns
        "Batt_3;Japan;Asia;normal;JPN;Series_3;variable_1".to_string(),
        // A stray delimiter inside the description
        "Batt_3;Japan;Asia;normal;JPN;Series_3;variable_1;90;note;with;delimiter;2".to_string(),
        row("Batt_3", japan, "Series_3", "variable_2", "240", "6"),
    ]
}

fn missing_rows() -> Vec<String> {
    let usa = &COUNTRIES[5];
    vec![
        row("Batt_4", usa, "Series_4", "variable_1", "n/a", "12"),
        row("Batt_4", usa, "Series_4", "variable_1", "120", ""),
        "Batt_4;Atlantis;;;;Series_4;variable_1;15;no geometry;1".to_string(),
    ]
}
