//! Validation for CLI arguments

use crate::error::{Error, Result};
use regex::Regex;
use std::path::Path;
use url::Url;

/// Validate and normalize a 3-letter ISO country code (e.g. "deu" -> "DEU")
pub fn validate_iso_code(code: &str) -> Result<String> {
    let normalized = code.trim().to_uppercase();
    let pattern = Regex::new(r"^[A-Z]{3}$").map_err(|e| Error::Validation(e.to_string()))?;

    if !pattern.is_match(&normalized) {
        return Err(Error::Validation(format!(
            "Invalid ISO 3166-1 alpha-3 code: '{}'. Expected three letters, e.g. 'DEU'",
            code
        )));
    }

    Ok(normalized)
}

/// Validate a dataset URL; only http and https are accepted
pub fn validate_data_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url.trim())?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(Error::Validation(format!(
            "Unsupported URL scheme '{}': expected http or https",
            scheme
        ))),
    }
}

/// Validate file path exists and is readable
pub fn validate_file_exists(path: &Path, description: &str) -> Result<()> {
    if !path.exists() {
        return Err(Error::Validation(format!(
            "{} does not exist: {}",
            description,
            path.display()
        )));
    }

    if !path.is_file() {
        return Err(Error::Validation(format!(
            "{} is not a file: {}",
            description,
            path.display()
        )));
    }

    Ok(())
}

/// Validate the row limit of table output
pub fn validate_limit(limit: Option<usize>) -> Result<()> {
    if let Some(0) = limit {
        return Err(Error::Validation("Row limit cannot be 0".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_iso_code() {
        assert_eq!(validate_iso_code("DEU").unwrap(), "DEU");
        assert_eq!(validate_iso_code(" fra ").unwrap(), "FRA");

        assert!(validate_iso_code("").is_err());
        assert!(validate_iso_code("DE").is_err());
        assert!(validate_iso_code("DEUT").is_err());
        assert!(validate_iso_code("D3U").is_err());
    }

    #[test]
    fn test_validate_data_url() {
        assert!(validate_data_url("http://localhost:3000/api/data").is_ok());
        assert!(validate_data_url("https://example.com/world_kpi_anonym.txt").is_ok());

        assert!(matches!(validate_data_url("not a url"), Err(Error::Url(_))));
        assert!(matches!(
            validate_data_url("ftp://example.com/data.txt"),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_validate_limit() {
        assert!(validate_limit(None).is_ok());
        assert!(validate_limit(Some(25)).is_ok());
        assert!(validate_limit(Some(0)).is_err());
    }

    #[test]
    fn test_validate_file_exists() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("kpi.txt");
        std::fs::write(&file_path, "header").unwrap();

        assert!(validate_file_exists(&file_path, "Data file").is_ok());
        let missing = temp_dir.path().join("missing.txt");
        assert!(validate_file_exists(&missing, "Data file").is_err());
        assert!(validate_file_exists(temp_dir.path(), "Data file").is_err());
    }
}
