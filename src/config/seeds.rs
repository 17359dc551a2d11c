//! Seed URL loading
//!
//! Seed files are either one URL per line or comma-separated rows whose last
//! column is the URL (the `vc,startup` layout written by the discovery scripts).

use crate::url::parse_web_url;
use crate::ConfigError;
use std::io::Read;
use std::path::Path;

/// Loads seed URLs from a file
///
/// # Arguments
///
/// * `path` - Path to the seed file
///
/// # Returns
///
/// * `Ok(Vec<String>)` - Valid seed URLs in file order
/// * `Err(ConfigError)` - The file could not be read
pub fn load_seeds(path: &Path) -> Result<Vec<String>, ConfigError> {
    let file = std::fs::File::open(path)?;
    parse_seeds(file)
}

/// Reads seed URLs from any reader
///
/// Blank lines, `#` comments and rows whose last column is not an absolute
/// `http`/`https` URL (such as a header row) are skipped. Duplicates are kept.
///
/// # Example
///
/// ```
/// use vc_harvester::config::parse_seeds;
///
/// let input = "vc,startup\nhttps://btn.vc/portfolio/,https://btn.vc/portfolio/hivewealth-2/\n";
/// let seeds = parse_seeds(input.as_bytes()).unwrap();
/// assert_eq!(seeds, vec!["https://btn.vc/portfolio/hivewealth-2/".to_string()]);
/// ```
pub fn parse_seeds<R: Read>(reader: R) -> Result<Vec<String>, ConfigError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut seeds = Vec::new();
    for (index, row) in csv_reader.records().enumerate() {
        let row = row?;
        let candidate = match row.iter().rev().find(|field| !field.is_empty()) {
            Some(field) => field,
            None => continue,
        };

        match parse_web_url(candidate) {
            Ok(_) => seeds.push(candidate.to_string()),
            Err(e) if index == 0 => {
                tracing::debug!("Skipping seed header row '{}': {}", candidate, e);
            }
            Err(e) => {
                tracing::warn!("Skipping invalid seed '{}': {}", candidate, e);
            }
        }
    }

    Ok(seeds)
}
