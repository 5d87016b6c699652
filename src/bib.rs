//! Minimal BibTeX reader for the bibliography behind process sources.
//!
//! Supports `@type{key, field = {value}, field = "value", field = 2017}`
//! entries with nested braces. `@comment`, `@string` and `@preamble` blocks
//! are skipped; string concatenation with `#` is not supported.

use anyhow::{Result, bail};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static ENTRY_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@\s*([A-Za-z]+)\s*\{\s*([^,\s{}]*)\s*,?").expect("static regex")
});

static FIELD_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z][\w:-]*)\s*=\s*").expect("static regex"));

#[derive(Debug, Clone, PartialEq)]
pub struct BibEntry {
    pub entry_type: String,
    pub key: String,
    /// Field names are lower-cased.
    pub fields: BTreeMap<String, String>,
}

impl BibEntry {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(&field.to_ascii_lowercase()).map(String::as_str)
    }
}

/// Parses every entry in `input`, keyed by citation key.
///
/// # Errors
///
/// Fails on unbalanced braces, unterminated strings, malformed fields and
/// duplicate keys.
pub fn parse_bib(input: &str) -> Result<BTreeMap<String, BibEntry>> {
    let mut entries = BTreeMap::new();
    let mut pos = 0;

    while let Some(caps) = ENTRY_HEADER.captures_at(input, pos) {
        let whole = caps.get(0).map(|m| (m.start(), m.end())).unwrap_or((pos, pos));
        let entry_type = caps[1].to_ascii_lowercase();

        if matches!(entry_type.as_str(), "comment" | "string" | "preamble") {
            // skip to the brace that closes this block
            let open = input[whole.0..].find('{').map(|i| whole.0 + i).unwrap_or(whole.1);
            pos = skip_braced(input, open)?;
            continue;
        }

        let key = caps[2].to_string();
        if key.is_empty() {
            bail!("Entry at byte {} has no citation key", whole.0);
        }

        let (fields, end) = parse_fields(input, whole.1)?;
        if entries.contains_key(&key) {
            bail!("Duplicate bibliography key '{key}'");
        }
        entries.insert(
            key.clone(),
            BibEntry {
                entry_type,
                key,
                fields,
            },
        );
        pos = end;
    }

    Ok(entries)
}

/// Returns the index just past the brace matching the `{` at `open`.
fn skip_braced(input: &str, open: usize) -> Result<usize> {
    let mut depth = 0usize;
    for (i, b) in input.bytes().enumerate().skip(open) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Ok(i + 1);
                }
            }
            _ => {}
        }
    }
    bail!("Unbalanced braces starting at byte {open}")
}

fn parse_fields(input: &str, mut pos: usize) -> Result<(BTreeMap<String, String>, usize)> {
    let bytes = input.as_bytes();
    let mut fields = BTreeMap::new();

    loop {
        while pos < bytes.len() && (bytes[pos].is_ascii_whitespace() || bytes[pos] == b',') {
            pos += 1;
        }
        if pos >= bytes.len() {
            bail!("Unterminated entry");
        }
        if bytes[pos] == b'}' {
            return Ok((fields, pos + 1));
        }

        let Some(caps) = FIELD_NAME.captures(&input[pos..]) else {
            bail!("Malformed field at byte {pos}");
        };
        let name = caps[1].to_ascii_lowercase();
        pos += caps[0].len();

        let (value, next) = match bytes.get(pos) {
            Some(b'{') => {
                let end = skip_braced(input, pos)?;
                (input[pos + 1..end - 1].to_string(), end)
            }
            Some(b'"') => {
                let close = quoted_end(bytes, pos)?;
                (input[pos + 1..close].to_string(), close + 1)
            }
            Some(_) => {
                let end = input[pos..]
                    .find([',', '}'])
                    .map(|i| pos + i)
                    .unwrap_or(bytes.len());
                (input[pos..end].trim().to_string(), end)
            }
            None => bail!("Field '{name}' has no value"),
        };

        fields.insert(name, clean(&value));
        pos = next;
    }
}

fn quoted_end(bytes: &[u8], open: usize) -> Result<usize> {
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate().skip(open + 1) {
        match b {
            b'{' => depth += 1,
            b'}' => depth = depth.saturating_sub(1),
            b'"' if depth == 0 && bytes[i - 1] != b'\\' => return Ok(i),
            _ => {}
        }
    }
    bail!("Unterminated string starting at byte {open}")
}

/// Drops grouping braces and collapses whitespace.
fn clean(value: &str) -> String {
    value
        .replace(['{', '}'], "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
@comment{ generated by hand, {nested} }

@misc{census_cfs_2017,
  author = {{U.S. Census Bureau}},
  title = "2017 Commodity Flow Survey Public Use File",
  year = 2017,
  url = {https://www.census.gov/data/datasets/2017/econ/cfs/historical-datasets.html}
}

@TechReport{ ingwersen_2012,
  Author = {Ingwersen, Wesley W. and Others},
  Title = {Life cycle assessment of {US} freight},
  institution = {EPA},
  year = {2012},
}
"#;

    #[test]
    fn test_parse_entries() {
        let entries = parse_bib(SAMPLE).unwrap();
        assert_eq!(entries.len(), 2);

        let cfs = &entries["census_cfs_2017"];
        assert_eq!(cfs.entry_type, "misc");
        assert_eq!(cfs.get("author"), Some("U.S. Census Bureau"));
        assert_eq!(
            cfs.get("title"),
            Some("2017 Commodity Flow Survey Public Use File")
        );
        assert_eq!(cfs.get("year"), Some("2017"));
        assert!(cfs.get("url").unwrap().starts_with("https://www.census.gov"));

        let report = &entries["ingwersen_2012"];
        assert_eq!(report.entry_type, "techreport");
        assert_eq!(report.get("Title"), Some("Life cycle assessment of US freight"));
        assert_eq!(report.get("institution"), Some("EPA"));
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_bib("").unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_key() {
        let input = "@misc{a, title={x}}\n@misc{a, title={y}}";
        assert!(parse_bib(input).is_err());
    }

    #[test]
    fn test_unbalanced() {
        assert!(parse_bib("@misc{a, title={x}").is_err());
        assert!(parse_bib("@misc{a, title=\"x}").is_err());
    }
}
