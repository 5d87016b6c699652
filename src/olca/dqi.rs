//! Data quality systems and entries.

use anyhow::{Result, anyhow, bail};
use serde_yaml::{Mapping, Value};

use super::ids::make_uuid;
use super::schema::{DqIndicator, DqScore, DqSystem};

pub const FLOW_PEDIGREE: &str = "US EPA - Flow Pedigree Matrix";
pub const PROCESS_PEDIGREE: &str = "US EPA - Process Pedigree Matrix";

static FLOW_INDICATORS: &[(&str, [&str; 5])] = &[
    (
        "Flow reliability",
        [
            "Verified data based on measurements",
            "Verified data based on a calculation",
            "Non-verified data based on a calculation",
            "Documented estimate",
            "Undocumented estimate",
        ],
    ),
    (
        "Temporal correlation",
        [
            "Less than 3 years of difference",
            "Less than 6 years of difference",
            "Less than 10 years of difference",
            "Less than 15 years of difference",
            "Age of data unknown or more than 15 years of difference",
        ],
    ),
    (
        "Geographical correlation",
        [
            "Data from same resolution and same area of study",
            "Within one level of resolution and a related area of study",
            "Within two levels of resolution and a related area of study",
            "Outside of two levels of resolution but a related area of study",
            "From a different or unknown area of study",
        ],
    ),
    (
        "Technological correlation",
        [
            "All technology categories are equivalent",
            "Three of the technology categories are equivalent",
            "Two of the technology categories are equivalent",
            "One of the technology categories is equivalent",
            "None of the technology categories are equivalent",
        ],
    ),
    (
        "Data collection methods",
        [
            "Representative data from >80% of the relevant sites",
            "Representative data from 60-79% of the relevant sites",
            "Representative data from 40-59% of the relevant sites",
            "Representative data from <40% of the relevant sites",
            "Unknown or data from a small number of sites",
        ],
    ),
];

static PROCESS_INDICATORS: &[(&str, [&str; 5])] = &[
    (
        "Process review",
        [
            "Documented reviews by a minimum of two types of critical reviewers",
            "Documented review by a third-party reviewer",
            "Documented review by an internal reviewer",
            "Undocumented review",
            "No review",
        ],
    ),
    (
        "Process completeness",
        [
            ">80% of determined flows have been evaluated and given a value",
            "60-79% of determined flows have been evaluated and given a value",
            "40-59% of determined flows have been evaluated and given a value",
            "<40% of determined flows have been evaluated and given a value",
            "Process completeness not scored",
        ],
    ),
];

fn build_system(name: &str, indicators: &[(&str, [&str; 5])]) -> DqSystem {
    let indicators = indicators
        .iter()
        .zip(1u8..)
        .map(|((indicator, labels), position)| DqIndicator {
            name: indicator.to_string(),
            position,
            scores: labels
                .iter()
                .zip(1u8..)
                .map(|(label, score)| DqScore {
                    position: score,
                    label: score.to_string(),
                    description: label.to_string(),
                    uncertainty: 0.0,
                })
                .collect(),
        })
        .collect();

    DqSystem {
        model_type: "DQSystem".into(),
        id: make_uuid([name]),
        name: name.to_string(),
        has_uncertainties: false,
        indicators,
    }
}

/// Looks up a built-in data quality system by name.
pub fn dq_system(name: &str) -> Result<DqSystem> {
    match name {
        FLOW_PEDIGREE => Ok(build_system(FLOW_PEDIGREE, FLOW_INDICATORS)),
        PROCESS_PEDIGREE => Ok(build_system(PROCESS_PEDIGREE, PROCESS_INDICATORS)),
        other => Err(anyhow!("Unknown data quality system '{other}'")),
    }
}

/// Formats ordered indicator scores as an openLCA DQ entry, e.g. `(1;2;3;4;5)`.
///
/// # Errors
///
/// Fails on an empty map or a score outside 1..=5.
pub fn format_dqi_score(scores: &Mapping) -> Result<String> {
    if scores.is_empty() {
        bail!("Data quality scores are empty");
    }

    let mut parts = Vec::with_capacity(scores.len());
    for (indicator, value) in scores {
        let score = match value {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        match score {
            Some(s @ 1..=5) => parts.push(s.to_string()),
            _ => bail!(
                "Invalid score {:?} for indicator {:?}; expected 1-5",
                value,
                indicator
            ),
        }
    }

    Ok(format!("({})", parts.join(";")))
}

/// Checks that a DQ entry has one score per indicator of `system`.
pub fn check_entry(entry: &str, system: &DqSystem) -> Result<()> {
    let inner = entry
        .strip_prefix('(')
        .and_then(|e| e.strip_suffix(')'))
        .ok_or_else(|| anyhow!("Malformed DQ entry '{entry}'"))?;
    let count = inner.split(';').count();
    if count != system.indicators.len() {
        bail!(
            "DQ entry '{}' has {} scores but '{}' has {} indicators",
            entry,
            count,
            system.name,
            system.indicators.len()
        );
    }
    Ok(())
}
