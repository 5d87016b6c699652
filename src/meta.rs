//! Flow and process metadata files.
//!
//! `transport_flow_meta.yaml` carries the process category, data quality
//! settings and optional unit overrides. `transport_process_meta.yaml` is a
//! template of process documentation; its top-level strings may contain
//! `[COMMODITY]`, `[SCTG]` and `[YEAR]` placeholders that are filled per
//! process.

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::path::Path;

use crate::bib::BibEntry;
use crate::olca::make_uuid;
use crate::olca::schema::{Actor, Source};
use crate::olca::units::UnitSpec;

pub const FLOW_META_FILE: &str = "transport_flow_meta.yaml";
pub const PROCESS_META_FILE: &str = "transport_process_meta.yaml";
pub const SOURCES_FILE: &str = "transport_sources.bib";

#[derive(Debug, Clone, Deserialize)]
pub struct DqSystemNames {
    #[serde(rename = "Flow")]
    pub flow: String,
    #[serde(rename = "Process")]
    pub process: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DqiMeta {
    #[serde(rename = "dqSystem")]
    pub dq_system: DqSystemNames,
    /// Exchange scores, in indicator order.
    #[serde(rename = "Flow")]
    pub flow: Mapping,
    /// Process scores, in indicator order.
    #[serde(rename = "Process")]
    pub process: Mapping,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlowMeta {
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "DQI")]
    pub dqi: DqiMeta,
    #[serde(rename = "Units", default)]
    pub units: Vec<UnitSpec>,
}

impl FlowMeta {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_yaml::from_str(&content).with_context(|| format!("Invalid {}", path.display()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ActorMeta {
    pub name: String,
    pub email: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
}

/// Process documentation for one process, after placeholder substitution.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProcessMeta {
    pub description: Option<String>,
    pub version: Option<String>,
    pub valid_from: Option<String>,
    pub valid_until: Option<String>,
    pub time_description: Option<String>,
    pub geography_description: Option<String>,
    pub technology_description: Option<String>,
    pub intended_application: Option<String>,
    pub data_treatment_description: Option<String>,
    pub sampling_description: Option<String>,
    pub data_selection_description: Option<String>,
    pub inventory_method_description: Option<String>,
    pub modeling_constants_description: Option<String>,
    pub completeness_description: Option<String>,
    pub project_description: Option<String>,
    pub use_advice: Option<String>,
    pub access_restrictions: Option<String>,
    pub creation_date: Option<String>,
    pub copyright: bool,
    /// Actor keys.
    pub data_generator: Option<String>,
    pub data_documentor: Option<String>,
    pub data_set_owner: Option<String>,
    /// Bibliography keys.
    pub publication: Option<String>,
    pub sources: Vec<String>,
    pub actors: BTreeMap<String, ActorMeta>,
    /// Process-level data quality entry, e.g. `(2;4)`.
    pub dq_entry: Option<String>,
}

/// The process metadata file before per-process substitution.
#[derive(Debug, Clone)]
pub struct ProcessMetaTemplate {
    raw: Mapping,
}

impl ProcessMetaTemplate {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("Invalid {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let raw: Mapping = serde_yaml::from_str(content)?;
        let template = Self { raw };
        // fail early on type errors rather than once per commodity
        template.parse()?;
        Ok(template)
    }

    /// Sets a top-level string value.
    pub fn set(&mut self, key: &str, value: &str) {
        self.raw
            .insert(Value::String(key.into()), Value::String(value.into()));
    }

    fn replace_all(raw: &mut Mapping, from: &str, to: &str) {
        for (_, value) in raw.iter_mut() {
            if let Value::String(s) = value {
                if s.contains(from) {
                    *s = s.replace(from, to);
                }
            }
        }
    }

    /// Fills the validity window from `year` when it is not given, and
    /// substitutes `[YEAR]`.
    pub fn assign_year(&mut self, year: i32) {
        for (key, default) in [
            ("valid_from", format!("{year}-01-01")),
            ("valid_until", format!("{year}-12-31")),
        ] {
            let k = Value::String(key.into());
            if !self.raw.contains_key(&k) {
                self.raw.insert(k, Value::String(default));
            }
        }
        Self::replace_all(&mut self.raw, "[YEAR]", &year.to_string());
    }

    /// The template as-is, placeholders untouched.
    pub fn parse(&self) -> Result<ProcessMeta> {
        Ok(serde_yaml::from_value(Value::Mapping(self.raw.clone()))?)
    }

    /// A copy with `[COMMODITY]` and `[SCTG]` replaced in every top-level
    /// string value.
    pub fn for_commodity(&self, commodity: &str, sctg: &str) -> Result<ProcessMeta> {
        let mut raw = self.raw.clone();
        Self::replace_all(&mut raw, "[COMMODITY]", commodity);
        Self::replace_all(&mut raw, "[SCTG]", sctg);
        Ok(serde_yaml::from_value(Value::Mapping(raw))?)
    }
}

fn source_from_entry(entry: &BibEntry) -> Source {
    let title = entry.get("title").unwrap_or(entry.key.as_str());
    let year = entry.get("year").and_then(|y| y.trim().parse::<i32>().ok());

    let mut text = String::new();
    if let Some(author) = entry.get("author") {
        text.push_str(author);
        text.push(' ');
    }
    if let Some(y) = year {
        text.push_str(&format!("({y}). "));
    }
    text.push_str(title);
    text.push('.');
    if let Some(publisher) = entry
        .get("publisher")
        .or_else(|| entry.get("institution"))
        .or_else(|| entry.get("journal"))
    {
        text.push(' ');
        text.push_str(publisher);
        text.push('.');
    }

    Source {
        model_type: "Source".into(),
        id: make_uuid([entry.key.as_str()]),
        name: title.to_string(),
        text_reference: Some(text),
        url: entry.get("url").map(str::to_string),
        year,
    }
}

/// Builds Source objects for every bibliography key the metadata names,
/// keyed by that bib key.
pub fn extract_sources(
    meta: &ProcessMeta,
    bib: &BTreeMap<String, BibEntry>,
) -> Result<BTreeMap<String, Source>> {
    let keys = meta.sources.iter().chain(meta.publication.iter());

    let mut sources = BTreeMap::new();
    for key in keys {
        let entry = bib
            .get(key)
            .ok_or_else(|| anyhow!("Source '{key}' not found in bibliography"))?;
        sources.insert(key.clone(), source_from_entry(entry));
    }
    Ok(sources)
}

/// Builds Actor objects for the actors the documentation fields reference,
/// keyed by actor key.
pub fn extract_actors(meta: &ProcessMeta) -> Result<BTreeMap<String, Actor>> {
    let keys = [
        &meta.data_generator,
        &meta.data_documentor,
        &meta.data_set_owner,
    ];

    let mut actors = BTreeMap::new();
    for key in keys.into_iter().flatten() {
        let actor = meta
            .actors
            .get(key)
            .ok_or_else(|| anyhow!("Actor '{key}' is referenced but not defined"))?;
        let name = if actor.name.is_empty() { key } else { &actor.name };

        actors.insert(
            key.clone(),
            Actor {
                model_type: "Actor".into(),
                id: make_uuid([name.as_str()]),
                name: name.clone(),
                email: actor.email.clone(),
                website: actor.website.clone(),
                address: actor.address.clone(),
            },
        );
    }
    Ok(actors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bib::parse_bib;

    const PROCESS_META: &str = r#"
description: "Average transport of [COMMODITY] (SCTG [SCTG]) in [YEAR]."
version: "00.01.000"
time_description: "Shipments during [YEAR]."
copyright: false
data_generator: erg
data_set_owner: epa
sources: [census_cfs_2017]
publication: census_cfs_2017
actors:
  erg:
    name: Eastern Research Group
    website: https://www.erg.com
  epa:
    name: US EPA
"#;

    const FLOW_META: &str = r#"
Category: "48-49: Transportation and Warehousing / Commodity Transport"
DQI:
  dqSystem:
    Flow: US EPA - Flow Pedigree Matrix
    Process: US EPA - Process Pedigree Matrix
  Flow:
    Flow reliability: 3
    Temporal correlation: 1
    Geographical correlation: 1
    Technological correlation: 3
    Data collection methods: 1
  Process:
    Process review: 4
    Process completeness: 2
"#;

    #[test]
    fn test_flow_meta() {
        let meta: FlowMeta = serde_yaml::from_str(FLOW_META).unwrap();
        assert_eq!(
            meta.category,
            "48-49: Transportation and Warehousing / Commodity Transport"
        );
        assert_eq!(meta.dqi.flow.len(), 5);
        assert_eq!(meta.dqi.dq_system.process, "US EPA - Process Pedigree Matrix");
        assert!(meta.units.is_empty());
    }

    #[test]
    fn test_for_commodity_replaces_placeholders() {
        let mut template = ProcessMetaTemplate::from_yaml(PROCESS_META).unwrap();
        template.assign_year(2017);

        let meta = template.for_commodity("Coal", "15").unwrap();
        assert_eq!(
            meta.description.as_deref(),
            Some("Average transport of Coal (SCTG 15) in 2017.")
        );
        assert_eq!(meta.time_description.as_deref(), Some("Shipments during 2017."));
        assert_eq!(meta.valid_from.as_deref(), Some("2017-01-01"));
        assert_eq!(meta.valid_until.as_deref(), Some("2017-12-31"));

        // the template itself is left untouched
        let again = template.for_commodity("Natural Sands", "11").unwrap();
        assert!(again.description.unwrap().contains("Natural Sands"));
    }

    #[test]
    fn test_assign_year_keeps_explicit_validity() {
        let mut template =
            ProcessMetaTemplate::from_yaml("valid_from: '2016-07-01'\n").unwrap();
        template.assign_year(2017);
        let meta = template.parse().unwrap();
        assert_eq!(meta.valid_from.as_deref(), Some("2016-07-01"));
        assert_eq!(meta.valid_until.as_deref(), Some("2017-12-31"));
    }

    #[test]
    fn test_template_rejects_bad_types() {
        assert!(ProcessMetaTemplate::from_yaml("sources: 12\n").is_err());
    }

    #[test]
    fn test_set_dq_entry() {
        let mut template = ProcessMetaTemplate::from_yaml(PROCESS_META).unwrap();
        template.set("dq_entry", "(4;2)");
        assert_eq!(template.parse().unwrap().dq_entry.as_deref(), Some("(4;2)"));
    }

    #[test]
    fn test_extract_sources_and_actors() {
        let meta = ProcessMetaTemplate::from_yaml(PROCESS_META)
            .unwrap()
            .parse()
            .unwrap();
        let bib = parse_bib(
            "@misc{census_cfs_2017, author={{U.S. Census Bureau}}, \
             title={2017 CFS Public Use File}, year={2020}, publisher={Census}}",
        )
        .unwrap();

        let sources = extract_sources(&meta, &bib).unwrap();
        assert_eq!(sources.len(), 1);
        let source = &sources["census_cfs_2017"];
        assert_eq!(source.name, "2017 CFS Public Use File");
        assert_eq!(source.year, Some(2020));
        assert_eq!(
            source.text_reference.as_deref(),
            Some("U.S. Census Bureau (2020). 2017 CFS Public Use File. Census.")
        );

        let actors = extract_actors(&meta).unwrap();
        assert_eq!(actors.len(), 2);
        assert_eq!(actors["erg"].name, "Eastern Research Group");
        assert_eq!(actors["erg"].id, make_uuid(["Eastern Research Group"]));
    }

    #[test]
    fn test_missing_references() {
        let meta = ProcessMeta {
            sources: vec!["nowhere".into()],
            data_generator: Some("ghost".into()),
            ..Default::default()
        };
        assert!(extract_sources(&meta, &BTreeMap::new()).is_err());
        assert!(extract_actors(&meta).is_err());
    }
}
