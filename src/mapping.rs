//! Transport mode → target technosphere flow mapping.
//!
//! Each row of `transport_mapping.csv` maps one transport mode of the
//! distance table onto an existing transport flow in the target database,
//! together with the process that provides it.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::olca::flows::new_flow;
use crate::olca::make_uuid;
use crate::olca::schema::{Flow, Ref};
use crate::olca::units::UnitTable;

pub const MAPPING_FILE: &str = "transport_mapping.csv";

#[derive(Debug, Clone, Deserialize)]
pub struct MappingRow {
    #[serde(rename = "SourceFlowName")]
    pub source_flow_name: String,
    #[serde(rename = "TargetFlowName")]
    pub target_flow_name: String,
    #[serde(rename = "TargetFlowUUID")]
    pub target_flow_uuid: String,
    #[serde(rename = "TargetFlowContext")]
    pub target_flow_context: String,
    #[serde(rename = "TargetUnit")]
    pub target_unit: String,
    #[serde(rename = "Provider")]
    pub provider: String,
    #[serde(rename = "ProviderUUID", default)]
    pub provider_uuid: Option<String>,
}

/// Target flow details for one source name.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedFlow {
    pub name: String,
    pub id: String,
    pub provider: String,
    pub context: String,
    pub unit: String,
}

#[derive(Debug, Clone, Default)]
pub struct FlowMappings {
    /// Keyed by source name (transport mode).
    pub flow_dict: BTreeMap<String, MappedFlow>,
    /// Target flow objects, keyed by source name.
    pub flow_objs: BTreeMap<String, Flow>,
    /// Provider process reference, keyed by target flow name.
    pub provider_dict: BTreeMap<String, Ref>,
}

impl FlowMappings {
    pub fn load(path: &Path, units: &UnitTable, last_change: &str) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(file);

        let mut rows = Vec::new();
        for result in rdr.deserialize() {
            let row: MappingRow = result.with_context(|| format!("Invalid {}", path.display()))?;
            rows.push(row);
        }

        Self::from_rows(&rows, units, last_change)
    }

    /// Builds the lookup tables from mapping rows.
    ///
    /// # Errors
    ///
    /// Fails on a duplicate source name or a unit missing from `units`.
    pub fn from_rows(rows: &[MappingRow], units: &UnitTable, last_change: &str) -> Result<Self> {
        let mut mappings = Self::default();

        for row in rows {
            if mappings.flow_dict.contains_key(&row.source_flow_name) {
                bail!("Duplicate mapping for '{}'", row.source_flow_name);
            }
            let Some(unit) = units.get(&row.target_unit) else {
                bail!(
                    "Unknown unit '{}' in mapping for '{}'",
                    row.target_unit,
                    row.source_flow_name
                );
            };

            let provider_id = match row.provider_uuid.as_deref() {
                Some(id) if !id.is_empty() => id.to_string(),
                _ => make_uuid([row.provider.as_str()]),
            };

            mappings.flow_dict.insert(
                row.source_flow_name.clone(),
                MappedFlow {
                    name: row.target_flow_name.clone(),
                    id: row.target_flow_uuid.clone(),
                    provider: row.provider.clone(),
                    context: row.target_flow_context.clone(),
                    unit: row.target_unit.clone(),
                },
            );
            mappings.flow_objs.insert(
                row.source_flow_name.clone(),
                new_flow(
                    &row.target_flow_uuid,
                    &row.target_flow_name,
                    &row.target_flow_context,
                    unit,
                    last_change,
                ),
            );
            mappings.provider_dict.insert(
                row.target_flow_name.clone(),
                Ref::new("Process", &provider_id, &row.provider),
            );
        }

        Ok(mappings)
    }

    pub fn get(&self, source: &str) -> Option<&MappedFlow> {
        self.flow_dict.get(source)
    }

    /// Mapped flow objects keyed by flow id.
    pub fn flows_by_id(&self) -> BTreeMap<String, Flow> {
        self.flow_objs
            .values()
            .map(|f| (f.id.clone(), f.clone()))
            .collect()
    }
}
