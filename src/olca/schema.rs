//! The subset of the openLCA JSON-LD (schema v2) object model written by
//! the builder.

use serde::{Deserialize, Serialize};

/// Flow classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowType {
    ProductFlow,
    ElementaryFlow,
    WasteFlow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessType {
    UnitProcess,
    LciResult,
}

/// A reference to another root entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ref {
    #[serde(rename = "@type")]
    pub model_type: String,
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Ref {
    pub fn new(model_type: &str, id: &str, name: &str) -> Self {
        Self {
            model_type: model_type.to_string(),
            id: id.to_string(),
            name: Some(name.to_string()),
            category: None,
        }
    }
}

/// Implemented by every root entity written to the archive.
pub trait RootEntity: Serialize {
    /// Folder name inside the JSON-LD zip.
    const FOLDER: &'static str;
    const MODEL_TYPE: &'static str;

    fn id(&self) -> &str;
    fn name(&self) -> &str;

    fn to_ref(&self) -> Ref {
        Ref::new(Self::MODEL_TYPE, self.id(), self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowPropertyFactor {
    #[serde(rename = "@type")]
    pub model_type: String,
    pub is_ref_flow_property: bool,
    pub conversion_factor: f64,
    pub flow_property: Ref,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flow {
    #[serde(rename = "@type")]
    pub model_type: String,
    #[serde(rename = "@id")]
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub version: String,
    pub last_change: String,
    pub flow_type: FlowType,
    pub flow_properties: Vec<FlowPropertyFactor>,
}

impl RootEntity for Flow {
    const FOLDER: &'static str = "flows";
    const MODEL_TYPE: &'static str = "Flow";

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn to_ref(&self) -> Ref {
        Ref {
            category: self.category.clone(),
            ..Ref::new(Self::MODEL_TYPE, &self.id, &self.name)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exchange {
    #[serde(rename = "@type")]
    pub model_type: String,
    pub internal_id: u32,
    pub amount: f64,
    pub is_input: bool,
    pub is_quantitative_reference: bool,
    pub is_avoided_product: bool,
    pub flow: Ref,
    pub flow_property: Ref,
    pub unit: Ref,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_provider: Option<Ref>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dq_entry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Ref>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessDocumentation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geography_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technology_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intended_application: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_treatment_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sampling_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_selection_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventory_method_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modeling_constants_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completeness_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_advice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_restrictions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_generator: Option<Ref>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_documentor: Option<Ref>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_set_owner: Option<Ref>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publication: Option<Ref>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub sources: Vec<Ref>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,
    pub is_copyright_protected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Process {
    #[serde(rename = "@type")]
    pub model_type: String,
    #[serde(rename = "@id")]
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub version: String,
    pub last_change: String,
    pub process_type: ProcessType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Ref>,
    pub process_documentation: ProcessDocumentation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dq_system: Option<Ref>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dq_entry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange_dq_system: Option<Ref>,
    pub exchanges: Vec<Exchange>,
    pub last_internal_id: u32,
}

impl RootEntity for Process {
    const FOLDER: &'static str = "processes";
    const MODEL_TYPE: &'static str = "Process";

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(rename = "@type")]
    pub model_type: String,
    #[serde(rename = "@id")]
    pub id: String,
    pub name: String,
    pub code: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl RootEntity for Location {
    const FOLDER: &'static str = "locations";
    const MODEL_TYPE: &'static str = "Location";

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    #[serde(rename = "@type")]
    pub model_type: String,
    #[serde(rename = "@id")]
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}

impl RootEntity for Source {
    const FOLDER: &'static str = "sources";
    const MODEL_TYPE: &'static str = "Source";

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    #[serde(rename = "@type")]
    pub model_type: String,
    #[serde(rename = "@id")]
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl RootEntity for Actor {
    const FOLDER: &'static str = "actors";
    const MODEL_TYPE: &'static str = "Actor";

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DqScore {
    pub position: u8,
    pub label: String,
    pub description: String,
    pub uncertainty: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DqIndicator {
    pub name: String,
    pub position: u8,
    pub scores: Vec<DqScore>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DqSystem {
    #[serde(rename = "@type")]
    pub model_type: String,
    #[serde(rename = "@id")]
    pub id: String,
    pub name: String,
    pub has_uncertainties: bool,
    pub indicators: Vec<DqIndicator>,
}

impl RootEntity for DqSystem {
    const FOLDER: &'static str = "dq_systems";
    const MODEL_TYPE: &'static str = "DQSystem";

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Converts a `" / "`-separated context such as
/// `"Technosphere Flows / 48-49: Transportation and Warehousing"` into an
/// openLCA category path.
pub fn category_path(context: &str) -> Option<String> {
    let parts: Vec<&str> = context
        .split('/')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}
