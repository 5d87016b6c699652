//! Units and the flow properties they belong to.
//!
//! Exchanges reference both a unit and a flow property by id. The built-in
//! entries point at openLCA reference data; the flow metadata file can add
//! or override entries under `Units`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ids::make_uuid;
use super::schema::Ref;

const MASS_PROPERTY_ID: &str = "93a60a56-a3c8-11da-a746-0800200b9a66";
const KG_UNIT_ID: &str = "20aadc24-a391-41cf-b340-3e4529f44bde";
const GOODS_TRANSPORT_PROPERTY_ID: &str = "838aaa23-0117-11db-92e3-0800200c9a66";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSpec {
    pub name: String,
    pub unit_id: String,
    pub flow_property: String,
    pub flow_property_id: String,
}

impl UnitSpec {
    pub fn unit_ref(&self) -> Ref {
        Ref::new("Unit", &self.unit_id, &self.name)
    }

    pub fn flow_property_ref(&self) -> Ref {
        Ref::new("FlowProperty", &self.flow_property_id, &self.flow_property)
    }
}

#[derive(Debug, Clone)]
pub struct UnitTable {
    units: BTreeMap<String, UnitSpec>,
}

impl Default for UnitTable {
    fn default() -> Self {
        let builtin = [
            UnitSpec {
                name: "kg".into(),
                unit_id: KG_UNIT_ID.into(),
                flow_property: "Mass".into(),
                flow_property_id: MASS_PROPERTY_ID.into(),
            },
            UnitSpec {
                name: "kg*km".into(),
                unit_id: make_uuid(["unit", "kg*km"]),
                flow_property: "Goods transport (mass*distance)".into(),
                flow_property_id: GOODS_TRANSPORT_PROPERTY_ID.into(),
            },
        ];

        Self {
            units: builtin.into_iter().map(|u| (u.name.clone(), u)).collect(),
        }
    }
}

impl UnitTable {
    /// Built-in units, with `overrides` replacing entries of the same name.
    pub fn with_overrides(overrides: &[UnitSpec]) -> Self {
        let mut table = Self::default();
        for spec in overrides {
            table.units.insert(spec.name.clone(), spec.clone());
        }
        table
    }

    pub fn get(&self, name: &str) -> Option<&UnitSpec> {
        self.units.get(name)
    }
}
