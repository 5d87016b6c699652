use anyhow::{Result, anyhow};
use std::collections::{BTreeMap, HashSet};
use tracing::warn;

use super::exchange::ExchangeRow;
use super::schema::{Flow, FlowPropertyFactor, FlowType, category_path};
use super::units::{UnitSpec, UnitTable};

/// Version stamped on flows created by the builder.
pub const FLOW_VERSION: &str = "00.00.001";

/// Flows keyed by id, plus the ids of flows not supplied by the mapping.
#[derive(Debug, Clone, Default)]
pub struct FlowSet {
    pub flows: BTreeMap<String, Flow>,
    pub new_flows: Vec<String>,
}

/// Builds a product flow with a single reference flow property.
pub fn new_flow(
    id: &str,
    name: &str,
    context: &str,
    unit: &UnitSpec,
    last_change: &str,
) -> Flow {
    Flow {
        model_type: "Flow".into(),
        id: id.to_string(),
        name: name.to_string(),
        category: category_path(context),
        description: None,
        version: FLOW_VERSION.into(),
        last_change: last_change.to_string(),
        flow_type: FlowType::ProductFlow,
        flow_properties: vec![FlowPropertyFactor {
            model_type: "FlowPropertyFactor".into(),
            is_ref_flow_property: true,
            conversion_factor: 1.0,
            flow_property: unit.flow_property_ref(),
        }],
    }
}

/// Builds one flow per distinct `FlowUUID` in the exchange table.
///
/// The first row seen for an id determines the flow's name, category and
/// reference unit. Flows whose id is not in `mapped_ids` are reported as new.
pub fn build_flow_dict(
    rows: &[ExchangeRow],
    units: &UnitTable,
    mapped_ids: &HashSet<String>,
    last_change: &str,
) -> Result<FlowSet> {
    let mut set = FlowSet::default();

    for row in rows {
        if set.flows.contains_key(&row.flow_uuid) {
            continue;
        }

        let unit = units
            .get(&row.unit)
            .ok_or_else(|| anyhow!("Unknown unit '{}' for flow {}", row.unit, row.flow_name))?;
        let mut flow = new_flow(&row.flow_uuid, &row.flow_name, &row.context, unit, last_change);
        flow.flow_type = row.flow_type;

        if !mapped_ids.contains(&row.flow_uuid) {
            set.new_flows.push(row.flow_uuid.clone());
        }
        set.flows.insert(row.flow_uuid.clone(), flow);
    }

    Ok(set)
}

/// Replaces built flows with their mapped counterparts.
///
/// When a mapped flow's id is not among the built flows the two sets are
/// out of step; a warning is logged and the built flows are kept as-is.
/// Returns whether the replacement happened.
pub fn merge_mapped_flows(set: &mut FlowSet, mapped: &BTreeMap<String, Flow>) -> bool {
    let unknown: Vec<&str> = mapped
        .keys()
        .filter(|id| !set.flows.contains_key(*id))
        .map(String::as_str)
        .collect();

    if !unknown.is_empty() {
        warn!(?unknown, "Warning, some flows not consistent");
        return false;
    }

    for (id, flow) in mapped {
        set.flows.insert(id.clone(), flow.clone());
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::olca::exchange::tests::{input_row, reference_row};

    const STAMP: &str = "2026-01-01T00:00:00Z";

    fn mapped_ids() -> HashSet<String> {
        ["flow-truck".to_string()].into_iter().collect()
    }

    #[test]
    fn test_one_flow_per_id() {
        let rows = vec![
            input_row("p1"),
            reference_row("p1"),
            input_row("p2"),
            reference_row("p2"),
        ];
        let set = build_flow_dict(&rows, &UnitTable::default(), &mapped_ids(), STAMP).unwrap();

        assert_eq!(set.flows.len(), 2);
        assert_eq!(set.new_flows, vec!["flow-ref".to_string()]);

        let truck = &set.flows["flow-truck"];
        assert_eq!(
            truck.category.as_deref(),
            Some("Technosphere Flows/48-49: Transportation and Warehousing")
        );
        assert_eq!(
            truck.flow_properties[0].flow_property.name.as_deref(),
            Some("Goods transport (mass*distance)")
        );
        assert_eq!(
            set.flows["flow-ref"].flow_properties[0].flow_property.name.as_deref(),
            Some("Mass")
        );
    }

    #[test]
    fn test_merge_replaces_consistent_flows() {
        let rows = vec![input_row("p1"), reference_row("p1")];
        let mut set = build_flow_dict(&rows, &UnitTable::default(), &mapped_ids(), STAMP).unwrap();

        let mut mapped_flow = set.flows["flow-truck"].clone();
        mapped_flow.description = Some("from mapping".into());
        let mapped: BTreeMap<_, _> = [("flow-truck".to_string(), mapped_flow)].into();

        assert!(merge_mapped_flows(&mut set, &mapped));
        assert_eq!(
            set.flows["flow-truck"].description.as_deref(),
            Some("from mapping")
        );
    }

    #[test]
    fn test_merge_skips_inconsistent_flows() {
        let rows = vec![input_row("p1"), reference_row("p1")];
        let mut set = build_flow_dict(&rows, &UnitTable::default(), &mapped_ids(), STAMP).unwrap();
        let before = set.flows.clone();

        let mut stray = before["flow-truck"].clone();
        stray.id = "flow-rail".into();
        let mapped: BTreeMap<_, _> = [("flow-rail".to_string(), stray)].into();

        assert!(!merge_mapped_flows(&mut set, &mapped));
        assert_eq!(set.flows, before);
    }
}
