use anyhow::{Result, anyhow};
use std::collections::BTreeMap;

use super::exchange::ExchangeRow;
use super::schema::{
    Actor, DqSystem, Exchange, Flow, Location, Process, ProcessDocumentation, ProcessType, Ref,
    RootEntity, Source, category_path,
};
use super::units::UnitTable;
use crate::meta::ProcessMeta;

/// Objects processes refer to, keyed the way the exchange table and the
/// process metadata name them.
pub struct SupportObjects<'a> {
    pub flows: &'a BTreeMap<String, Flow>,
    pub units: &'a UnitTable,
    /// Keyed by location code.
    pub locations: &'a BTreeMap<String, Location>,
    /// Keyed by bibliography key.
    pub sources: &'a BTreeMap<String, Source>,
    /// Keyed by actor key.
    pub actors: &'a BTreeMap<String, Actor>,
    pub process_dq_system: &'a DqSystem,
    pub flow_dq_system: &'a DqSystem,
}

fn lookup<'m, T: RootEntity>(
    map: &'m BTreeMap<String, T>,
    key: Option<&str>,
    what: &str,
) -> Result<Option<Ref>> {
    match key {
        None => Ok(None),
        Some(k) => map
            .get(k)
            .map(|o| Some(o.to_ref()))
            .ok_or_else(|| anyhow!("Unknown {what} '{k}'")),
    }
}

fn documentation(meta: &ProcessMeta, objs: &SupportObjects<'_>) -> Result<ProcessDocumentation> {
    let sources = meta
        .sources
        .iter()
        .map(|key| {
            objs.sources
                .get(key)
                .map(RootEntity::to_ref)
                .ok_or_else(|| anyhow!("Unknown source '{key}'"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ProcessDocumentation {
        valid_from: meta.valid_from.clone(),
        valid_until: meta.valid_until.clone(),
        time_description: meta.time_description.clone(),
        geography_description: meta.geography_description.clone(),
        technology_description: meta.technology_description.clone(),
        intended_application: meta.intended_application.clone(),
        data_treatment_description: meta.data_treatment_description.clone(),
        sampling_description: meta.sampling_description.clone(),
        data_selection_description: meta.data_selection_description.clone(),
        inventory_method_description: meta.inventory_method_description.clone(),
        modeling_constants_description: meta.modeling_constants_description.clone(),
        completeness_description: meta.completeness_description.clone(),
        project_description: meta.project_description.clone(),
        use_advice: meta.use_advice.clone(),
        access_restrictions: meta.access_restrictions.clone(),
        data_generator: lookup(objs.actors, meta.data_generator.as_deref(), "actor")?,
        data_documentor: lookup(objs.actors, meta.data_documentor.as_deref(), "actor")?,
        data_set_owner: lookup(objs.actors, meta.data_set_owner.as_deref(), "actor")?,
        publication: lookup(objs.sources, meta.publication.as_deref(), "source")?,
        sources,
        creation_date: meta.creation_date.clone(),
        is_copyright_protected: meta.copyright,
    })
}

/// Builds one unit process from its slice of the exchange table.
///
/// `rows` must all share one process id and contain the reference exchange.
/// Exchanges are numbered from 1 in row order; inputs with a default
/// provider reference it.
pub fn build_process(
    rows: &[ExchangeRow],
    meta: &ProcessMeta,
    objs: &SupportObjects<'_>,
    last_change: &str,
) -> Result<Process> {
    let first = rows
        .first()
        .ok_or_else(|| anyhow!("Cannot build a process without exchanges"))?;

    let location = objs
        .locations
        .get(&first.location)
        .ok_or_else(|| anyhow!("Unknown location '{}'", first.location))?;

    let mut exchanges = Vec::with_capacity(rows.len());
    for (row, internal_id) in rows.iter().zip(1u32..) {
        let flow = objs
            .flows
            .get(&row.flow_uuid)
            .ok_or_else(|| anyhow!("Flow {} ({}) was not built", row.flow_name, row.flow_uuid))?;
        let unit = objs
            .units
            .get(&row.unit)
            .ok_or_else(|| anyhow!("Unknown unit '{}'", row.unit))?;

        let default_provider = match (&row.default_provider, row.is_input) {
            (Some(id), true) => Some(Ref::new(
                Process::MODEL_TYPE,
                id,
                row.default_provider_name.as_deref().unwrap_or_default(),
            )),
            _ => None,
        };

        exchanges.push(Exchange {
            model_type: "Exchange".into(),
            internal_id,
            amount: row.amount,
            is_input: row.is_input,
            is_quantitative_reference: row.reference,
            is_avoided_product: row.avoided_product,
            flow: flow.to_ref(),
            flow_property: unit.flow_property_ref(),
            unit: unit.unit_ref(),
            default_provider,
            dq_entry: row.exchange_dqi.clone(),
            location: None,
            description: None,
        });
    }

    Ok(Process {
        model_type: Process::MODEL_TYPE.into(),
        id: first.process_id.clone(),
        name: first.process_name.clone(),
        category: category_path(&first.process_category),
        description: meta.description.clone(),
        version: meta.version.clone().unwrap_or_else(|| "00.00.001".into()),
        last_change: last_change.to_string(),
        process_type: ProcessType::UnitProcess,
        location: Some(location.to_ref()),
        process_documentation: documentation(meta, objs)?,
        dq_system: Some(objs.process_dq_system.to_ref()),
        dq_entry: meta.dq_entry.clone(),
        exchange_dq_system: Some(objs.flow_dq_system.to_ref()),
        last_internal_id: exchanges.len() as u32,
        exchanges,
    })
}
