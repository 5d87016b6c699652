//! The two pipeline stages.
//!
//! [`calculate_distances`] turns CFS shipment records into the weighted
//! distance table; [`build_objects`] turns that table into openLCA unit
//! processes, one per commodity, written as a JSON-LD archive.

use anyhow::{Result, anyhow};
use chrono::{SecondsFormat, Utc};
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::analyzers::aggregate::aggregate_distances;
use crate::analyzers::types::{DistanceOptions, ModeDistance, SkipCounts};
use crate::bib::parse_bib;
use crate::config::Settings;
use crate::fetch::{Cache, HttpClient};
use crate::mapping::FlowMappings;
use crate::meta::{FlowMeta, ProcessMetaTemplate, extract_actors, extract_sources};
use crate::olca::dqi::{check_entry, dq_system, format_dqi_score};
use crate::olca::exchange::{ExchangeRow, validate_exchange_data};
use crate::olca::flows::{build_flow_dict, merge_mapped_flows};
use crate::olca::location::{build_location, country_code};
use crate::olca::make_uuid;
use crate::olca::process::{SupportObjects, build_process};
use crate::olca::schema::{FlowType, RootEntity};
use crate::olca::units::UnitTable;
use crate::olca::writer::{ObjectSet, write_objects};
use crate::output::{print_table, read_distances, write_distances};
use crate::parser::parse_records;
use crate::sctg;

pub const REF_FLOW_NAME: &str = "Commodity transport; at consumer";
const REF_FLOW_NAMESPACE: &str = "uslci-transport";
const PROCESS_NAME_PREFIX: &str = "Transport; average mix; ";
const INPUT_CONTEXT: &str = "Technosphere Flows / 48-49: Transportation and Warehousing";
const INPUT_UNIT: &str = "kg*km";
const REF_UNIT: &str = "kg";
const LOCATION: &str = "US";

/// Result of the distance-calculation stage.
#[derive(Debug, Clone)]
pub struct DistanceReport {
    pub records: usize,
    pub skipped: SkipCounts,
    pub rows: Vec<ModeDistance>,
    pub path: PathBuf,
}

/// Result of the object-building stage.
#[derive(Debug, Clone)]
pub struct BuildSummary {
    pub processes: usize,
    pub flows: usize,
    pub new_flows: usize,
    pub missing_codes: Vec<&'static str>,
    pub skipped_commodities: Vec<String>,
    pub archive: PathBuf,
}

/// Loads the CFS source (through the cache), aggregates it and writes the
/// weighted distance table into the data directory.
#[tracing::instrument(skip_all, fields(source = %settings.puf_source))]
pub async fn calculate_distances<C: HttpClient>(
    settings: &Settings,
    options: &DistanceOptions,
    client: &C,
    refresh: bool,
) -> Result<DistanceReport> {
    let cache = Cache::new(&settings.cache_dir).with_refresh(refresh);
    let bytes = cache.load_source(client, &settings.puf_source).await?;

    let records = parse_records(&bytes)?;
    info!(records = records.len(), "Parsed CFS records");

    let (rows, skipped) = aggregate_distances(&records, options);
    if rows.is_empty() {
        warn!("No shipments left after filtering; the distance table is empty");
    }

    let path = settings.distances_path();
    write_distances(&path, &rows)?;
    print_table(&rows);
    info!(path = %path.display(), rows = rows.len(), "Wrote distance table");

    Ok(DistanceReport {
        records: records.len(),
        skipped,
        rows,
        path,
    })
}

/// Process name for a commodity, e.g. `Transport; average mix; coal`.
pub fn process_name(commodity: &str) -> String {
    format!("{PROCESS_NAME_PREFIX}{}", commodity.to_lowercase())
}

/// e.g. `Missing SCTG code: Coal (15)`
fn missing_code_message(code: &str) -> String {
    format!(
        "Missing SCTG code: {} ({code})",
        sctg::name(code).unwrap_or_default()
    )
}

pub fn reference_flow_id() -> String {
    make_uuid([REF_FLOW_NAME, REF_FLOW_NAMESPACE])
}

/// One input row per distance row whose commodity is in the SCTG table.
/// Unknown commodities are skipped and returned.
fn input_rows(
    distances: &[ModeDistance],
    mappings: &FlowMappings,
    category: &str,
    year: i32,
    exchange_dqi: &str,
) -> (Vec<ExchangeRow>, Vec<String>) {
    let mut rows = Vec::with_capacity(distances.len());
    let mut skipped = Vec::new();
    let country = country_code(LOCATION).unwrap_or_default().to_string();

    for d in distances {
        let Some(code) = sctg::code_for(&d.commodity) else {
            warn!(commodity = %d.commodity, "Commodity not in SCTG table; skipping");
            if !skipped.contains(&d.commodity) {
                skipped.push(d.commodity.clone());
            }
            continue;
        };

        let mapped = mappings.get(d.mode.as_str());
        if mapped.is_none() {
            warn!(mode = %d.mode, "No flow mapping for transport mode");
        }
        let provider = mapped.and_then(|m| mappings.provider_dict.get(&m.name));
        let name = process_name(&d.commodity);

        rows.push(ExchangeRow {
            process_id: make_uuid([name.as_str()]),
            process_category: category.to_string(),
            process_name: name,
            flow_uuid: mapped.map(|m| m.id.clone()).unwrap_or_default(),
            flow_name: mapped.map(|m| m.name.clone()).unwrap_or_default(),
            context: INPUT_CONTEXT.to_string(),
            is_input: true,
            flow_type: FlowType::ProductFlow,
            reference: false,
            default_provider: provider.map(|p| p.id.clone()),
            default_provider_name: mapped.map(|m| m.provider.clone()),
            amount: d.weighted_distance_km,
            unit: INPUT_UNIT.to_string(),
            avoided_product: false,
            exchange_dqi: Some(exchange_dqi.to_string()),
            location: LOCATION.to_string(),
            year,
            country_code: country.clone(),
            sctg: Some(code.to_string()),
            commodity: Some(d.commodity.clone()),
            mode: Some(d.mode.to_string()),
        });
    }

    (rows, skipped)
}

/// The reference output of a process: 1 kg of commodity transported.
/// Process name and exchange DQI are taken from the process's first input.
fn reference_row(donor: &ExchangeRow, category: &str) -> ExchangeRow {
    ExchangeRow {
        process_id: donor.process_id.clone(),
        process_category: category.to_string(),
        process_name: donor.process_name.clone(),
        flow_uuid: reference_flow_id(),
        flow_name: REF_FLOW_NAME.to_string(),
        context: format!("Technosphere Flows / {category}"),
        is_input: false,
        flow_type: FlowType::ProductFlow,
        reference: true,
        default_provider: None,
        default_provider_name: None,
        amount: 1.0,
        unit: REF_UNIT.to_string(),
        avoided_product: false,
        exchange_dqi: donor.exchange_dqi.clone(),
        location: donor.location.clone(),
        year: donor.year,
        country_code: donor.country_code.clone(),
        sctg: donor.sctg.clone(),
        commodity: donor.commodity.clone(),
        mode: None,
    }
}

/// Groups rows by process id in first-seen order, appending each group's
/// reference row after its inputs.
fn group_processes(inputs: Vec<ExchangeRow>, category: &str) -> Vec<Vec<ExchangeRow>> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: BTreeMap<String, Vec<ExchangeRow>> = BTreeMap::new();

    for row in inputs {
        if !groups.contains_key(&row.process_id) {
            order.push(row.process_id.clone());
        }
        groups.entry(row.process_id.clone()).or_default().push(row);
    }

    order
        .into_iter()
        .filter_map(|pid| groups.remove(&pid))
        .map(|mut rows| {
            let reference = reference_row(&rows[0], category);
            rows.push(reference);
            rows
        })
        .collect()
}

/// Reads the distance table and metadata, builds flows, processes and
/// their supporting objects, and writes the openLCA archive.
#[tracing::instrument(skip_all, fields(archive = %settings.archive_name, year = settings.year))]
pub fn build_objects(settings: &Settings) -> Result<BuildSummary> {
    let last_change = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

    let flow_meta = FlowMeta::load(&settings.flow_meta_path())?;
    let units = UnitTable::with_overrides(&flow_meta.units);
    let mappings = FlowMappings::load(&settings.mapping_path(), &units, &last_change)?;
    let distances = read_distances(&settings.distances_path())?;
    info!(rows = distances.len(), "Loaded distance table");

    let present: HashSet<&str> = distances
        .iter()
        .filter_map(|d| sctg::code_for(&d.commodity))
        .collect();
    let missing_codes = sctg::missing_codes(&present);
    for code in &missing_codes {
        warn!(code, "{}", missing_code_message(code));
    }

    let flow_dq = dq_system(&flow_meta.dqi.dq_system.flow)?;
    let process_dq = dq_system(&flow_meta.dqi.dq_system.process)?;
    let exchange_dqi = format_dqi_score(&flow_meta.dqi.flow)?;
    check_entry(&exchange_dqi, &flow_dq)?;
    let process_dqi = format_dqi_score(&flow_meta.dqi.process)?;
    check_entry(&process_dqi, &process_dq)?;

    let (inputs, skipped_commodities) = input_rows(
        &distances,
        &mappings,
        &flow_meta.category,
        settings.year,
        &exchange_dqi,
    );
    let groups = group_processes(inputs, &flow_meta.category);
    let all_rows: Vec<ExchangeRow> = groups.iter().flatten().cloned().collect();
    validate_exchange_data(&all_rows, &units)?;

    let mut locations = BTreeMap::new();
    for row in &all_rows {
        if !locations.contains_key(&row.location) {
            locations.insert(row.location.clone(), build_location(&row.location)?);
        }
    }

    let mut template = ProcessMetaTemplate::load(&settings.process_meta_path())?;
    template.assign_year(settings.year);
    template.set("dq_entry", &process_dqi);
    let base_meta = template.parse()?;

    let sources_path = settings.sources_path();
    let bib = if sources_path.exists() {
        parse_bib(&std::fs::read_to_string(&sources_path)?)?
    } else {
        BTreeMap::new()
    };
    let sources = extract_sources(&base_meta, &bib)?;
    let actors = extract_actors(&base_meta)?;

    let mapped_flows = mappings.flows_by_id();
    let mapped_ids: HashSet<String> = mapped_flows.keys().cloned().collect();
    let mut flow_set = build_flow_dict(&all_rows, &units, &mapped_ids, &last_change)?;
    merge_mapped_flows(&mut flow_set, &mapped_flows);

    let objs = SupportObjects {
        flows: &flow_set.flows,
        units: &units,
        locations: &locations,
        sources: &sources,
        actors: &actors,
        process_dq_system: &process_dq,
        flow_dq_system: &flow_dq,
    };

    let mut processes = BTreeMap::new();
    for rows in &groups {
        let first = &rows[0];
        let commodity = first.commodity.as_deref().unwrap_or_default();
        let code = first
            .sctg
            .as_deref()
            .ok_or_else(|| anyhow!("Process {} has no SCTG code", first.process_name))?;

        let meta = template.for_commodity(commodity, code)?;
        let process = build_process(rows, &meta, &objs, &last_change)?;
        processes.insert(process.id.clone(), process);
    }

    let objects = ObjectSet {
        new_flows: flow_set.new_flows.clone(),
        processes,
        locations: by_id(locations.into_values()),
        sources: by_id(sources.into_values()),
        actors: by_id(actors.into_values()),
        dq_systems: by_id([flow_dq, process_dq]),
        flows: flow_set.flows,
    };

    let written = write_objects(&settings.archive_name, &objects, &settings.output_dir)?;

    Ok(BuildSummary {
        processes: objects.processes.len(),
        flows: objects.flows.len(),
        new_flows: objects.new_flows.len(),
        missing_codes,
        skipped_commodities,
        archive: written.archive,
    })
}

fn by_id<T: RootEntity>(items: impl IntoIterator<Item = T>) -> BTreeMap<String, T> {
    items
        .into_iter()
        .map(|item| (item.id().to_string(), item))
        .collect()
}
