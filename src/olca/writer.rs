//! JSON-LD zip output.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use super::schema::{Actor, DqSystem, Flow, Location, Process, RootEntity, Source};

/// Everything written to one archive. Maps are keyed by object id so the
/// archive lists objects in a stable order.
#[derive(Debug, Default)]
pub struct ObjectSet {
    pub flows: BTreeMap<String, Flow>,
    pub new_flows: Vec<String>,
    pub processes: BTreeMap<String, Process>,
    pub locations: BTreeMap<String, Location>,
    pub sources: BTreeMap<String, Source>,
    pub actors: BTreeMap<String, Actor>,
    pub dq_systems: BTreeMap<String, DqSystem>,
}

/// Paths of the files [`write_objects`] produced.
#[derive(Debug, Clone)]
pub struct WrittenArchive {
    pub archive: PathBuf,
    pub new_flows_csv: PathBuf,
    pub entries: usize,
}

const NEW_FLOW_HEADER: [&str; 4] = ["FlowUUID", "FlowName", "Category", "FlowProperty"];

#[derive(Serialize)]
struct NewFlowRecord<'a> {
    #[serde(rename = "FlowUUID")]
    id: &'a str,
    #[serde(rename = "FlowName")]
    name: &'a str,
    #[serde(rename = "Category")]
    category: &'a str,
    #[serde(rename = "FlowProperty")]
    flow_property: &'a str,
}

fn add_entities<'a, W, T>(
    out: &mut ZipWriter<W>,
    items: impl IntoIterator<Item = &'a T>,
) -> Result<usize>
where
    W: Write + Seek,
    T: RootEntity + 'a,
{
    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());

    let mut count = 0;
    for item in items {
        let name = format!("{}/{}.json", T::FOLDER, item.id());
        out.start_file(name.as_str(), options)?;
        out.write_all(&serde_json::to_vec_pretty(item)?)?;
        count += 1;
    }
    Ok(count)
}

/// Writes `<out_dir>/<name>.zip` in openLCA JSON-LD layout, and
/// `<out_dir>/<name>_new_flows.csv` listing flows created by the builder.
#[tracing::instrument(skip(objects), fields(out_dir = %out_dir.display()))]
pub fn write_objects(name: &str, objects: &ObjectSet, out_dir: &Path) -> Result<WrittenArchive> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    let archive = out_dir.join(format!("{name}.zip"));
    let file =
        File::create(&archive).with_context(|| format!("Failed to create {}", archive.display()))?;
    let mut out = ZipWriter::new(file);

    out.start_file(
        "olca-schema.json",
        SimpleFileOptions::default().last_modified_time(zip::DateTime::default()),
    )?;
    out.write_all(br#"{"version":2}"#)?;

    let mut entries = 1;
    entries += add_entities(&mut out, objects.actors.values())?;
    entries += add_entities(&mut out, objects.sources.values())?;
    entries += add_entities(&mut out, objects.dq_systems.values())?;
    entries += add_entities(&mut out, objects.locations.values())?;
    entries += add_entities(&mut out, objects.flows.values())?;
    entries += add_entities(&mut out, objects.processes.values())?;
    out.finish()?;

    debug!(entries, "Archive written");

    let new_flows_csv = out_dir.join(format!("{name}_new_flows.csv"));
    // header written by hand so an empty list still yields a header row
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(&new_flows_csv)?;
    writer.write_record(NEW_FLOW_HEADER)?;
    for id in &objects.new_flows {
        let Some(flow) = objects.flows.get(id) else {
            continue;
        };
        writer.serialize(NewFlowRecord {
            id: &flow.id,
            name: &flow.name,
            category: flow.category.as_deref().unwrap_or_default(),
            flow_property: flow
                .flow_properties
                .first()
                .and_then(|f| f.flow_property.name.as_deref())
                .unwrap_or_default(),
        })?;
    }
    writer.flush()?;

    info!(
        archive = %archive.display(),
        entries,
        processes = objects.processes.len(),
        flows = objects.flows.len(),
        new_flows = objects.new_flows.len(),
        "Wrote openLCA archive"
    );

    Ok(WrittenArchive {
        archive,
        new_flows_csv,
        entries,
    })
}
