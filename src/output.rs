//! Persistence for the weighted commodity transport distance table.
//!
//! The CSV written here is the hand-off between the distance-calculation
//! stage and the object-building stage.

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::analyzers::aggregate::summarize;
use crate::analyzers::types::ModeDistance;
use csv::WriterBuilder;
use std::fs::{self, File};
use std::path::Path;

/// File name of the intermediate table inside the data directory.
pub const DISTANCES_FILE: &str = "Weighted_Commodity_Transport_Distances.csv";

/// Logs a per-commodity summary of the distance table.
pub fn print_table(rows: &[ModeDistance]) {
    for summary in summarize(rows) {
        info!(
            commodity = %summary.commodity,
            modes = summary.modes,
            mass_kg = summary.mass_kg,
            avg_distance_km = summary.avg_distance_km,
            "Commodity"
        );
    }
}

/// Writes the distance table to `path`, replacing any previous file.
///
/// Parent directories are created as needed.
pub fn write_distances(path: &Path, rows: &[ModeDistance]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    debug!(path = %path.display(), rows = rows.len(), "Writing distance table");
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);

    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(())
}

/// Reads a distance table previously written by [`write_distances`].
pub fn read_distances(path: &Path) -> Result<Vec<ModeDistance>> {
    let file = File::open(path).with_context(|| {
        format!(
            "Failed to open {}; run the distances stage first",
            path.display()
        )
    })?;
    let mut rdr = csv::Reader::from_reader(file);
    let mut rows = Vec::new();

    for result in rdr.deserialize() {
        let row: ModeDistance = result?;
        rows.push(row);
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puf::TransportMode;

    fn sample_rows() -> Vec<ModeDistance> {
        vec![
            ModeDistance {
                commodity: "Coal".into(),
                mode: TransportMode::Rail,
                mass_kg: 750.0,
                avg_distance_km: 1200.0,
                mass_fraction: 0.75,
                weighted_distance_km: 900.0,
            },
            ModeDistance {
                commodity: "Coal".into(),
                mode: TransportMode::Truck,
                mass_kg: 250.0,
                avg_distance_km: 80.0,
                mass_fraction: 0.25,
                weighted_distance_km: 20.0,
            },
        ]
    }

    #[test]
    fn test_print_table_does_not_panic() {
        print_table(&sample_rows());
        print_table(&[]);
    }

    #[test]
    fn test_write_creates_parent_and_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join(DISTANCES_FILE);

        write_distances(&path, &sample_rows()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let header = content.lines().next().unwrap();
        assert_eq!(
            header,
            "Commodity,Transport Mode,Mass Shipped (kg),Avg. Dist. Shipped (km),\
             Mass Frac. by Mode,Weighted Dist. Shipped (km)"
        );
        assert_eq!(content.lines().count(), 3);
    }

    #[test]
    fn test_write_replaces_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DISTANCES_FILE);

        write_distances(&path, &sample_rows()).unwrap();
        write_distances(&path, &sample_rows()[..1]).unwrap();

        assert_eq!(read_distances(&path).unwrap().len(), 1);
    }

    #[test]
    fn test_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DISTANCES_FILE);
        write_distances(&path, &sample_rows()).unwrap();

        let rows = read_distances(&path).unwrap();
        assert_eq!(rows, sample_rows());
    }

    #[test]
    fn test_read_missing_file_mentions_stage() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_distances(&dir.path().join("nope.csv")).unwrap_err();
        assert!(err.to_string().contains("distances stage"));
    }
}
