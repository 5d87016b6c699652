use crate::analyzers::types::{CommoditySummary, DistanceOptions, ModeDistance, SkipCounts};
use crate::analyzers::utility::weighted_mean;
use crate::puf::{ShipmentRecord, TransportMode};
use crate::sctg;
use crate::stats::ModeStats;
use std::collections::BTreeMap;
use tracing::debug;

/// Aggregates shipment records into one [`ModeDistance`] row per
/// commodity and transport mode.
///
/// Mass is expanded by each record's tabulation weight. Within a commodity,
/// mass fractions are taken over the included modes only, so the weighted
/// distances sum to the commodity's mass-weighted average distance.
/// Rows are ordered by SCTG code, then by mode.
pub fn aggregate_distances(
    records: &[ShipmentRecord],
    options: &DistanceOptions,
) -> (Vec<ModeDistance>, SkipCounts) {
    let mut skipped = SkipCounts::default();
    let mut cells: BTreeMap<(&'static str, TransportMode), ModeStats> = BTreeMap::new();

    for record in records {
        let Some(code) = sctg::normalize(&record.sctg) else {
            skipped.suppressed_commodity += 1;
            continue;
        };
        let Some(mode) = TransportMode::from_cfs_code(record.mode) else {
            skipped.excluded_mode += 1;
            continue;
        };

        if (options.exclude_exports && record.is_export())
            || (options.exclude_hazmat && record.is_hazmat())
            || (!options.sctg_codes.is_empty() && !options.sctg_codes.contains(code))
        {
            skipped.filtered += 1;
            continue;
        }

        cells.entry((code, mode)).or_default().add(record);
    }

    let mut totals: BTreeMap<&'static str, ModeStats> = BTreeMap::new();
    for ((code, _), stats) in &cells {
        totals.entry(*code).or_default().merge(stats);
    }

    let mut rows = Vec::with_capacity(cells.len());
    for ((code, mode), stats) in &cells {
        if stats.mass_kg == 0.0 {
            continue;
        }

        let total = totals.get(code).copied().unwrap_or_default();
        let avg_distance_km = stats.avg_distance_km();
        let mass_fraction = stats.mass_fraction(&total);

        rows.push(ModeDistance {
            // normalize() only returns table codes
            commodity: sctg::name(code).unwrap_or(*code).to_string(),
            mode: *mode,
            mass_kg: stats.mass_kg,
            avg_distance_km,
            mass_fraction,
            weighted_distance_km: avg_distance_km * mass_fraction,
        });
    }

    debug!(
        rows = rows.len(),
        suppressed_commodity = skipped.suppressed_commodity,
        excluded_mode = skipped.excluded_mode,
        filtered = skipped.filtered,
        "Aggregated shipment records"
    );

    (rows, skipped)
}

/// Collapses distance rows into per-commodity totals, preserving row order.
pub fn summarize(rows: &[ModeDistance]) -> Vec<CommoditySummary> {
    let mut out: Vec<CommoditySummary> = Vec::new();
    let mut pairs: Vec<Vec<(f64, f64)>> = Vec::new();

    for row in rows {
        let idx = match out.iter().position(|s| s.commodity == row.commodity) {
            Some(idx) => idx,
            None => {
                out.push(CommoditySummary {
                    commodity: row.commodity.clone(),
                    modes: 0,
                    mass_kg: 0.0,
                    avg_distance_km: 0.0,
                });
                pairs.push(Vec::new());
                out.len() - 1
            }
        };

        out[idx].modes += 1;
        out[idx].mass_kg += row.mass_kg;
        pairs[idx].push((row.avg_distance_km, row.mass_kg));
    }

    for (summary, pairs) in out.iter_mut().zip(&pairs) {
        summary.avg_distance_km = weighted_mean(pairs);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::utility::{KG_PER_LB, KM_PER_MILE};

    fn record(sctg: &str, mode: u16, weight_lb: f64, miles: f64) -> ShipmentRecord {
        ShipmentRecord {
            shipment_id: None,
            sctg: sctg.into(),
            mode,
            weight_lb,
            distance_routed_mi: miles,
            weight_factor: 1.0,
            export: Some("N".into()),
            hazmat: Some("N".into()),
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6 * b.abs().max(1.0)
    }

    #[test]
    fn test_empty_input() {
        let (rows, skipped) = aggregate_distances(&[], &DistanceOptions::default());
        assert!(rows.is_empty());
        assert_eq!(skipped, SkipCounts::default());
    }

    #[test]
    fn test_fractions_sum_to_one_and_weighted_sum_is_average() {
        let records = vec![
            record("02", 4, 100.0, 50.0),
            record("02", 5, 100.0, 150.0),
            record("02", 6, 200.0, 500.0),
            record("15", 6, 1000.0, 800.0),
        ];
        let (rows, _) = aggregate_distances(&records, &DistanceOptions::default());

        let grain: Vec<_> = rows
            .iter()
            .filter(|r| r.commodity == "Cereal Grains (includes seed)")
            .collect();
        assert_eq!(grain.len(), 2);

        let frac_sum: f64 = grain.iter().map(|r| r.mass_fraction).sum();
        assert!(close(frac_sum, 1.0));

        // (100*50 + 100*150 + 200*500) / 400 = 300 miles
        let weighted_sum: f64 = grain.iter().map(|r| r.weighted_distance_km).sum();
        assert!(close(weighted_sum, 300.0 * KM_PER_MILE));

        let truck = grain.iter().find(|r| r.mode == TransportMode::Truck).unwrap();
        assert!(close(truck.mass_kg, 200.0 * KG_PER_LB));
        assert!(close(truck.avg_distance_km, 100.0 * KM_PER_MILE));
        assert!(close(truck.mass_fraction, 0.5));
    }

    #[test]
    fn test_rows_ordered_by_code_then_mode() {
        let records = vec![
            record("15", 6, 1.0, 1.0),
            record("02", 6, 1.0, 1.0),
            record("02", 4, 1.0, 1.0),
        ];
        let (rows, _) = aggregate_distances(&records, &DistanceOptions::default());

        let order: Vec<_> = rows.iter().map(|r| (r.commodity.as_str(), r.mode)).collect();
        assert_eq!(
            order,
            vec![
                ("Cereal Grains (includes seed)", TransportMode::Truck),
                ("Cereal Grains (includes seed)", TransportMode::Rail),
                ("Coal", TransportMode::Rail),
            ]
        );
    }

    #[test]
    fn test_skips_suppressed_and_excluded() {
        let records = vec![
            record("01-05", 4, 1.0, 1.0),
            record("02", 14, 1.0, 1.0),
            record("02", 0, 1.0, 1.0),
            record("02", 4, 1.0, 1.0),
        ];
        let (rows, skipped) = aggregate_distances(&records, &DistanceOptions::default());

        assert_eq!(rows.len(), 1);
        assert_eq!(skipped.suppressed_commodity, 1);
        assert_eq!(skipped.excluded_mode, 2);
    }

    #[test]
    fn test_options_filter_records() {
        let mut export = record("02", 4, 1.0, 1.0);
        export.export = Some("Y".into());
        let mut hazmat = record("02", 6, 1.0, 1.0);
        hazmat.hazmat = Some("H".into());
        let records = vec![export, hazmat, record("15", 6, 1.0, 1.0)];

        let options = DistanceOptions {
            exclude_exports: true,
            exclude_hazmat: true,
            sctg_codes: Default::default(),
        };
        let (rows, skipped) = aggregate_distances(&records, &options);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].commodity, "Coal");
        assert_eq!(skipped.filtered, 2);

        let options = DistanceOptions {
            sctg_codes: ["02".to_string()].into_iter().collect(),
            ..Default::default()
        };
        let (rows, _) = aggregate_distances(&records, &options);
        assert!(rows.iter().all(|r| r.commodity == "Cereal Grains (includes seed)"));
    }

    #[test]
    fn test_zero_mass_cell_dropped() {
        let records = vec![record("02", 4, 0.0, 100.0)];
        let (rows, _) = aggregate_distances(&records, &DistanceOptions::default());
        assert!(rows.is_empty());
    }

    #[test]
    fn test_summarize() {
        let records = vec![
            record("02", 4, 100.0, 100.0),
            record("02", 6, 300.0, 200.0),
        ];
        let (rows, _) = aggregate_distances(&records, &DistanceOptions::default());
        let summary = summarize(&rows);

        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].modes, 2);
        assert!(close(summary[0].avg_distance_km, 175.0 * KM_PER_MILE));
    }
}
