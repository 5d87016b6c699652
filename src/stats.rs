use crate::analyzers::utility::{KG_PER_LB, KM_PER_MILE, ratio};
use crate::puf::ShipmentRecord;

/// Running mass and distance totals for one commodity/mode cell.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ModeStats {
    pub shipments: usize,
    /// Expanded (weight-factored) mass in kilograms.
    pub mass_kg: f64,
    /// Σ mass × routed distance, in kg·km.
    pub mass_distance: f64,
}

impl ModeStats {
    /// Folds one shipment into the totals, expanded by its tabulation weight.
    pub fn add(&mut self, record: &ShipmentRecord) {
        let mass = record.weight_factor * record.weight_lb * KG_PER_LB;
        let distance = record.distance_routed_mi * KM_PER_MILE;

        self.shipments += 1;
        self.mass_kg += mass;
        self.mass_distance += mass * distance;
    }

    pub fn merge(&mut self, other: &ModeStats) {
        self.shipments += other.shipments;
        self.mass_kg += other.mass_kg;
        self.mass_distance += other.mass_distance;
    }

    /// Mass-weighted average routed distance in km.
    pub fn avg_distance_km(&self) -> f64 {
        ratio(self.mass_distance, self.mass_kg)
    }

    /// Share of this cell's mass in `total`.
    pub fn mass_fraction(&self, total: &ModeStats) -> f64 {
        ratio(self.mass_kg, total.mass_kg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(weight_lb: f64, miles: f64, factor: f64) -> ShipmentRecord {
        ShipmentRecord {
            shipment_id: None,
            sctg: "02".into(),
            mode: 4,
            weight_lb,
            distance_routed_mi: miles,
            weight_factor: factor,
            export: None,
            hazmat: None,
        }
    }

    #[test]
    fn test_empty_stats() {
        let stats = ModeStats::default();
        assert_eq!(stats.avg_distance_km(), 0.0);
        assert_eq!(stats.mass_fraction(&stats), 0.0);
    }

    #[test]
    fn test_add_converts_units() {
        let mut stats = ModeStats::default();
        stats.add(&record(1.0, 1.0, 1.0));

        assert_eq!(stats.shipments, 1);
        assert!((stats.mass_kg - KG_PER_LB).abs() < 1e-12);
        assert!((stats.avg_distance_km() - KM_PER_MILE).abs() < 1e-12);
    }

    #[test]
    fn test_average_is_mass_weighted() {
        let mut stats = ModeStats::default();
        stats.add(&record(100.0, 10.0, 1.0));
        stats.add(&record(100.0, 30.0, 3.0));

        // weights 100 and 300: (10*1 + 30*3) / 4 = 25 miles
        assert!((stats.avg_distance_km() - 25.0 * KM_PER_MILE).abs() < 1e-9);
    }

    #[test]
    fn test_merge_and_fraction() {
        let mut a = ModeStats::default();
        a.add(&record(100.0, 10.0, 1.0));
        let mut b = ModeStats::default();
        b.add(&record(300.0, 10.0, 1.0));

        let mut total = a;
        total.merge(&b);

        assert_eq!(total.shipments, 2);
        assert!((a.mass_fraction(&total) - 0.25).abs() < 1e-12);
        assert!((b.mass_fraction(&total) - 0.75).abs() < 1e-12);
    }
}
