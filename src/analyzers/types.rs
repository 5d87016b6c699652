//! Data types used by the distance-calculation stage.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::puf::TransportMode;

/// One row of the weighted commodity transport distance table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeDistance {
    #[serde(rename = "Commodity")]
    pub commodity: String,
    #[serde(rename = "Transport Mode")]
    pub mode: TransportMode,
    #[serde(rename = "Mass Shipped (kg)")]
    pub mass_kg: f64,
    #[serde(rename = "Avg. Dist. Shipped (km)")]
    pub avg_distance_km: f64,
    #[serde(rename = "Mass Frac. by Mode")]
    pub mass_fraction: f64,
    #[serde(rename = "Weighted Dist. Shipped (km)")]
    pub weighted_distance_km: f64,
}

/// Filters applied to shipment records before aggregation.
#[derive(Debug, Clone, Default)]
pub struct DistanceOptions {
    pub exclude_exports: bool,
    pub exclude_hazmat: bool,
    /// When non-empty, only these two-digit SCTG codes are aggregated.
    pub sctg_codes: HashSet<String>,
}

/// Counts of records dropped by the aggregation filters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SkipCounts {
    pub suppressed_commodity: usize,
    pub excluded_mode: usize,
    pub filtered: usize,
}

/// Per-commodity totals, for logging.
#[derive(Debug, Clone, PartialEq)]
pub struct CommoditySummary {
    pub commodity: String,
    pub modes: usize,
    pub mass_kg: f64,
    pub avg_distance_km: f64,
}
