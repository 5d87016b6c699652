//! Record types for the CFS public use file (PUF).

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single shipment row from the CFS public use file.
///
/// Only the columns the distance calculation needs are kept; any other
/// columns in the file are ignored on deserialization.
#[derive(Debug, Clone, Deserialize)]
pub struct ShipmentRecord {
    #[serde(rename = "SHIPMT_ID", default)]
    pub shipment_id: Option<String>,
    #[serde(rename = "SCTG")]
    pub sctg: String,
    #[serde(rename = "MODE")]
    pub mode: u16,
    /// Shipment weight in pounds.
    #[serde(rename = "SHIPMT_WGHT")]
    pub weight_lb: f64,
    /// Routed distance in miles.
    #[serde(rename = "SHIPMT_DIST_ROUTED")]
    pub distance_routed_mi: f64,
    #[serde(rename = "WGT_FACTOR")]
    pub weight_factor: f64,
    #[serde(rename = "EXPORT_YN", default)]
    pub export: Option<String>,
    #[serde(rename = "HAZMAT", default)]
    pub hazmat: Option<String>,
}

impl ShipmentRecord {
    pub fn is_export(&self) -> bool {
        self.export.as_deref().map(str::trim) == Some("Y")
    }

    /// `P` (class 3 flammable) and `H` (other hazmat) both count.
    pub fn is_hazmat(&self) -> bool {
        matches!(self.hazmat.as_deref().map(str::trim), Some("P") | Some("H"))
    }
}

/// Transport modes reported in the distance statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TransportMode {
    Truck,
    Rail,
    Water,
    Air,
    Pipeline,
}

impl TransportMode {
    pub const ALL: [TransportMode; 5] = [
        TransportMode::Truck,
        TransportMode::Rail,
        TransportMode::Water,
        TransportMode::Air,
        TransportMode::Pipeline,
    ];

    /// Classifies a CFS mode code.
    ///
    /// | Code(s)            | Mode     |
    /// |--------------------|----------|
    /// | 3, 4, 5            | Truck    |
    /// | 6                  | Rail     |
    /// | 7, 8, 9, 10, 101   | Water    |
    /// | 11                 | Air      |
    /// | 12                 | Pipeline |
    ///
    /// Suppressed, multimodal, parcel, other and unknown codes return `None`.
    pub fn from_cfs_code(code: u16) -> Option<Self> {
        match code {
            3..=5 => Some(TransportMode::Truck),
            6 => Some(TransportMode::Rail),
            7..=10 | 101 => Some(TransportMode::Water),
            11 => Some(TransportMode::Air),
            12 => Some(TransportMode::Pipeline),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransportMode::Truck => "Truck",
            TransportMode::Rail => "Rail",
            TransportMode::Water => "Water",
            TransportMode::Air => "Air",
            TransportMode::Pipeline => "Pipeline",
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_classification() {
        assert_eq!(TransportMode::from_cfs_code(4), Some(TransportMode::Truck));
        assert_eq!(TransportMode::from_cfs_code(5), Some(TransportMode::Truck));
        assert_eq!(TransportMode::from_cfs_code(6), Some(TransportMode::Rail));
        assert_eq!(TransportMode::from_cfs_code(101), Some(TransportMode::Water));
        assert_eq!(TransportMode::from_cfs_code(11), Some(TransportMode::Air));
        assert_eq!(TransportMode::from_cfs_code(12), Some(TransportMode::Pipeline));
    }

    #[test]
    fn test_excluded_modes() {
        for code in [0, 2, 13, 14, 15, 16, 17, 18, 19, 20] {
            assert_eq!(TransportMode::from_cfs_code(code), None, "code {code}");
        }
    }

    #[test]
    fn test_flags() {
        let record = ShipmentRecord {
            shipment_id: None,
            sctg: "02".into(),
            mode: 4,
            weight_lb: 1.0,
            distance_routed_mi: 1.0,
            weight_factor: 1.0,
            export: Some("Y".into()),
            hazmat: Some("N".into()),
        };
        assert!(record.is_export());
        assert!(!record.is_hazmat());
    }
}
