/// Kilograms per pound.
pub const KG_PER_LB: f64 = 0.453_592_37;

/// Kilometres per statute mile.
pub const KM_PER_MILE: f64 = 1.609_344;

/// Divides `part` by `total`, returning 0.0 when `total` is zero.
pub fn ratio(part: f64, total: f64) -> f64 {
    if total == 0.0 { 0.0 } else { part / total }
}

/// Computes the weighted arithmetic mean of `(value, weight)` pairs.
/// Returns 0.0 for empty input or when all weights are zero.
pub fn weighted_mean(pairs: &[(f64, f64)]) -> f64 {
    let weight_sum: f64 = pairs.iter().map(|(_, w)| w).sum();
    let weighted: f64 = pairs.iter().map(|(v, w)| v * w).sum();
    ratio(weighted, weight_sum)
}
