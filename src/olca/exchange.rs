//! The flat exchange table processes and flows are built from.
//!
//! Each row is one exchange of one process, carrying everything needed to
//! build both the exchange and the flow it references.

use anyhow::{Result, bail};
use std::collections::BTreeMap;

use super::schema::FlowType;
use super::units::UnitTable;

#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeRow {
    pub process_id: String,
    pub process_category: String,
    pub process_name: String,
    pub flow_uuid: String,
    pub flow_name: String,
    pub context: String,
    pub is_input: bool,
    pub flow_type: FlowType,
    pub reference: bool,
    pub default_provider: Option<String>,
    pub default_provider_name: Option<String>,
    pub amount: f64,
    pub unit: String,
    pub avoided_product: bool,
    pub exchange_dqi: Option<String>,
    pub location: String,
    pub year: i32,
    pub country_code: String,
    pub sctg: Option<String>,
    pub commodity: Option<String>,
    pub mode: Option<String>,
}

/// Checks the table before any objects are built.
///
/// Every row needs a process id and name, a flow id and name, a unit from
/// `units` and a finite, non-negative amount; every process needs exactly
/// one reference exchange. All problems are reported together.
pub fn validate_exchange_data(rows: &[ExchangeRow], units: &UnitTable) -> Result<()> {
    let mut problems = Vec::new();
    let mut references: BTreeMap<&str, usize> = BTreeMap::new();

    for (i, row) in rows.iter().enumerate() {
        let mut missing = Vec::new();
        if row.process_id.is_empty() {
            missing.push("ProcessID");
        }
        if row.process_name.is_empty() {
            missing.push("ProcessName");
        }
        if row.flow_uuid.is_empty() {
            missing.push("FlowUUID");
        }
        if row.flow_name.is_empty() {
            missing.push("FlowName");
        }
        if !missing.is_empty() {
            problems.push(format!("row {i}: missing {}", missing.join(", ")));
        }

        if units.get(&row.unit).is_none() {
            problems.push(format!("row {i}: unknown unit '{}'", row.unit));
        }
        if !row.amount.is_finite() || row.amount < 0.0 {
            problems.push(format!("row {i}: invalid amount {}", row.amount));
        }

        let count = references.entry(row.process_id.as_str()).or_insert(0);
        if row.reference {
            *count += 1;
        }
    }

    for (pid, count) in references {
        if count != 1 {
            problems.push(format!(
                "process {pid}: {count} reference exchanges, expected 1"
            ));
        }
    }

    if !problems.is_empty() {
        bail!("Invalid exchange data:\n  {}", problems.join("\n  "));
    }
    Ok(())
}
