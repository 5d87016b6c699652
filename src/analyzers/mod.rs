//! Commodity transport distance aggregation.
//!
//! This module folds CFS shipment records into mass-weighted average
//! distances per commodity and transport mode, along with each mode's
//! share of the commodity's shipped mass.

pub mod aggregate;
pub mod types;
pub mod utility;
