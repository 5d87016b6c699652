//! openLCA object model and builders.
//!
//! The builder works from a flat exchange table ([`exchange::ExchangeRow`]):
//! rows are validated, turned into flows, grouped into unit processes, and
//! written together with their supporting objects (locations, sources,
//! actors, data quality systems) as a JSON-LD zip importable by openLCA.

pub mod dqi;
pub mod exchange;
pub mod flows;
pub mod ids;
pub mod location;
pub mod process;
pub mod schema;
pub mod units;
pub mod writer;

pub use ids::make_uuid;
