//! Derived financial quantities: currency conversion, production cost
//! roll-ups, per-sale profit, and report aggregates.
//!
//! Everything here is pure computation over rows already fetched from the
//! remote store; services do the fetching.

pub mod costing;
pub mod rates;
pub mod report;

pub use costing::{CostSource, CostingError, SaleCost};
pub use rates::ExchangeRates;
