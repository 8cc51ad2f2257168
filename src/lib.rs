//! cost-report: turns paginated, dimension-grouped billing records into dense monthly pivot
//! tables and period-over-period change tables, ready to be written out as spreadsheet tabs.

pub mod api;
pub mod args;
pub mod commands;
mod config;
mod error;
pub mod export;
pub mod model;
pub mod report;
mod utils;

#[cfg(test)]
mod test;

pub use config::{Config, Settings};
pub use error::Error;
pub use error::Result;
pub use model::Amount;
