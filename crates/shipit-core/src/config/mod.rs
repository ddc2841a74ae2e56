//! Configuration for shipit.
//!
//! A single optional file, `<config_dir>/shipit/shipit.toml`, supplies
//! defaults for values that would otherwise have to be passed as flags.
//! Command-line flags always take precedence over the file.

pub mod parser;
pub mod schema;
pub mod store;

pub use parser::{parse_shipit_toml, parse_shipit_toml_str};
pub use schema::{Defaults, ShipitConfig};
pub use store::ConfigStore;
