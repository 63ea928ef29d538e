//! Helpers shared by the client and the CLI.

pub mod csv;

pub use csv::{escape_field, parse_csv, write_csv};
