// Pipeline storage: delimited output

pub mod csv_out;

pub use csv_out::{file_sha256, write_csv};
