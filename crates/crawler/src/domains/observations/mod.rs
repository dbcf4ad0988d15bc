mod ingest_observations;
mod records;

pub use ingest_observations::*;
pub use records::*;
