mod db;
mod domains;
mod error;
mod fetcher;
mod pipeline;
mod utils;

pub use db::*;
pub use domains::*;
pub use error::*;
pub use fetcher::*;
pub use pipeline::*;
pub use utils::*;
