//! Query parsing and the search engine.

mod engine;
mod query;

pub use engine::{SearchEngine, MAX_RESULTS_PER_TERM};
pub use query::{SearchQuery, TypeFilters};
