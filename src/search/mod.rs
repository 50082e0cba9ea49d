//! Search pipeline: query normalization, filter construction, relevance
//! ranking, and fetching result pages from the record store.

pub mod fetcher;
pub mod filter;
pub mod rank;
pub mod tokenizer;
