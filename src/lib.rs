//! # pattern-curator
//!
//! Curatorial search and interpretation service for a library of textile
//! and print reference images ("assets") and curated multi-image
//! collections ("boards").
//!
//! ## Flow
//!
//! ```text
//!   free-text query ──▶ tokenizer ──▶ filter ──▶ record store
//!                       (tokens +      (predicates     │
//!                        domain)        per surface)   ▼
//!                                               Recent / Ranked
//!                                                      │
//!                                     image URLs ◀── result page
//!                                                      │
//!                                                      ▼
//!                                   interpretation (one JSON-mode LLM call)
//! ```
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration for the store, image storage, and LLM
//! - [`models`] - Assets, boards, search context, and interpretation results
//! - [`search::tokenizer`] - Query normalization and domain inference
//! - [`search::filter`] - Filter predicates and their PostgREST rendering
//! - [`search::rank`] - Field-weighted relevance scoring
//! - [`search::fetcher`] - Surface plans and store-failure-tolerant fetching
//! - [`store`] - `RecordStore` trait with PostgREST and in-memory backends
//! - [`storage`] - Public and signed image URLs
//! - [`llm::client`] - JSON-mode chat completions via OpenAI or Ollama
//! - [`llm::interpret`] - Prompting, reply cleanup, and schema decoding
//! - [`panel`] - Client-side interpretation state with stale-response discarding
//! - [`api`] - Axum handlers and the route table
//! - [`state`] - Shared application state built at startup

pub mod api;
pub mod config;
pub mod llm;
pub mod models;
pub mod panel;
pub mod search;
pub mod state;
pub mod storage;
pub mod store;
