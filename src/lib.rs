//! sitesearch - per-site crawling search engine.
//!
//! Crawls a configured list of sites, builds an in-memory inverted index of
//! lemmatized page text, and serves search and indexing-control endpoints
//! over HTTP.

pub mod cli;
pub mod config;
pub mod coordinator;
pub mod crawler;
pub mod error;
pub mod indexer;
pub mod lemmatizer;
pub mod models;
pub mod repository;
pub mod search;
pub mod server;
