pub mod chat;
pub mod config;
pub mod extractor;
pub mod fetcher;
pub mod ledger;
pub mod links;
pub mod pipeline;
