// Application layer - Use cases and the ports they depend on
pub mod aggregator;
pub mod analytics_service;
pub mod batched_fetcher;
pub mod dashboard_session;
pub mod data_source;
pub mod filter_store;
pub mod retry;
pub mod supersession;
pub mod url_codec;
