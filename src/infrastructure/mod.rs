// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod fixture_source;
pub mod http_response;
pub mod navigation;
pub mod postgrest_source;
pub mod source_factory;
pub mod storage;
