// Scout analytics - filter state, batched transaction fetching and dashboard aggregation
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
