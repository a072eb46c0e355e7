pub mod query;
pub mod store;
