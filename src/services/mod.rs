pub mod browser_pool;
pub mod confirmation;
pub mod search_pipeline;
pub mod store_extractor;
pub mod url_builder;

pub use browser_pool::*;
pub use confirmation::*;
pub use search_pipeline::*;
pub use store_extractor::*;
pub use url_builder::*;
