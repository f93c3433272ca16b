//! Storage infrastructure module

mod cache_dir;

pub use cache_dir::CacheDirResolver;
