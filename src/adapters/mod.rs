// Adapters layer: concrete implementations of the domain ports (storage backends, file loading, caching).

pub mod cache;
pub mod file;
pub mod memory;
