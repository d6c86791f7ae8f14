//! Page-access simulation

pub mod lru;

pub use lru::{simulate, simulate_fifo, AccessResult, LruCache, PageId, SimulationReport};
