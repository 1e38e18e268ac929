pub mod rate_store_sweep;

pub use rate_store_sweep::RateStoreSweeper;
