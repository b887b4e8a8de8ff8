pub mod pool;
pub mod themes;
