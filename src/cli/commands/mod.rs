pub mod hierarchy;
pub mod seed;
pub mod serve;
