pub mod authority;
pub mod errors;
pub mod hierarchy;
pub mod stats;
