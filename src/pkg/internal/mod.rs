pub mod adaptors;
pub mod contract;
pub mod error;
