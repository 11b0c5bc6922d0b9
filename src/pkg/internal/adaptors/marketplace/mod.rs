pub mod mutators;
pub mod selectors;
pub mod shaping;
pub mod spec;
