pub mod employers;
pub mod jobs;
pub mod probes;
pub mod seekers;
