pub use crate::pkg::internal::error::RelayError;

pub type Result<T> = core::result::Result<T, RelayError>;
