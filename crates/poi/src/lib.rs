//! Points of interest: loading, filtering and marker/label visibility.

pub mod collection;
pub mod source;

pub use collection::*;
pub use source::*;
