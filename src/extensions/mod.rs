//! Optional extensions to the base camera controller.

#[cfg(feature = "extension_pivot_indicator")]
pub mod pivot_indicator;
