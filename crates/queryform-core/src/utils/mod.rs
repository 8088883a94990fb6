//! Utility types shared by the queryform crates.
//!
//! This module provides:
//! - [`MultiValueDict`]: A dictionary that can hold multiple values per key.

mod multi_value_dict;

pub use multi_value_dict::MultiValueDict;
