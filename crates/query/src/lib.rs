//! `fundcrm-query`: storage-agnostic query predicates.
//!
//! Pure functions turning request parameters into composable [`Filter`]
//! fragments. Nothing here performs IO.

pub mod array;
pub mod filter;
pub mod range;
pub mod sort;
pub mod text;

pub use array::{ArrayFilterOptions, array_filter};
pub use filter::{Bound, Filter, RangeValue};
pub use range::{RangeKind, between, range_filter};
pub use sort::{SortDirection, SortSpec, sort_spec};
pub use text::{EMPTY_SENTINEL, search_filter};
