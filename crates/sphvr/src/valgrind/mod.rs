//! Helpers for maintaining Valgrind suppression files.

pub mod fix_list;
pub mod lib_suppressions;

pub use fix_list::number_placeholders;
pub use lib_suppressions::{collect_objects, library_name, suppression_block};
