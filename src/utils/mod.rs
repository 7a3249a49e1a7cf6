pub mod range_utils;
pub mod utf8_offsets;

pub use range_utils::LineIndex;
