//! Process exit codes of the `tagsplice` binary.

/// Every file was spliced
pub const SUCCESS: i32 = 0;

/// At least one file was rejected by the scanner, the host parser or reconciliation
pub const SPLICE_FAILED: i32 = 1;

/// The invocation itself failed: unreadable file, bad config, unserializable output
pub const TOOL_ERROR: i32 = 2;
