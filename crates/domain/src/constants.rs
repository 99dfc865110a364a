//! Domain constants

/// Days covered by one materialization window.
pub const WINDOW_DAYS: i64 = 7;

/// The provider caps a single weekly recurrence series at 12 occurrences
/// (roughly three months).
pub const RECURRENCE_END_TIMES: u32 = 12;

/// Refresh a cached provider token this many seconds before its expiry.
pub const DEFAULT_TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

/// Default number of occurrences synchronized concurrently in a bulk call.
pub const DEFAULT_BULK_PARALLELISM: usize = 4;
