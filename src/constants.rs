//! Shared constants used across the application.

/// User agent sent with every outbound API request.
pub const USER_AGENT: &str = "habomai-scraper/0.1";

/// Delimiter separating the structural segments of a post body.
pub const SEGMENT_DELIMITER: &str = "、";

/// Offset of the civil time zone all timestamps are normalized to (Asia/Tokyo).
///
/// Japan has not observed daylight saving time since 1951, so a fixed offset
/// is exact.
pub const LOCAL_UTC_OFFSET_SECS: i32 = 9 * 3600;

/// Default request timeout for API clients.
pub const HTTP_TIMEOUT_SECS: u64 = 30;
