//! Shared constants for end-to-end tests

/// Regular test user handle
pub const TEST_USER: &str = "testuser";

/// Second test user handle, for isolation checks
pub const OTHER_USER: &str = "otheruser";

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Timeout for individual HTTP requests (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Polling interval when waiting for server ready (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;

/// Debounce window configured for the notification dispatcher in tests
/// (milliseconds). Tests that assert on delivered notifications should wait
/// a few multiples of this.
pub const NOTIFICATION_DEBOUNCE_MS: u64 = 50;

/// Minimal PNG file, enough for content sniffing on upload.
pub const TEST_PNG_BYTES: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00,
];
