/// Request body size limit, matches GitHub's 25MB payload cap
pub const MAX_REQUEST_SIZE: usize = 25 * 1024 * 1024;

/// Constant-time comparison for security-sensitive operations
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    constant_time_eq::constant_time_eq(a, b)
}
