/// Minimum number of digits in a normalized phone number
pub const PHONE_MIN_DIGITS: usize = 8;

/// Maximum number of digits in a normalized phone number
pub const PHONE_MAX_DIGITS: usize = 15;

// =============================================================================
// UPLOAD CONSTANTS
// =============================================================================

/// Filename used when a part carries no usable name
pub const FALLBACK_FILENAME: &str = "unnamed";

/// Content type assumed when a part does not declare one
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Chunk size used when streaming files through the hasher
pub const HASH_CHUNK_SIZE: usize = 8 * 1024;

/// Upper bound on collision suffixes tried before giving up on a name
pub const MAX_COLLISION_ATTEMPTS: u32 = 10_000;

/// Suffix inserted between base name and extension for thumbnails
pub const THUMBNAIL_SUFFIX: &str = "_thumb";
