/// Content type used when neither the client nor the filename tells us better
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Placeholder name for multipart parts sent without a filename
pub const UNNAMED_FILE: &str = "unnamed";

/// Resource prefix of provider file names (`files/<id>`)
pub const FILE_RESOURCE_PREFIX: &str = "files/";

/// Shown when a file is not in the local cache
pub const FILE_NOT_CACHED_MESSAGE: &str =
    "File not found locally. It might have been uploaded in a previous session or deleted.";
