pub const UPLOAD_API_PREFIX: &str = "/api/v2/compliance";
pub const API_ACCEPT: &str = "application/json,version=2";
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Content type of archives handed back by `fetch`.
pub const ARCHIVE_CONTENT_TYPE: &str = "application/x-bzip2";

/// Subdirectory of every tier that holds ARF archives.
pub const ARF_NAMESPACE: &str = "arf";

pub const STORAGE_FAILURE_NOTE: &str = "Storage failure on proxy, see proxy logs for details";
pub const OVAL_PARSE_FAILURE: &str = "Failed to parse OVAL report, see proxy logs for details";

/// OVAL result value used when a definition has no entry in the results section.
pub const OVAL_NOT_EVALUATED: &str = "not evaluated";
