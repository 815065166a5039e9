//! Shared key helpers for uploaded sources and translated outputs.
//!
//! Upload key format: `{upload_prefix}{epoch_millis}-{file_name}`.
//! Share links carry the output key as a URL-encoded `file` query parameter.

/// Last path segment of a storage key.
///
/// Keys always use `/` as separator regardless of the host platform.
pub fn file_name_of(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

/// Build the storage key for a newly uploaded document.
///
/// Any directory components of `file_name` are dropped so a local path
/// never leaks into the bucket layout.
pub fn upload_key_for(upload_prefix: &str, epoch_millis: i64, file_name: &str) -> String {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    format!("{}{}-{}", upload_prefix, epoch_millis, base)
}

/// Link a recipient can open to download a translated document.
pub fn share_link(frontend_url: &str, output_key: &str) -> String {
    format!(
        "{}/?file={}",
        frontend_url.trim_end_matches('/'),
        urlencoding::encode(output_key)
    )
}

/// Turn the `file` value of a share link back into a full output key.
///
/// Older links carried only the part after the output prefix.
pub fn normalize_shared_key(output_prefix: &str, shared: &str) -> String {
    let shared = shared.trim().trim_start_matches('/');
    if shared.starts_with(output_prefix) {
        shared.to_string()
    } else {
        format!("{}{}", output_prefix, shared)
    }
}
