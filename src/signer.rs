use md5::{Digest, Md5};

/// Name of the query parameter carrying the request signature
pub const SIG_PARAM: &str = "sig";

/// Compute the request signature: the lowercase hex MD5 of the request
/// path (with its query string, without scheme and host) followed by the
/// secret.
pub fn sign(path_and_query: &str, secret: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(path_and_query.as_bytes());
    hasher.update(secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Append `&sig=...` to an unsigned path. The signature covers the path as
/// given, never the appended parameter.
pub fn append_signature(path_and_query: &str, secret: &str) -> String {
    let sig = sign(path_and_query, secret);
    format!("{}&{}={}", path_and_query, SIG_PARAM, sig)
}
