use base64::Engine;

/// Prefix of a Basic `Authorization` header value
pub const BASIC_SCHEME: &str = "Basic";

/// Encode `username:password` for the Basic authentication scheme (standard
/// alphabet, padded). The result goes verbatim after `Basic ` in an
/// `Authorization` header.
///
/// No character set validation is performed. A username containing `:` or
/// either value containing control characters produces a value the server
/// will split or reject.
pub fn encode_basic(username: &str, password: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(format!("{username}:{password}"))
}
