use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Matches provider file URIs and captures everything from the last `/files/` on.
    /// The greedy prefix makes the last `/files/` segment win.
    /// - Matches: "https://generativelanguage.googleapis.com/v1beta/files/abc123"
    /// - Matches: "https://files/abc" (captures "files/abc")
    /// - Matches: "http://host/files/abc/extra" (captures "files/abc/extra")
    /// - No match: "files/abc123", "abc123", "https://host/other/abc123", "ftp://host/files/abc"
    pub static ref FILE_URI_REGEX: Regex =
        Regex::new(r"(?s)^http.*/(files/.*)$").unwrap();
}
