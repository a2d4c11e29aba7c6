//! Mapping of request targets onto the served directory.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use std::path::{Path, PathBuf};

/// Bytes left unescaped in generated links: unreserved characters and `/`
const LINK: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~')
    .remove(b'/');

/// A request target split into its parts and normalized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTarget {
    raw_path: String,
    query: Option<String>,
    segments: Vec<String>,
    trailing_slash: bool,
}

impl RequestTarget {
    /// Parses a request target as sent on the request line
    ///
    /// Query and fragment are dropped from the path, the rest is
    /// percent-decoded and normalized. `..` removes the previous segment and
    /// can never climb above the root; `.` and empty segments are skipped.
    pub fn parse(target: &str) -> Self {
        let (without_query, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query.split('#').next().unwrap_or_default())),
            None => (target, None),
        };
        let raw_path = without_query.split('#').next().unwrap_or_default();
        let trailing_slash = raw_path.trim_end().ends_with('/');

        let decoded = percent_decode_str(raw_path).decode_utf8_lossy();
        let mut segments: Vec<String> = Vec::new();
        for segment in decoded.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                s if s.contains('\\') || s.contains('\0') => {}
                s => segments.push(s.to_string()),
            }
        }

        Self {
            raw_path: raw_path.to_string(),
            query: query.map(str::to_string),
            segments,
            trailing_slash,
        }
    }

    /// Whether the target path ended in `/`
    pub fn has_trailing_slash(&self) -> bool {
        self.trailing_slash
    }

    /// Normalized path segments below the root
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Filesystem path the target names inside `root`
    pub fn fs_path(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        path.extend(&self.segments);
        path
    }

    /// Decoded target shown to users in listing titles, query included
    pub fn display_path(&self) -> String {
        let shown = match &self.query {
            Some(query) => format!("{}?{}", self.raw_path, query),
            None => self.raw_path.clone(),
        };
        percent_decode_str(&shown).decode_utf8_lossy().into_owned()
    }

    /// The request target with `/` appended to its path
    pub fn with_trailing_slash(&self) -> String {
        match &self.query {
            Some(query) => format!("{}/?{}", self.raw_path, query),
            None => format!("{}/", self.raw_path),
        }
    }
}

/// Percent-encodes a file name for use in an `href`
pub fn encode_link(name: &str) -> String {
    utf8_percent_encode(name, LINK).to_string()
}

/// Escapes text for inclusion in HTML
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_path() {
        let target = RequestTarget::parse("/docs/readme.txt");
        assert_eq!(target.segments(), ["docs", "readme.txt"]);
        assert!(!target.has_trailing_slash());
        assert_eq!(target.fs_path(Path::new("/srv")), PathBuf::from("/srv/docs/readme.txt"));
    }

    #[test]
    fn test_parse_strips_query_and_fragment() {
        let target = RequestTarget::parse("/a/b?x=1#frag");
        assert_eq!(target.segments(), ["a", "b"]);
        assert!(!target.has_trailing_slash());
        assert_eq!(target.with_trailing_slash(), "/a/b/?x=1");

        let target = RequestTarget::parse("/a#frag");
        assert_eq!(target.segments(), ["a"]);
        assert_eq!(target.with_trailing_slash(), "/a/");
    }

    #[test]
    fn test_parse_decodes_percent_escapes() {
        let target = RequestTarget::parse("/my%20file%2Etxt");
        assert_eq!(target.segments(), ["my file.txt"]);
        assert_eq!(target.display_path(), "/my file.txt");
    }

    #[test]
    fn test_display_path_keeps_query() {
        let target = RequestTarget::parse("/docs/?sort=name%20asc");
        assert_eq!(target.display_path(), "/docs/?sort=name asc");
        assert_eq!(target.segments(), ["docs"]);
    }

    #[test]
    fn test_parent_segments_cannot_escape_root() {
        let target = RequestTarget::parse("/../../etc/passwd");
        assert_eq!(target.segments(), ["etc", "passwd"]);

        let target = RequestTarget::parse("/a/b/../c");
        assert_eq!(target.segments(), ["a", "c"]);

        let target = RequestTarget::parse("/%2e%2e/%2E%2E/secret");
        assert_eq!(target.segments(), ["secret"]);

        let target = RequestTarget::parse("/..%2f..%2fsecret");
        assert_eq!(target.segments(), ["secret"]);
    }

    #[test]
    fn test_dot_and_empty_segments_skipped() {
        let target = RequestTarget::parse("//./a//./b/");
        assert_eq!(target.segments(), ["a", "b"]);
        assert!(target.has_trailing_slash());
    }

    #[test]
    fn test_root_target() {
        let target = RequestTarget::parse("/");
        assert!(target.segments().is_empty());
        assert!(target.has_trailing_slash());
        assert_eq!(target.fs_path(Path::new("/srv")), PathBuf::from("/srv"));
    }

    #[test]
    fn test_encode_link() {
        assert_eq!(encode_link("a b/"), "a%20b/");
        assert_eq!(encode_link("100%.txt"), "100%25.txt");
        assert_eq!(encode_link("plain-name_1.~"), "plain-name_1.~");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<a href=\"x\">&'"), "&lt;a href=&quot;x&quot;&gt;&amp;&#x27;");
    }
}
