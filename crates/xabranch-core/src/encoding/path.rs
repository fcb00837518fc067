//! Identifier-to-path mapping.
//!
//! File-backed resources store per-resource data under names derived from
//! caller-supplied identifiers. Those identifiers may contain separators or
//! arbitrary Unicode, so they are percent-encoded before touching the
//! filesystem.

use std::fmt;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Bytes left untouched by form encoding: ASCII alphanumerics plus `- . _ *`.
const FORM_ENCODE_SET: &AsciiSet =
    &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'*');

/// Maps a resource identifier to a path-safe string.
pub trait ResourceIdToPathMapper: Send + Sync {
    /// Return the path component used for `id`.
    fn path_for_id(&self, id: &dyn fmt::Display) -> String;
}

/// Maps identifiers with `application/x-www-form-urlencoded` rules.
///
/// The identifier's `Display` output is encoded byte by byte over UTF-8:
/// alphanumerics and `- . _ *` pass through, a space becomes `+`, and every
/// other byte becomes `%XX`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlEncodeIdMapper;

impl ResourceIdToPathMapper for UrlEncodeIdMapper {
    fn path_for_id(&self, id: &dyn fmt::Display) -> String {
        form_encode(&id.to_string())
    }
}

/// Form-encode a string.
#[must_use]
pub fn form_encode(input: &str) -> String {
    // A literal '%' is itself escaped, so "%20" can only come from a space
    utf8_percent_encode(input, FORM_ENCODE_SET).to_string().replace("%20", "+")
}
