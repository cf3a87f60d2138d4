//! Firebird character sets and their mapping to rust encodings
//!
//! The mapping table is bundled with the crate and parsed once, on the
//! first lookup. It is never modified afterwards.

use encoding::{label::encoding_from_whatwg_label, types::EncodingRef, DecoderTrap, EncoderTrap};
use once_cell::sync::Lazy;
use std::{borrow::Cow, collections::HashMap, fmt, str};

use crate::FbError;

static ISC_ENCODINGS: Lazy<HashMap<String, String>> =
    Lazy::new(|| parse_mapping(include_str!("isc_encodings.properties")));

/// Parses `FIREBIRD_NAME=label` lines. Comments start with `#`,
/// entries without a label are left out.
fn parse_mapping(src: &str) -> HashMap<String, String> {
    src.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(isc, label)| (isc.trim().to_uppercase(), label.trim().to_string()))
        .filter(|(_, label)| !label.is_empty())
        .collect()
}

/// Encoding label mapped to a firebird character set, if any
pub fn encoding_name_for(isc_encoding: &str) -> Option<&'static str> {
    ISC_ENCODINGS
        .get(&isc_encoding.trim().to_uppercase())
        .map(String::as_str)
}

/// Firebird charset and the rust encoding used for it
#[derive(Clone)]
pub struct Charset {
    pub on_firebird: Cow<'static, str>,
    /// `None` means the default utf-8 rules
    pub on_rust: Option<EncodingRef>,
}

impl Charset {
    /// Charset for the character set of an attachment.
    ///
    /// `None`, `NONE`, `OCTETS` and names without a mapping use the default rules.
    pub fn from_isc_encoding(isc_encoding: Option<&str>) -> Charset {
        let isc_encoding = match isc_encoding {
            Some(name) if !name.trim().is_empty() => name.trim().to_uppercase(),
            _ => return UTF_8,
        };

        let on_rust = encoding_name_for(&isc_encoding).and_then(encoding_from_whatwg_label);

        Charset {
            on_firebird: Cow::Owned(isc_encoding),
            on_rust,
        }
    }

    /// Decodes the bytes into a string
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Result<Cow<'a, str>, FbError> {
        match self.on_rust {
            Some(charset) => charset
                .decode(bytes, DecoderTrap::Strict)
                .map(Cow::Owned)
                .map_err(|e| {
                    FbError::conversion(
                        "String",
                        format!("found an invalid {} string: {}", self.on_firebird, e),
                    )
                }),
            None => str::from_utf8(bytes).map(Cow::Borrowed).map_err(|_| {
                FbError::conversion("String", "found an invalid utf-8 string")
            }),
        }
    }

    /// Encodes the string into bytes
    pub fn encode<'a>(&self, s: &'a str) -> Result<Cow<'a, [u8]>, FbError> {
        match self.on_rust {
            Some(charset) => charset
                .encode(s, EncoderTrap::Strict)
                .map(Cow::Owned)
                .map_err(|e| {
                    FbError::conversion(
                        "String",
                        format!("can't represent the string in {}: {}", self.on_firebird, e),
                    )
                }),
            None => Ok(Cow::Borrowed(s.as_bytes())),
        }
    }
}

impl fmt::Debug for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Charset")
            .field("on_firebird", &self.on_firebird)
            .field("on_rust", &self.on_rust.map(|e| e.name()))
            .finish()
    }
}

impl Default for Charset {
    fn default() -> Self {
        UTF_8
    }
}

pub const UTF_8: Charset = Charset {
    on_firebird: Cow::Borrowed("UTF8"),
    on_rust: None,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_table() {
        assert_eq!(encoding_name_for("WIN1252"), Some("windows-1252"));
        assert_eq!(encoding_name_for("win1251"), Some("windows-1251"));
        assert_eq!(encoding_name_for("NONE"), None);
        assert_eq!(encoding_name_for("NOT_A_CHARSET"), None);
    }

    #[test]
    fn parse_skips_comments_and_empty_labels() {
        let map = parse_mapping("# comment\n\nA=x\n b = y \nC=\nbroken line\n");

        assert_eq!(map.len(), 2);
        assert_eq!(map.get("A").map(String::as_str), Some("x"));
        assert_eq!(map.get("B").map(String::as_str), Some("y"));
    }

    #[test]
    fn default_rules_without_mapping() {
        for name in [None, Some("NONE"), Some("OCTETS"), Some("")].iter() {
            let charset = Charset::from_isc_encoding(*name);
            assert!(charset.on_rust.is_none());
            assert_eq!(charset.decode(b"abc").unwrap(), "abc");
        }

        assert!(UTF_8.decode(&[0xff, 0xfe]).is_err());
    }

    #[test]
    fn mapped_charset_roundtrip() {
        let charset = Charset::from_isc_encoding(Some("win1252"));
        assert_eq!(charset.on_firebird, "WIN1252");

        let bytes = charset.encode("café").unwrap();
        assert_eq!(&*bytes, &[b'c', b'a', b'f', 0xe9]);
        assert_eq!(charset.decode(&bytes).unwrap(), "café");

        assert!(charset.encode("日本").is_err());
    }
}
