use encoding_rs::{EUC_KR, Encoding, UTF_8, UTF_16BE, UTF_16LE, WINDOWS_1252};

/// Text encodings tried for delimited files, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Utf8Sig,
    Cp949,
    EucKr,
    Utf16,
    Latin1,
}

pub const ENCODING_CANDIDATES: [TextEncoding; 6] = [
    TextEncoding::Utf8,
    TextEncoding::Utf8Sig,
    TextEncoding::Cp949,
    TextEncoding::EucKr,
    TextEncoding::Utf16,
    TextEncoding::Latin1,
];

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

impl TextEncoding {
    pub fn label(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Utf8Sig => "utf-8-sig",
            TextEncoding::Cp949 => "cp949",
            TextEncoding::EucKr => "euc-kr",
            TextEncoding::Utf16 => "utf-16",
            TextEncoding::Latin1 => "latin-1",
        }
    }

    /// Decode, failing on any malformed byte sequence.
    pub fn decode_strict(&self, bytes: &[u8]) -> Option<String> {
        let (encoding, body) = self.resolve(bytes)?;
        encoding
            .decode_without_bom_handling_and_without_replacement(body)
            .map(|text| text.into_owned())
    }

    /// Decode, dropping malformed byte sequences. The flag reports whether
    /// anything was dropped.
    pub fn decode_lossy(&self, bytes: &[u8]) -> Option<(String, bool)> {
        let (encoding, body) = self.resolve(bytes)?;
        let (text, had_errors) = encoding.decode_without_bom_handling(body);
        if had_errors {
            Some((text.replace('\u{FFFD}', ""), true))
        } else {
            Some((text.into_owned(), false))
        }
    }

    /// Pick the concrete codec and strip the byte-order mark it owns.
    ///
    /// UTF-16 without a byte-order mark is only considered when the input
    /// contains zero bytes; otherwise any even-length ASCII file would decode
    /// as CJK noise.
    fn resolve<'a>(&self, bytes: &'a [u8]) -> Option<(&'static Encoding, &'a [u8])> {
        let resolved = match self {
            TextEncoding::Utf8 => (UTF_8, bytes),
            TextEncoding::Utf8Sig => (UTF_8, bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)),
            TextEncoding::Cp949 | TextEncoding::EucKr => (EUC_KR, bytes),
            TextEncoding::Utf16 => match bytes {
                [0xFF, 0xFE, rest @ ..] => (UTF_16LE, rest),
                [0xFE, 0xFF, rest @ ..] => (UTF_16BE, rest),
                _ if bytes.contains(&0) => (UTF_16LE, bytes),
                _ => return None,
            },
            TextEncoding::Latin1 => (WINDOWS_1252, bytes),
        };
        Some(resolved)
    }
}
