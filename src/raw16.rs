use crate::error::{Error, Result};
use crate::img::DepthImage;
use std::iter::Peekable;

pub const HEADER_LEN: usize = 17;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Format identifier, carried along but never interpreted.
    pub tag: String,
    pub width: u32,
    pub height: u32,
}

/// ASCII whitespace plus vertical tab, which `u8::is_ascii_whitespace` leaves out.
fn is_separator(byte: u8) -> bool {
    byte.is_ascii_whitespace() || byte == 0x0b
}

fn consume_separators(stream: &mut Peekable<impl Iterator<Item = u8>>) {
    while stream.next_if(|&byte| is_separator(byte)).is_some() {}
}

fn consume_token(stream: &mut Peekable<impl Iterator<Item = u8>>) -> Option<Vec<u8>> {
    consume_separators(stream);
    let mut token = Vec::new();
    while let Some(byte) = stream.next_if(|&byte| !is_separator(byte)) {
        token.push(byte);
    }
    (!token.is_empty()).then_some(token)
}

fn parse_dimension(token: Option<Vec<u8>>, name: &str) -> Result<u32> {
    let token = token.ok_or_else(|| Error::invalid_header(format!("missing {name}")))?;
    let value = std::str::from_utf8(&token)
        .ok()
        .and_then(|s| s.parse::<u32>().ok())
        .ok_or_else(|| {
            Error::invalid_header(format!(
                "{name} `{}` is not a decimal number",
                String::from_utf8_lossy(&token)
            ))
        })?;
    if value == 0 {
        return Err(Error::invalid_header(format!("{name} is zero")));
    }
    Ok(value)
}

/// Reads the tag, width and height tokens from the fixed-size text header.
pub fn parse_header(bytes: &[u8]) -> Result<Header> {
    if bytes.len() < HEADER_LEN {
        return Err(Error::invalid_header(format!(
            "file has {} bytes, header alone needs {HEADER_LEN}",
            bytes.len()
        )));
    }
    let mut stream = bytes[..HEADER_LEN].iter().copied().peekable();

    let tag = consume_token(&mut stream).ok_or_else(|| Error::invalid_header("empty header"))?;
    let width = parse_dimension(consume_token(&mut stream), "width")?;
    let height = parse_dimension(consume_token(&mut stream), "height")?;

    Ok(Header {
        tag: String::from_utf8_lossy(&tag).into_owned(),
        width,
        height,
    })
}

/// Decodes exactly `width * height` little-endian samples.
pub fn decode_payload(payload: &[u8], width: u32, height: u32) -> Result<Vec<u16>> {
    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(2))
        .ok_or(Error::SizeMismatch {
            expected: usize::MAX,
            actual: payload.len(),
        })?;
    if payload.len() != expected {
        return Err(Error::SizeMismatch {
            expected,
            actual: payload.len(),
        });
    }

    Ok(payload
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect())
}

pub fn parse_img(bytes: &[u8]) -> Result<(Header, DepthImage)> {
    let header = parse_header(bytes)?;
    tracing::debug!(
        tag = %header.tag,
        width = header.width,
        height = header.height,
        "Parsed raw16 header"
    );
    let data = decode_payload(&bytes[HEADER_LEN..], header.width, header.height)?;
    let img = DepthImage {
        width: header.width,
        height: header.height,
        data,
    };
    Ok((header, img))
}

/// Serialises a depth image with a space-padded header.
pub fn encode_img(tag: &str, img: &DepthImage) -> Result<Vec<u8>> {
    if tag.is_empty() || tag.bytes().any(is_separator) {
        return Err(Error::invalid_header(format!(
            "tag `{tag}` must be a single non-empty token"
        )));
    }
    let mut header = format!("{} {} {}", tag, img.width, img.height).into_bytes();
    if header.len() > HEADER_LEN {
        return Err(Error::invalid_header(format!(
            "header `{}` does not fit in {HEADER_LEN} bytes",
            String::from_utf8_lossy(&header)
        )));
    }
    header.resize(HEADER_LEN, b' ');

    let mut bytes = header;
    bytes.reserve(img.data.len() * 2);
    for value in &img.data {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(text: &str) -> Vec<u8> {
        let mut bytes = text.as_bytes().to_vec();
        bytes.resize(HEADER_LEN, b' ');
        bytes
    }

    #[test]
    fn parses_padded_header() {
        let h = parse_header(&header("P5 2 1 ")).unwrap();
        assert_eq!(
            h,
            Header {
                tag: "P5".into(),
                width: 2,
                height: 1
            }
        );
    }

    #[test]
    fn parses_newline_separated_header() {
        let h = parse_header(&header("P5\n640\n480\n")).unwrap();
        assert_eq!((h.width, h.height), (640, 480));

        // NUL is not whitespace, so it sticks to the height token
        let err = parse_header(b"P5\n640\n480\0\0\0\0\0\0\0").unwrap_err();
        assert!(matches!(err, Error::InvalidHeader { .. }));
    }

    #[test]
    fn parses_vertical_tab_separated_header() {
        let h = parse_header(&header("P5\x0b2\x0b1")).unwrap();
        assert_eq!((h.tag.as_str(), h.width, h.height), ("P5", 2, 1));

        let h = parse_header(&header("P5\x0c\r7\t\x0b9")).unwrap();
        assert_eq!((h.width, h.height), (7, 9));
    }

    #[test]
    fn ignores_bytes_past_header() {
        let mut bytes = header("X 3 4");
        bytes.extend_from_slice(b"99 99");
        let h = parse_header(&bytes).unwrap();
        assert_eq!((h.tag.as_str(), h.width, h.height), ("X", 3, 4));
    }

    #[test]
    fn rejects_malformed_headers() {
        for text in ["", "P5", "P5 2", "P5 two 1", "P5 2 -1", "P5 0 4", "P5 2 1.5"] {
            let err = parse_header(&header(text)).unwrap_err();
            assert!(
                matches!(err, Error::InvalidHeader { .. }),
                "{text:?} gave {err}"
            );
        }
    }

    #[test]
    fn rejects_truncated_header() {
        let err = parse_header(b"P5 2 1").unwrap_err();
        assert!(matches!(err, Error::InvalidHeader { .. }));
    }

    #[test]
    fn decodes_little_endian_row_major() {
        let payload = [0x2c, 0x01, 0xff, 0xff, 0x00, 0x01];
        assert_eq!(decode_payload(&payload, 3, 1).unwrap(), vec![300, 65535, 256]);
    }

    #[test]
    fn rejects_wrong_payload_length() {
        let err = decode_payload(&[0; 6], 2, 2).unwrap_err();
        assert!(matches!(
            err,
            Error::SizeMismatch {
                expected: 8,
                actual: 6
            }
        ));
        let err = decode_payload(&[0; 10], 2, 2).unwrap_err();
        assert!(matches!(
            err,
            Error::SizeMismatch {
                expected: 8,
                actual: 10
            }
        ));
    }

    #[test]
    fn encode_then_parse() {
        let img = DepthImage {
            width: 2,
            height: 2,
            data: vec![1, 2, 513, 65535],
        };
        let bytes = encode_img("P5", &img).unwrap();
        assert_eq!(&bytes[..HEADER_LEN], b"P5 2 2           ");
        let (h, back) = parse_img(&bytes).unwrap();
        assert_eq!(h.tag, "P5");
        assert_eq!(back, img);
    }

    #[test]
    fn encode_rejects_oversized_header() {
        let img = DepthImage {
            width: 1_000_000,
            height: 1_000_000,
            data: vec![],
        };
        assert!(encode_img("P5", &img).is_err());
        let small = DepthImage {
            width: 1,
            height: 1,
            data: vec![0],
        };
        assert!(encode_img("two words", &small).is_err());
    }
}
