//! ASCIIHexDecode and ASCII85Decode

use crate::error::{Error, Result};

#[inline]
fn is_pdf_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'\x0C' | b'\0')
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Decode an ASCIIHex stream. A trailing odd digit is padded with zero.
pub fn decode_hex(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len() / 2);
    let mut high: Option<u8> = None;

    for (pos, &b) in data.iter().enumerate() {
        if b == b'>' {
            break;
        }
        if is_pdf_whitespace(b) {
            continue;
        }
        let v = hex_value(b).ok_or_else(|| {
            Error::filter(
                "ASCIIHexDecode",
                format!("invalid hex digit 0x{b:02X} at offset {pos}"),
            )
        })?;
        match high.take() {
            Some(h) => out.push((h << 4) | v),
            None => high = Some(v),
        }
    }

    if let Some(h) = high {
        out.push(h << 4);
    }
    Ok(out)
}

/// Decode an ASCII85 stream up to the `~>` terminator
pub fn decode_85(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len() * 4 / 5);
    let mut group = [0u8; 5];
    let mut n = 0usize;

    for (pos, &b) in data.iter().enumerate() {
        match b {
            b'~' => break,
            b'z' if n == 0 => out.extend_from_slice(&[0; 4]),
            b'!'..=b'u' => {
                group[n] = b - b'!';
                n += 1;
                if n == 5 {
                    out.extend_from_slice(&group_value(&group, pos)?.to_be_bytes());
                    n = 0;
                }
            }
            b if is_pdf_whitespace(b) => {}
            _ => {
                return Err(Error::filter(
                    "ASCII85Decode",
                    format!("invalid character 0x{b:02X} at offset {pos}"),
                ));
            }
        }
    }

    match n {
        0 => {}
        1 => {
            return Err(Error::filter(
                "ASCII85Decode",
                "final group has a single character",
            ));
        }
        _ => {
            for slot in group.iter_mut().skip(n) {
                *slot = 84;
            }
            let bytes = group_value(&group, data.len())?.to_be_bytes();
            out.extend_from_slice(&bytes[..n - 1]);
        }
    }

    Ok(out)
}

fn group_value(group: &[u8; 5], pos: usize) -> Result<u32> {
    let value = group
        .iter()
        .fold(0u64, |acc, &d| acc * 85 + d as u64);
    u32::try_from(value).map_err(|_| {
        Error::filter(
            "ASCII85Decode",
            format!("group ending at offset {pos} overflows 32 bits"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_basic() {
        assert_eq!(decode_hex(b"48 65 6C6c6F>").unwrap(), b"Hello");
    }

    #[test]
    fn test_hex_odd_digit_padded() {
        assert_eq!(decode_hex(b"ABC>").unwrap(), vec![0xAB, 0xC0]);
    }

    #[test]
    fn test_hex_invalid_digit() {
        assert!(decode_hex(b"4G>").is_err());
    }

    #[test]
    fn test_85_basic() {
        // "Man " encodes to "9jqo^"
        assert_eq!(decode_85(b"9jqo^~>").unwrap(), b"Man ");
    }

    #[test]
    fn test_85_z_and_partial_group() {
        let out = decode_85(b"z9jqo^Bla~>").unwrap();
        assert_eq!(&out[..4], &[0, 0, 0, 0]);
        assert_eq!(&out[4..], b"Man is");
    }

    #[test]
    fn test_85_invalid() {
        assert!(decode_85(b"9jq{o~>").is_err());
    }
}
