//! Signature-based media type detection for image payloads
//!
//! Only image formats are sniffed. Generic files keep their declared type.
//! Base64 payloads are decoded by the converter before detection.

/// A signature is a list of `(offset, bytes)` segments that must all match
struct Signature {
    media_type: &'static str,
    segments: &'static [(usize, &'static [u8])],
}

const IMAGE_SIGNATURES: &[Signature] = &[
    Signature {
        media_type: "image/png",
        segments: &[(0, &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A])],
    },
    Signature {
        media_type: "image/jpeg",
        segments: &[(0, &[0xFF, 0xD8, 0xFF])],
    },
    Signature {
        media_type: "image/gif",
        segments: &[(0, b"GIF8")],
    },
    Signature {
        media_type: "image/webp",
        segments: &[(0, b"RIFF"), (8, b"WEBP")],
    },
    Signature {
        media_type: "image/tiff",
        segments: &[(0, &[0x49, 0x49, 0x2A, 0x00])],
    },
    Signature {
        media_type: "image/tiff",
        segments: &[(0, &[0x4D, 0x4D, 0x00, 0x2A])],
    },
    Signature {
        media_type: "image/avif",
        segments: &[(4, b"ftypavif")],
    },
    Signature {
        media_type: "image/heic",
        segments: &[(4, b"ftypheic")],
    },
    Signature {
        media_type: "image/bmp",
        segments: &[(0, b"BM")],
    },
];

impl Signature {
    fn matches(&self, bytes: &[u8]) -> bool {
        self.segments.iter().all(|(offset, expected)| {
            bytes
                .get(*offset..offset + expected.len())
                .map_or(false, |actual| actual == *expected)
        })
    }
}

/// Detect an image media type from raw bytes
pub fn detect_image_media_type(bytes: &[u8]) -> Option<&'static str> {
    IMAGE_SIGNATURES
        .iter()
        .find(|signature| signature.matches(bytes))
        .map(|signature| signature.media_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];

    #[test]
    fn test_detects_png() {
        assert_eq!(detect_image_media_type(PNG_HEADER), Some("image/png"));
    }

    #[test]
    fn test_detects_webp_with_gap() {
        let mut bytes = b"RIFF".to_vec();
        bytes.extend_from_slice(&[0x24, 0x00, 0x00, 0x00]);
        bytes.extend_from_slice(b"WEBPVP8 ");
        assert_eq!(detect_image_media_type(&bytes), Some("image/webp"));
    }

    #[test]
    fn test_unknown_bytes() {
        assert_eq!(detect_image_media_type(b"plain text"), None);
        assert_eq!(detect_image_media_type(&[]), None);
    }
}
