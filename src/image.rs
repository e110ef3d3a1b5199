//! Uploaded images: format detection and transport encoding.
//!
//! An [`Image`] is validated once at upload time.  Only JPEG, PNG and WEBP
//! containers are accepted, detected from their magic bytes rather than the
//! file name so a mislabelled file is still handled correctly.

use std::sync::atomic::{AtomicU64, Ordering};

use base64::{engine::general_purpose::STANDARD, Engine};
use thiserror::Error;

// ---------------------------------------------------------------------------
// UploadError
// ---------------------------------------------------------------------------

/// Errors raised while accepting an uploaded image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    /// The upload contained no bytes.
    #[error("the uploaded file is empty")]
    Empty,

    /// The bytes are not a JPEG, PNG or WEBP image.
    #[error("unsupported image format (expected JPEG, PNG or WEBP)")]
    UnsupportedFormat,

    /// The file could not be read from disk.
    #[error("could not read image: {0}")]
    Read(String),
}

// ---------------------------------------------------------------------------
// ImageFormat
// ---------------------------------------------------------------------------

/// Container formats accepted for analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Webp,
}

impl ImageFormat {
    /// Sniff the container format from the leading magic bytes.
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            Some(Self::Png)
        } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Some(Self::Webp)
        } else {
            None
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Jpeg => "JPEG",
            Self::Png => "PNG",
            Self::Webp => "WEBP",
        }
    }
}

// ---------------------------------------------------------------------------
// ImageId
// ---------------------------------------------------------------------------

/// Identity of one upload.  Every upload gets a new id, even when the same
/// file is uploaded twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageId(u64);

impl ImageId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for ImageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Image
// ---------------------------------------------------------------------------

/// A validated, in-memory image awaiting analysis.
#[derive(Debug, Clone)]
pub struct Image {
    id: ImageId,
    name: String,
    format: ImageFormat,
    bytes: Vec<u8>,
}

impl Image {
    /// Validate `bytes` and wrap them as a new upload.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, UploadError> {
        if bytes.is_empty() {
            return Err(UploadError::Empty);
        }
        let format = ImageFormat::detect(&bytes).ok_or(UploadError::UnsupportedFormat)?;
        Ok(Self {
            id: ImageId::next(),
            name: name.into(),
            format,
            bytes,
        })
    }

    /// Read and validate an image file.
    pub fn from_path(path: &std::path::Path) -> Result<Self, UploadError> {
        let bytes = std::fs::read(path).map_err(|e| UploadError::Read(e.to_string()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::from_bytes(name, bytes)
    }

    pub fn id(&self) -> ImageId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Size of the encoded image in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Give up the validated bytes, e.g. to hand them to the session.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Encode as a `data:<mime>;base64,<payload>` URI for the vision API.
    pub fn to_data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.format.mime_type(),
            STANDARD.encode(&self.bytes)
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn png_bytes() -> Vec<u8> {
        let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        bytes.extend_from_slice(&[0, 0, 0, 13, b'I', b'H', b'D', b'R']);
        bytes
    }

    pub(crate) fn jpeg_bytes() -> Vec<u8> {
        vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F']
    }

    fn webp_bytes() -> Vec<u8> {
        let mut bytes = b"RIFF".to_vec();
        bytes.extend_from_slice(&[0x24, 0, 0, 0]);
        bytes.extend_from_slice(b"WEBPVP8 ");
        bytes
    }

    #[test]
    fn detects_supported_formats() {
        assert_eq!(ImageFormat::detect(&jpeg_bytes()), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::detect(&png_bytes()), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::detect(&webp_bytes()), Some(ImageFormat::Webp));
    }

    #[test]
    fn rejects_gif_and_riff_audio() {
        assert_eq!(ImageFormat::detect(b"GIF89a......"), None);
        assert_eq!(ImageFormat::detect(b"RIFF\0\0\0\0WAVEfmt "), None);
        assert_eq!(ImageFormat::detect(b"RIFF"), None);
    }

    #[test]
    fn empty_upload_is_rejected() {
        assert_eq!(
            Image::from_bytes("empty.png", Vec::new()).unwrap_err(),
            UploadError::Empty
        );
    }

    #[test]
    fn unsupported_upload_is_rejected() {
        assert_eq!(
            Image::from_bytes("notes.txt", b"hello world".to_vec()).unwrap_err(),
            UploadError::UnsupportedFormat
        );
    }

    #[test]
    fn each_upload_gets_a_new_id() {
        let a = Image::from_bytes("a.png", png_bytes()).unwrap();
        let b = Image::from_bytes("a.png", png_bytes()).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn data_uri_uses_detected_mime() {
        let img = Image::from_bytes("photo.png", jpeg_bytes()).unwrap();
        let uri = img.to_data_uri();
        assert!(uri.starts_with("data:image/jpeg;base64,"));
        assert!(uri.ends_with(&STANDARD.encode(jpeg_bytes())));
    }

    #[test]
    fn from_path_reads_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("street.png");
        std::fs::write(&path, png_bytes()).unwrap();

        let img = Image::from_path(&path).unwrap();
        assert_eq!(img.name(), "street.png");
        assert_eq!(img.format(), ImageFormat::Png);
        assert_eq!(img.size(), png_bytes().len());
    }

    #[test]
    fn from_path_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Image::from_path(&dir.path().join("missing.jpg")).unwrap_err();
        assert!(matches!(err, UploadError::Read(_)));
    }
}
