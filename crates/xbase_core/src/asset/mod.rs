//! Read-only access to files bundled with the application package.
//!
//! # Responsibility
//! - Define the host-platform seam (`AssetStore`) for path-addressed assets.
//! - Provide list/exists/size/open/read helpers over any store.
//! - Classify every failure as `InvalidPath`, `NotFound`, `Io` or `Decode`.
//!
//! # Invariants
//! - Asset paths are slash-separated, relative, and never contain `..`.
//! - Every stream opened by a read helper is closed exactly once before the
//!   helper returns, on success and on failure.
//! - Failures are logged once at the reader boundary.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;

pub mod properties;
mod reader;
mod store;

pub use properties::{parse_properties, Properties, PropertiesError};
pub use reader::{AssetReader, AssetStream, READ_BUFFER_SIZE};
pub use store::{AssetStore, DirAssetStore, HandleStats, MemoryAssetStore};

pub type AssetResult<T> = Result<T, AssetError>;

/// Content kind that failed to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeKind {
    Text,
    Properties,
    Image,
}

impl DecodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Properties => "properties",
            Self::Image => "image",
        }
    }
}

/// Failure reading one asset.
#[derive(Debug)]
pub enum AssetError {
    /// Path is absolute, empty where a file is required, or escapes the root.
    InvalidPath(String),
    /// No asset exists at this path.
    NotFound(String),
    /// The store failed while opening or reading the asset.
    Io { path: String, source: io::Error },
    /// Bytes were read but could not be decoded as the requested content.
    Decode {
        path: String,
        kind: DecodeKind,
        source: Box<dyn Error + Send + Sync>,
    },
}

impl AssetError {
    /// Path of the asset this error refers to.
    pub fn path(&self) -> &str {
        match self {
            Self::InvalidPath(path) | Self::NotFound(path) => path,
            Self::Io { path, .. } | Self::Decode { path, .. } => path,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Stable code used in structured log lines and FFI envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidPath(_) => "invalid_path",
            Self::NotFound(_) => "not_found",
            Self::Io { .. } => "io_error",
            Self::Decode { .. } => "decode_error",
        }
    }

    pub(crate) fn from_io(path: &str, err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            Self::NotFound(path.to_string())
        } else {
            Self::Io {
                path: path.to_string(),
                source: err,
            }
        }
    }

    pub(crate) fn decode(
        path: &str,
        kind: DecodeKind,
        source: impl Into<Box<dyn Error + Send + Sync>>,
    ) -> Self {
        Self::Decode {
            path: path.to_string(),
            kind,
            source: source.into(),
        }
    }
}

impl Display for AssetError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPath(path) => write!(f, "invalid asset path: `{path}`"),
            Self::NotFound(path) => write!(f, "asset not found: `{path}`"),
            Self::Io { path, source } => write!(f, "failed to read asset `{path}`: {source}"),
            Self::Decode { path, kind, source } => write!(
                f,
                "failed to decode asset `{path}` as {}: {source}",
                kind.as_str()
            ),
        }
    }
}

impl Error for AssetError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidPath(_) | Self::NotFound(_) => None,
            Self::Io { source, .. } => Some(source),
            Self::Decode { source, .. } => Some(source.as_ref()),
        }
    }
}

/// Normalizes an asset path: drops empty and `.` segments, and rejects
/// absolute paths, drive prefixes and `..` segments.
///
/// Returns the empty string for the asset root.
pub(crate) fn normalize_path(raw: &str) -> AssetResult<String> {
    if raw.starts_with('/') || raw.starts_with('\\') {
        return Err(AssetError::InvalidPath(raw.to_string()));
    }

    let mut segments = Vec::new();
    for (index, segment) in raw.split(['/', '\\']).enumerate() {
        if index == 0 && is_drive_prefix(segment) {
            return Err(AssetError::InvalidPath(raw.to_string()));
        }
        match segment {
            "" | "." => continue,
            ".." => return Err(AssetError::InvalidPath(raw.to_string())),
            other => segments.push(other),
        }
    }
    Ok(segments.join("/"))
}

/// `C:` style first segment.
fn is_drive_prefix(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    bytes.len() == 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}
