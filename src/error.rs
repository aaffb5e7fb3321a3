use std::path::PathBuf;

#[derive(Debug)]
pub enum Error {
    /// No input files were given.
    Usage,
    Io(std::io::Error),
    InvalidHeader {
        reason: String,
    },
    SizeMismatch {
        expected: usize,
        actual: usize,
    },
    EncodePng(png::EncodingError),
    DecodePng(png::DecodingError),
    UnsupportedPng {
        color_type: png::ColorType,
        bit_depth: png::BitDepth,
    },
    Verify {
        reason: String,
    },
    File {
        path: PathBuf,
        source: Box<Error>,
    },
    /// Per-file failures collected while carrying on with the rest.
    Batch {
        failures: Vec<Error>,
        total: usize,
    },
}

impl Error {
    pub(crate) fn invalid_header(reason: impl Into<String>) -> Self {
        Self::InvalidHeader {
            reason: reason.into(),
        }
    }

    pub(crate) fn verify(reason: impl Into<String>) -> Self {
        Self::Verify {
            reason: reason.into(),
        }
    }

    pub(crate) fn in_file(self, path: impl Into<PathBuf>) -> Self {
        Self::File {
            path: path.into(),
            source: Box::new(self),
        }
    }

    /// Innermost error, with any file context stripped.
    #[cfg(test)]
    pub fn root(&self) -> &Error {
        match self {
            Self::File { source, .. } => source.root(),
            e => e,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Usage => write!(f, "no input files given"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::InvalidHeader { reason } => write!(f, "parse error: {reason}"),
            Self::SizeMismatch { expected, actual } => write!(
                f,
                "size mismatch: payload has {actual} bytes, header implies {expected}"
            ),
            Self::EncodePng(e) => write!(f, "failed encoding PNG: {e}"),
            Self::DecodePng(e) => write!(f, "failed decoding PNG: {e}"),
            Self::UnsupportedPng {
                color_type,
                bit_depth,
            } => write!(
                f,
                "unsupported PNG layout {color_type:?} at {bit_depth:?}, expected 8-bit RGBA"
            ),
            Self::Verify { reason } => write!(f, "verification failed: {reason}"),
            Self::File { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Batch { failures, total } => {
                write!(f, "{} of {total} files failed to convert", failures.len())?;
                for e in failures {
                    write!(f, "\n  {e}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::EncodePng(e) => Some(e),
            Self::DecodePng(e) => Some(e),
            Self::File { source, .. } => Some(&**source),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<png::EncodingError> for Error {
    fn from(e: png::EncodingError) -> Self {
        Self::EncodePng(e)
    }
}

impl From<png::DecodingError> for Error {
    fn from(e: png::DecodingError) -> Self {
        Self::DecodePng(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_context_names_path_and_kind() {
        let e = Error::SizeMismatch {
            expected: 8,
            actual: 6,
        }
        .in_file("depth/frame0001.raw");
        let msg = e.to_string();
        assert!(msg.starts_with("depth/frame0001.raw: size mismatch"));
        assert!(matches!(e.root(), Error::SizeMismatch { expected: 8, actual: 6 }));
    }

    #[test]
    fn batch_lists_every_failure() {
        let e = Error::Batch {
            failures: vec![
                Error::invalid_header("missing height").in_file("a.raw"),
                Error::Io(std::io::ErrorKind::NotFound.into()).in_file("b.raw"),
            ],
            total: 3,
        };
        let msg = e.to_string();
        let mut lines = msg.lines();
        assert_eq!(lines.next(), Some("2 of 3 files failed to convert"));
        assert_eq!(lines.next(), Some("  a.raw: parse error: missing height"));
        assert!(lines.next().is_some_and(|l| l.starts_with("  b.raw: I/O error")));
        assert_eq!(lines.next(), None);
    }
}
