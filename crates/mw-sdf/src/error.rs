use core::fmt;

/// `(width, height, channels)` of a pixel buffer.
pub type Shape = (usize, usize, usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SdfError {
    /// Source and destination disagree in size or channel count.
    DimensionMismatch { expected: Shape, actual: Shape },
    /// Source is not a 4-channel RGBA buffer.
    UnsupportedChannelLayout { channels: usize },
    /// Both the inside and the outside pass are disabled.
    DegenerateConfig,
    /// Alpha sample count does not equal `width * height`.
    SampleCountMismatch { expected: usize, actual: usize },
    EmptyImage,
    Core(mw_core::Error),
}

pub type SdfResult<T> = Result<T, SdfError>;

impl fmt::Display for SdfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DimensionMismatch { expected, actual } => write!(
                f,
                "dimension mismatch: expected {}x{}x{}, got {}x{}x{}",
                expected.0, expected.1, expected.2, actual.0, actual.1, actual.2
            ),
            Self::UnsupportedChannelLayout { channels } => {
                write!(f, "unsupported channel layout: {channels} channels, need RGBA")
            }
            Self::DegenerateConfig => {
                write!(f, "degenerate config: max_inside and max_outside are both disabled")
            }
            Self::SampleCountMismatch { expected, actual } => {
                write!(f, "sample count mismatch: expected {expected}, got {actual}")
            }
            Self::EmptyImage => write!(f, "image has zero width or height"),
            Self::Core(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for SdfError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Core(err) => Some(err),
            _ => None,
        }
    }
}

impl From<mw_core::Error> for SdfError {
    fn from(err: mw_core::Error) -> Self {
        Self::Core(err)
    }
}
