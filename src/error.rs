// Error kinds for DMI parsing, expansion and image I/O

pub type DmiResult<T> = Result<T, DmiError>;

#[derive(thiserror::Error, Debug)]
pub enum DmiError {
    #[error("malformed descriptor: {0}")]
    MalformedDescriptor(String),

    #[error("entry `{entry}` is missing attribute `{attribute}`")]
    MissingAttribute { entry: String, attribute: String },

    #[error("state \"{state}\" has {found} pixel tiles, expected {expected}")]
    TileCountMismatch {
        state: String,
        expected: usize,
        found: usize,
    },

    #[error("image has no `Description` metadata")]
    MissingDescription,

    #[error("png error: {0}")]
    Png(String),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DmiError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedDescriptor(msg.into())
    }

    pub fn missing(entry: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::MissingAttribute {
            entry: entry.into(),
            attribute: attribute.into(),
        }
    }
}

impl From<png::DecodingError> for DmiError {
    fn from(e: png::DecodingError) -> Self {
        Self::Png(e.to_string())
    }
}

impl From<png::EncodingError> for DmiError {
    fn from(e: png::EncodingError) -> Self {
        Self::Png(e.to_string())
    }
}
