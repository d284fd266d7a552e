use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Caller errors
    #[error("Missing required field: {field}")]
    InvalidArgument { field: &'static str },

    #[error("Verification already pending for uid {uid}")]
    DuplicateKey { uid: String },

    // Device availability
    #[error("No scanner connection available")]
    NoDeviceAvailable,

    #[error("Scanner did not reply within {ms}ms")]
    Timeout { ms: u64 },

    #[error("Connection closed")]
    ConnectionClosed,

    // Inbound message errors
    #[error("Malformed device message: {reason}")]
    MalformedDeviceMessage { reason: String },

    #[error("Frame exceeds maximum size: {size} > {max}")]
    FrameTooLarge { size: usize, max: usize },

    #[error("Codec error: {0}")]
    Codec(String),

    // External record service
    #[error("Record service failure: {0}")]
    RecordService(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Coarse HTTP status for surfacing gateway errors to web callers.
    ///
    /// The HTTP layer itself lives outside this workspace; it only needs
    /// this mapping to translate façade results into responses.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self {
            Error::InvalidArgument { .. } => 400,
            Error::DuplicateKey { .. } => 409,
            Error::NoDeviceAvailable => 503,
            _ => 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(Error::InvalidArgument { field: "uid" }.http_status(), 400);
        assert_eq!(Error::NoDeviceAvailable.http_status(), 503);
        assert_eq!(Error::Timeout { ms: 15000 }.http_status(), 500);
        assert_eq!(
            Error::DuplicateKey {
                uid: "u1".to_string()
            }
            .http_status(),
            409
        );
    }
}
