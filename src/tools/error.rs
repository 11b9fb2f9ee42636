/// Category of a reception error, driving the drop policy of the receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// ALC/LCT header or FEC payload ID fails to parse
    MalformedHeader,
    /// Content encoding other than null
    UnsupportedEncoding,
    /// FEC encoding ID outside the supported set
    UnknownScheme,
    /// SBN or ESI outside the block partitioning
    OutOfRange,
    /// File reassembled but its MD5 differs from the announced Content-MD5
    Md5Mismatch,
    /// The Raptor decoder could not invert within the overhead budget
    FecDecodeFailed,
    /// Unparseable FDT XML or missing required attributes
    MalformedFdt,
}

/// Generic FLUTE Error
#[derive(Debug)]
pub struct FluteError {
    /// Error category
    pub kind: ErrorKind,
    message: String,
}

///
pub type Result<T> = std::result::Result<T, FluteError>;

impl FluteError {
    /// Return a new FLUTE Error with a message
    pub fn new<E>(kind: ErrorKind, msg: E) -> Self
    where
        E: std::fmt::Display,
    {
        let message = msg.to_string();
        log::warn!("{:?} {}", kind, message);
        FluteError { kind, message }
    }
}

impl std::fmt::Display for FluteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for FluteError {}
