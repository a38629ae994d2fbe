use core::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// No stored password for a target SSID that is not open
    CredentialMissing,
    /// Malformed `aa:bb:cc:dd:ee:ff` address string
    BssidParse,
    /// The radio-busy guard rejected a new scan request
    ScanInProgress,
    /// The driver reported a failed scan
    ScanFailed,
    /// Bounded association wait exhausted
    ConnectTimeout,
    /// A rescan observed a network that does not match the requested target
    RescanMismatch,
    /// The durable settings store could not be initialized
    PersistenceUnavailable,
    /// No detected network has a stored credential
    NoKnownNetwork,
    /// Radio driver operation failed
    Radio,
    /// Settings store operation failed
    Storage,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::CredentialMissing => write!(f, "No credential for target network"),
            Error::BssidParse => write!(f, "Malformed BSSID string"),
            Error::ScanInProgress => write!(f, "Scan already in progress"),
            Error::ScanFailed => write!(f, "Scan failed"),
            Error::ConnectTimeout => write!(f, "Connection attempt timed out"),
            Error::RescanMismatch => write!(f, "Rescan result does not match target"),
            Error::PersistenceUnavailable => write!(f, "Settings store unavailable"),
            Error::NoKnownNetwork => write!(f, "No known network detected"),
            Error::Radio => write!(f, "Radio driver error"),
            Error::Storage => write!(f, "Settings store error"),
        }
    }
}

pub type Result<T> = core::result::Result<T, Error>;
