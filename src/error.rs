use thiserror::Error;

pub type Result<T> = std::result::Result<T, SubscriptionError>;

/// Subscription store errors
///
/// Every failure of the store is a validation failure. Nothing here is
/// transient, so callers never retry.
///
/// # Error Categories
///
/// - **Validation**: `InvalidTopicFilter`, `InvalidTopicName`, `InvalidQoS`, `InvalidRetainHandling`
/// - **Capabilities**: `SharedSubscriptionNotSupported`, `WildcardSubscriptionNotSupported`,
///   `SubscriptionIdentifierNotSupported`, `QuotaExceeded`
/// - **Lookup**: `NotFound`
/// - **Configuration**: `Configuration`, `Io`
///
/// # Examples
///
/// ```
/// use mqtt_v5_subscriptions::topic::parse_filter;
/// use mqtt_v5_subscriptions::SubscriptionError;
///
/// let err = parse_filter("sport/#/ranking").unwrap_err();
/// assert!(matches!(err, SubscriptionError::InvalidTopicFilter(_)));
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    #[error("Invalid topic filter: {0}")]
    InvalidTopicFilter(String),

    #[error("Invalid topic name: {0}")]
    InvalidTopicName(String),

    #[error("Invalid QoS: {0}")]
    InvalidQoS(u8),

    #[error("Invalid retain handling: {0}")]
    InvalidRetainHandling(u8),

    #[error("No subscriptions found for client: {0}")]
    NotFound(String),

    #[error("Shared subscriptions not supported")]
    SharedSubscriptionNotSupported,

    #[error("Wildcard subscriptions not supported")]
    WildcardSubscriptionNotSupported,

    #[error("Subscription identifiers not supported")]
    SubscriptionIdentifierNotSupported,

    #[error("Quota exceeded: client {client_id} already holds {max} subscriptions")]
    QuotaExceeded { client_id: String, max: usize },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl SubscriptionError {
    /// Returns the MQTT v5.0 SUBACK reason code a protocol layer reports for this error
    #[must_use]
    pub fn reason_code(&self) -> u8 {
        match self {
            Self::InvalidTopicFilter(_) => 0x8F,
            Self::InvalidTopicName(_) => 0x90,
            Self::InvalidQoS(_) | Self::InvalidRetainHandling(_) => 0x81,
            Self::QuotaExceeded { .. } => 0x97,
            Self::SharedSubscriptionNotSupported => 0x9E,
            Self::SubscriptionIdentifierNotSupported => 0xA1,
            Self::WildcardSubscriptionNotSupported => 0xA2,
            Self::NotFound(_) | Self::Configuration(_) | Self::Io(_) => 0x80,
        }
    }

    /// Whether the error is a validation failure of the filter or topic itself
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidTopicFilter(_)
                | Self::InvalidTopicName(_)
                | Self::InvalidQoS(_)
                | Self::InvalidRetainHandling(_)
        )
    }
}

impl From<std::io::Error> for SubscriptionError {
    fn from(err: std::io::Error) -> Self {
        SubscriptionError::Io(err.to_string())
    }
}
