use crate::error::{Result, SubscriptionError};
use serde::{Deserialize, Serialize};

/// Quality of Service level requested by a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum QoS {
    #[default]
    AtMostOnce = 0,
    AtLeastOnce = 1,
    ExactlyOnce = 2,
}

impl TryFrom<u8> for QoS {
    type Error = SubscriptionError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(QoS::AtMostOnce),
            1 => Ok(QoS::AtLeastOnce),
            2 => Ok(QoS::ExactlyOnce),
            _ => Err(SubscriptionError::InvalidQoS(value)),
        }
    }
}

impl From<QoS> for u8 {
    fn from(qos: QoS) -> Self {
        qos as u8
    }
}

/// Retain handling option of a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RetainHandling {
    /// Send retained messages at subscribe time
    #[default]
    SendAtSubscribe = 0,
    /// Send retained messages at subscribe time only if the subscription is new
    SendIfNew = 1,
    /// Never send retained messages at subscribe time
    DontSend = 2,
}

impl TryFrom<u8> for RetainHandling {
    type Error = SubscriptionError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(RetainHandling::SendAtSubscribe),
            1 => Ok(RetainHandling::SendIfNew),
            2 => Ok(RetainHandling::DontSend),
            _ => Err(SubscriptionError::InvalidRetainHandling(value)),
        }
    }
}

impl From<RetainHandling> for u8 {
    fn from(rh: RetainHandling) -> Self {
        rh as u8
    }
}

/// A topic entry of a decoded SUBSCRIBE packet
///
/// `name` is the raw subscribed name and may carry a `$share/<group>/` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubscribedTopic {
    pub name: String,
    pub qos: QoS,
    pub no_local: bool,
    pub retain_as_published: bool,
    pub retain_handling: RetainHandling,
}

impl SubscribedTopic {
    #[must_use]
    pub fn new(name: impl Into<String>, qos: QoS) -> Self {
        Self {
            name: name.into(),
            qos,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_no_local(mut self, no_local: bool) -> Self {
        self.no_local = no_local;
        self
    }

    #[must_use]
    pub fn with_retain_as_published(mut self, rap: bool) -> Self {
        self.retain_as_published = rap;
        self
    }

    #[must_use]
    pub fn with_retain_handling(mut self, rh: RetainHandling) -> Self {
        self.retain_handling = rh;
        self
    }
}
