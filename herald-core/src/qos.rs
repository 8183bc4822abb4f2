use core::convert::TryFrom;

use thiserror::Error;

/// Delivery guarantee requested for a message or subscription.
#[repr(u8)]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub enum QoS {
    #[default]
    AtMostOnce = 0,
    AtLeastOnce = 1,
    ExactlyOnce = 2,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("invalid QoS level {0}")]
pub struct InvalidQoS(pub u8);

impl QoS {
    /// Whether delivery can survive a reconnect, i.e. the session resends it.
    pub fn survives_reconnect(self) -> bool {
        self != QoS::AtMostOnce
    }
}

impl TryFrom<u8> for QoS {
    type Error = InvalidQoS;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        match n {
            0x00 => Ok(QoS::AtMostOnce),
            0x01 => Ok(QoS::AtLeastOnce),
            0x02 => Ok(QoS::ExactlyOnce),
            other => Err(InvalidQoS(other)),
        }
    }
}

impl From<QoS> for u8 {
    fn from(qos: QoS) -> u8 {
        qos as u8
    }
}
