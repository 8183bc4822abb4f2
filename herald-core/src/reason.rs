//! MQTT v5 reason codes seen by a publishing client.
//!
//! Only the codes that can appear in CONNACK, PUBACK/PUBREC and DISCONNECT
//! packets received or sent by the client are modelled.

use core::fmt;

macro_rules! reason_codes {
    ($($(#[$meta:meta])* $name:ident = $code:literal, $text:literal;)+) => {
        /// Reason code reported by the broker or sent on disconnect.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub enum ReasonCode {
            #[default]
            Success,
            /// Shares code `0x00` with `Success`; only sent in DISCONNECT.
            NormalDisconnection,
            $($(#[$meta])* $name,)+
        }

        impl ReasonCode {
            pub fn code(&self) -> u8 {
                match self {
                    ReasonCode::Success | ReasonCode::NormalDisconnection => 0x00,
                    $(ReasonCode::$name => $code,)+
                }
            }

            /// Map a raw code to its reason. `0x00` maps to `Success`.
            pub fn from_code(code: u8) -> Option<Self> {
                match code {
                    0x00 => Some(ReasonCode::Success),
                    $($code => Some(ReasonCode::$name),)+
                    _ => None,
                }
            }

            fn text(&self) -> &'static str {
                match self {
                    ReasonCode::Success => "success",
                    ReasonCode::NormalDisconnection => "normal disconnection",
                    $(ReasonCode::$name => $text,)+
                }
            }

            /// Whether a publish acknowledged with this reason counts as delivered.
            ///
            /// "No matching subscribers" is still a successful hand-off to the broker.
            pub fn is_publish_success(&self) -> bool {
                matches!(self, ReasonCode::Success | ReasonCode::NoMatchingSubscribers)
            }
        }
    };
}

reason_codes! {
    /// Sent by the client to have the broker publish its will.
    DisconnectWithWillMessage = 0x04, "disconnect with will message";
    /// The publish was accepted but nobody is subscribed.
    NoMatchingSubscribers = 0x10, "no matching subscribers";
    UnspecifiedError = 0x80, "unspecified error";
    MalformedPacket = 0x81, "malformed packet";
    ProtocolError = 0x82, "protocol error";
    ImplementationSpecificError = 0x83, "implementation specific error";
    UnsupportedProtocolVersion = 0x84, "unsupported protocol version";
    ClientIdentifierNotValid = 0x85, "client identifier not valid";
    BadUserNameOrPassword = 0x86, "bad user name or password";
    NotAuthorized = 0x87, "not authorized";
    ServerUnavailable = 0x88, "server unavailable";
    ServerBusy = 0x89, "server busy";
    Banned = 0x8a, "banned";
    ServerShuttingDown = 0x8b, "server shutting down";
    KeepAliveTimeout = 0x8d, "keep alive timeout";
    SessionTakenOver = 0x8e, "session taken over";
    TopicNameInvalid = 0x90, "topic name invalid";
    PacketIdentifierInUse = 0x91, "packet identifier in use";
    ReceiveMaximumExceeded = 0x93, "receive maximum exceeded";
    PacketTooLarge = 0x95, "packet too large";
    MessageRateTooHigh = 0x96, "message rate too high";
    QuotaExceeded = 0x97, "quota exceeded";
    AdministrativeAction = 0x98, "administrative action";
    PayloadFormatInvalid = 0x99, "payload format invalid";
    QoSNotSupported = 0x9b, "QoS not supported";
    UseAnotherServer = 0x9c, "use another server";
    ServerMoved = 0x9d, "server moved";
    ConnectionRateExceeded = 0x9f, "connection rate exceeded";
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:02x})", self.text(), self.code())
    }
}

impl std::error::Error for ReasonCode {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_success_codes() {
        assert!(ReasonCode::Success.is_publish_success());
        assert!(ReasonCode::NoMatchingSubscribers.is_publish_success());
        assert!(!ReasonCode::QuotaExceeded.is_publish_success());
        assert!(!ReasonCode::NotAuthorized.is_publish_success());
    }

    #[test]
    fn test_from_code() {
        assert_eq!(ReasonCode::from_code(0x00), Some(ReasonCode::Success));
        assert_eq!(ReasonCode::from_code(0x97), Some(ReasonCode::QuotaExceeded));
        assert_eq!(ReasonCode::from_code(0x03), None);
        assert_eq!(ReasonCode::DisconnectWithWillMessage.code(), 0x04);
        assert_eq!(ReasonCode::NormalDisconnection.code(), 0x00);
    }

    #[test]
    fn test_display_includes_code() {
        assert_eq!(ReasonCode::QuotaExceeded.to_string(), "quota exceeded (0x97)");
        assert_eq!(ReasonCode::Success.to_string(), "success (0x00)");
    }
}
