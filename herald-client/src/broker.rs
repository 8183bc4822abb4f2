use core::fmt;

/// Opaque id under which an external registrar announces a broker.
pub type RegistrationId = u64;

/// A broker endpoint the client may connect to.
///
/// Never mutated after creation. The client keeps candidates behind `Arc`
/// so a connect attempt can work on a snapshot while the registrar adds
/// or removes entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BrokerCandidate {
    host: String,
    port: u16,
}

impl BrokerCandidate {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for BrokerCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
