//! The network thread: connects to a broker candidate, runs the transport
//! loop while the session lasts and backs off between failed attempts.

use std::{sync::Arc, time::Duration};

use tracing::{debug, error, info, warn};

use crate::{
    broker::{BrokerCandidate, RegistrationId},
    client::Inner,
    event::DisconnectReason,
    state::ConnectionState,
    transport::{Transport, TransportError},
};

/// Linear reconnect delay: `step` per consecutive failure, capped at `max`.
#[derive(Debug, Clone)]
pub(crate) struct Backoff {
    step: Duration,
    max: Duration,
    attempts: u32,
}

impl Backoff {
    pub(crate) fn new(step: Duration, max: Duration) -> Self {
        Self {
            step,
            max,
            attempts: 0,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.attempts = 0;
    }

    pub(crate) fn next_delay(&mut self) -> Duration {
        self.attempts = self.attempts.saturating_add(1);
        self.step.saturating_mul(self.attempts).min(self.max)
    }
}

pub(crate) fn run_network_loop<T: Transport>(inner: Arc<Inner<T>>) {
    debug!("Network thread started");
    let mut backoff = Backoff::new(inner.reconnect_delay_step, inner.reconnect_delay_max);
    let mut delay: Option<Duration> = None;

    loop {
        {
            let mut state = inner.lock();
            while inner.is_running() && (state.brokers.is_empty() || delay.is_some()) {
                state = match delay.take() {
                    Some(timeout) => inner.wait_broker_change_timeout(state, timeout),
                    None => inner.wait_broker_change(state),
                };
            }
            if !inner.is_running() {
                break;
            }
            state.connection = ConnectionState::Connecting;
            state.session_established = false;
        }

        let result = connect_broker(&inner);
        if !inner.is_running() {
            break;
        }

        let established = match result {
            Ok(()) => run_session(&inner),
            Err(e) => {
                warn!("Failed to connect to any broker: {}", e);
                false
            }
        };
        if !inner.is_running() {
            break;
        }

        if established {
            backoff.reset();
        } else {
            let next = backoff.next_delay();
            info!("Retrying broker connection in {:?}", next);
            delay = Some(next);
        }
        let mut state = inner.lock();
        if state.connection == ConnectionState::Connecting {
            state.connection = ConnectionState::Disconnected;
        }
    }
    debug!("Network thread stopped");
}

/// Try the broker used last, then every registered candidate in turn.
fn connect_broker<T: Transport>(inner: &Inner<T>) -> Result<(), TransportError> {
    let in_use = {
        let state = inner.lock();
        state
            .using_broker
            .filter(|id| state.brokers.contains_key(id))
    };
    if let Some(id) = in_use {
        match inner.transport.reconnect() {
            Ok(()) => {
                debug!("Reconnecting to broker {}", id);
                return Ok(());
            }
            Err(e) => warn!("Failed to reconnect to broker {}: {}", id, e),
        }
    }

    let candidates: Vec<(RegistrationId, Arc<BrokerCandidate>)> = {
        let state = inner.lock();
        state
            .brokers
            .iter()
            .map(|(id, broker)| (*id, Arc::clone(broker)))
            .collect()
    };

    let mut last_error = TransportError::NotConnected;
    for (id, broker) in candidates {
        match inner.transport.connect(&broker, &inner.connect_params) {
            Ok(()) => {
                info!("Connecting to broker {}", broker);
                inner.lock().using_broker = Some(id);
                return Ok(());
            }
            Err(e) => {
                error!("Failed to connect to broker {}: {}", broker, e);
                last_error = e;
            }
        }
    }
    Err(last_error)
}

/// Drive the transport until the session ends. Returns whether the broker
/// accepted the session at some point.
fn run_session<T: Transport>(inner: &Arc<Inner<T>>) -> bool {
    while inner.is_running() {
        if let Err(e) = inner.transport.run(inner.keep_alive, &**inner) {
            debug!("Network loop ended: {}", e);
            break;
        }
    }

    let (connected, established) = {
        let state = inner.lock();
        (state.connected, state.session_established)
    };
    if connected {
        inner.handle_disconnect(DisconnectReason::ConnectionLost);
    }
    established
}
