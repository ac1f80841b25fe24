//! Switch service: answers control-port requests for one emulated switch.

use std::sync::Arc;

use fauxplug_domain::device::DeviceIdentity;
use fauxplug_domain::relay::RelayState;
use fauxplug_domain::time::http_date;

use crate::ports::{ActionHandler, Clock, UnconfiguredHandler};
use crate::protocol::request::ControlRequest;
use crate::protocol::response::{document_response, soap_response};
use crate::protocol::templates::{EVENT_SERVICE_XML, binary_state_envelope, setup_xml};

/// One emulated on/off switch: identity, in-memory relay state, and the
/// handler that performs the actual state change.
pub struct SwitchService {
    identity: DeviceIdentity,
    relay: RelayState,
    handler: Box<dyn ActionHandler>,
    clock: Arc<dyn Clock>,
}

impl SwitchService {
    /// Create a switch delegating state changes to `handler`.
    ///
    /// Without a handler the switch uses [`UnconfiguredHandler`]: it can be
    /// switched off but never on.
    pub fn new(
        identity: DeviceIdentity,
        handler: Option<Box<dyn ActionHandler>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            identity,
            relay: RelayState::Off,
            handler: handler.unwrap_or_else(|| Box::new(UnconfiguredHandler)),
            clock,
        }
    }

    #[must_use]
    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    /// Current relay state.
    ///
    /// Every recognised state change updates it, even when the handler then fails.
    #[must_use]
    pub fn relay_state(&self) -> RelayState {
        self.relay
    }

    /// Handle one raw request and return the response to write, if any.
    ///
    /// No response is produced for unrecognised requests, for
    /// `SetBinaryState` without a recognised state literal, or when the
    /// handler reports failure.
    #[tracing::instrument(skip(self, data), fields(device = %self.identity.name()))]
    pub fn handle_request(&mut self, data: &[u8]) -> Option<String> {
        match ControlRequest::classify(data) {
            ControlRequest::GetBinaryState => {
                tracing::debug!(state = %self.relay, "reporting binary state");
                Some(self.binary_state_response())
            }
            ControlRequest::EventService => {
                tracing::debug!("serving eventservice.xml");
                Some(document_response(EVENT_SERVICE_XML, &self.date()))
            }
            ControlRequest::Setup => {
                tracing::debug!("serving setup.xml");
                Some(document_response(&setup_xml(&self.identity), &self.date()))
            }
            ControlRequest::SetBinaryState(Some(state)) => {
                tracing::debug!(%state, "switching");
                self.relay = state;
                if self.handler.apply(state) {
                    Some(self.binary_state_response())
                } else {
                    tracing::warn!(%state, "action handler failed, not answering");
                    None
                }
            }
            ControlRequest::SetBinaryState(None) => {
                tracing::debug!("unknown binary state request");
                tracing::trace!(request = %String::from_utf8_lossy(data));
                None
            }
            ControlRequest::Unrecognized => {
                tracing::trace!(request = %String::from_utf8_lossy(data), "unrecognised request");
                None
            }
        }
    }

    fn binary_state_response(&self) -> String {
        soap_response(&binary_state_envelope(self.relay), &self.date())
    }

    fn date(&self) -> String {
        http_date(self.clock.now())
    }
}

impl std::fmt::Debug for SwitchService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwitchService")
            .field("identity", &self.identity)
            .field("relay", &self.relay)
            .finish_non_exhaustive()
    }
}
