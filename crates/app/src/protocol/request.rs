//! Request classifier for the control port.
//!
//! Requests are matched against fixed request lines and SOAP action tokens
//! in priority order; the first match wins. One read is one request:
//! pipelined requests in the same buffer are not split.

use fauxplug_domain::relay::RelayState;

const CONTROL_REQUEST_LINE: &[u8] = b"POST /upnp/control/basicevent1 HTTP/1.1";
const EVENT_SERVICE_REQUEST_LINE: &[u8] = b"GET /eventservice.xml HTTP/1.1";
const SETUP_REQUEST_LINE: &[u8] = b"GET /setup.xml HTTP/1.1";

const GET_BINARY_STATE_ACTION: &[u8] = b"urn:Belkin:service:basicevent:1#GetBinaryState";
const SET_BINARY_STATE_ACTION: &[u8] = b"urn:Belkin:service:basicevent:1#SetBinaryState";
const SOAP_ACTION_HEADER: &[u8] = b"SOAPACTION";

const BINARY_STATE_ON: &[u8] = b"<BinaryState>1</BinaryState>";
const BINARY_STATE_OFF: &[u8] = b"<BinaryState>0</BinaryState>";

/// What a control-port request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlRequest {
    /// SOAP `GetBinaryState` on the basic event service.
    GetBinaryState,
    /// `GET /eventservice.xml`.
    EventService,
    /// `GET /setup.xml`.
    Setup,
    /// SOAP `SetBinaryState`; `None` when the body carries neither literal state.
    SetBinaryState(Option<RelayState>),
    /// Anything else.
    Unrecognized,
}

impl ControlRequest {
    /// Classify raw request bytes.
    #[must_use]
    pub fn classify(data: &[u8]) -> Self {
        if data.starts_with(CONTROL_REQUEST_LINE) && contains(data, GET_BINARY_STATE_ACTION) {
            return Self::GetBinaryState;
        }
        if data.starts_with(EVENT_SERVICE_REQUEST_LINE) {
            return Self::EventService;
        }
        if data.starts_with(SETUP_REQUEST_LINE) {
            return Self::Setup;
        }
        let (headers, body) = split_head(data);
        if soap_action(headers).is_some_and(|action| contains(action, SET_BINARY_STATE_ACTION)) {
            let state = if contains(body, BINARY_STATE_ON) {
                Some(RelayState::On)
            } else if contains(body, BINARY_STATE_OFF) {
                Some(RelayState::Off)
            } else {
                None
            };
            return Self::SetBinaryState(state);
        }
        Self::Unrecognized
    }
}

/// Split a request at the blank line. Without one, the whole buffer is
/// treated as both head and body.
fn split_head(data: &[u8]) -> (&[u8], &[u8]) {
    match find(data, b"\r\n\r\n") {
        Some(pos) => (&data[..pos], &data[pos + 4..]),
        None => (data, data),
    }
}

/// Value of the `SOAPACTION` header, matched case-insensitively.
fn soap_action(headers: &[u8]) -> Option<&[u8]> {
    headers.split(|&b| b == b'\n').find_map(|line| {
        let colon = line.iter().position(|&b| b == b':')?;
        let (name, value) = line.split_at(colon);
        name.trim_ascii()
            .eq_ignore_ascii_case(SOAP_ACTION_HEADER)
            .then_some(&value[1..])
    })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    find(haystack, needle).is_some()
}
