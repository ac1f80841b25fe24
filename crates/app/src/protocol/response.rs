//! HTTP responses for the control port and SSDP search responses.
//!
//! Every control response declares `CONNECTION: close`, but the server leaves
//! closing to the peer.

use super::{SEARCH_TARGET, SERVER_BANNER, USER_AGENT_HEADER};

/// `LAST-MODIFIED` value of the static description documents.
pub const DOCUMENT_LAST_MODIFIED: &str = "Sat, 01 Jan 2000 00:01:15 GMT";

/// Cache lifetime announced in discovery replies, in seconds.
pub const SEARCH_MAX_AGE: u32 = 86_400;

/// Wrap a SOAP envelope in a `200 OK` response.
#[must_use]
pub fn soap_response(envelope: &str, date: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\n\
         CONTENT-LENGTH: {len}\r\n\
         CONTENT-TYPE: text/xml charset=\"utf-8\"\r\n\
         DATE: {date}\r\n\
         EXT:\r\n\
         SERVER: {SERVER_BANNER}\r\n\
         {USER_AGENT_HEADER}\r\n\
         CONNECTION: close\r\n\
         \r\n\
         {envelope}",
        len = envelope.len(),
    )
}

/// Wrap a description document in a `200 OK` response.
#[must_use]
pub fn document_response(document: &str, date: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\n\
         CONTENT-LENGTH: {len}\r\n\
         CONTENT-TYPE: text/xml\r\n\
         DATE: {date}\r\n\
         LAST-MODIFIED: {DOCUMENT_LAST_MODIFIED}\r\n\
         SERVER: {SERVER_BANNER}\r\n\
         {USER_AGENT_HEADER}\r\n\
         CONNECTION: close\r\n\
         \r\n\
         {document}",
        len = document.len(),
    )
}

/// Fields of one unicast reply to an SSDP search.
#[derive(Debug, Clone, Copy)]
pub struct SearchResponse<'a> {
    /// URL of the device's `setup.xml`.
    pub location: &'a str,
    /// `Socket-1_0-<serial>`.
    pub persistent_id: &'a str,
    /// Per-boot identifier sent as `01-NLS`.
    pub boot_id: &'a str,
    /// Headers appended after the standard set.
    pub extra_headers: &'a [String],
    pub date: &'a str,
}

impl SearchResponse<'_> {
    /// Render the datagram payload.
    #[must_use]
    pub fn render(&self) -> String {
        let mut message = format!(
            "HTTP/1.1 200 OK\r\n\
             CACHE-CONTROL: max-age={SEARCH_MAX_AGE}\r\n\
             DATE: {date}\r\n\
             EXT:\r\n\
             LOCATION: {location}\r\n\
             OPT: \"http://schemas.upnp.org/upnp/1/0/\"; ns=01\r\n\
             01-NLS: {boot_id}\r\n\
             SERVER: {SERVER_BANNER}\r\n\
             ST: {SEARCH_TARGET}\r\n\
             USN: uuid:{persistent_id}::{SEARCH_TARGET}\r\n",
            date = self.date,
            location = self.location,
            boot_id = self.boot_id,
            persistent_id = self.persistent_id,
        );
        for header in self.extra_headers {
            message.push_str(header);
            message.push_str("\r\n");
        }
        message.push_str("\r\n");
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATE: &str = "Sun, 05 Mar 2017 07:08:09 GMT";

    fn split(response: &str) -> (&str, &str) {
        response.split_once("\r\n\r\n").unwrap()
    }

    fn header<'a>(head: &'a str, name: &str) -> Option<&'a str> {
        head.lines()
            .find_map(|line| line.strip_prefix(&format!("{name}: ")))
    }

    #[test]
    fn should_declare_exact_content_length_for_soap() {
        let envelope = "<s:Envelope>é</s:Envelope>";
        let response = soap_response(envelope, DATE);
        let (head, body) = split(&response);
        assert!(head.starts_with("HTTP/1.1 200 OK"));
        assert_eq!(body, envelope);
        assert_eq!(
            header(head, "CONTENT-LENGTH"),
            Some(envelope.len().to_string().as_str())
        );
        assert_eq!(header(head, "DATE"), Some(DATE));
        assert_eq!(header(head, "CONNECTION"), Some("close"));
    }

    #[test]
    fn should_mark_documents_with_last_modified() {
        let response = document_response("<root/>", DATE);
        let (head, body) = split(&response);
        assert_eq!(body, "<root/>");
        assert_eq!(header(head, "CONTENT-TYPE"), Some("text/xml"));
        assert_eq!(header(head, "LAST-MODIFIED"), Some(DOCUMENT_LAST_MODIFIED));
        assert_eq!(header(head, "X-User-Agent"), Some("redsonic"));
    }

    #[test]
    fn should_render_search_response_with_extra_headers_before_blank_line() {
        let extra = vec!["X-User-Agent: redsonic".to_string()];
        let message = SearchResponse {
            location: "http://192.168.1.20:12340/setup.xml",
            persistent_id: "Socket-1_0-1356c656446617",
            boot_id: "boot",
            extra_headers: &extra,
            date: DATE,
        }
        .render();

        assert!(message.ends_with("X-User-Agent: redsonic\r\n\r\n"));
        let (head, rest) = split(&message);
        assert!(rest.is_empty());
        assert_eq!(
            header(head, "LOCATION"),
            Some("http://192.168.1.20:12340/setup.xml")
        );
        assert_eq!(header(head, "ST"), Some("urn:Belkin:device:**"));
        assert_eq!(
            header(head, "USN"),
            Some("uuid:Socket-1_0-1356c656446617::urn:Belkin:device:**")
        );
        assert_eq!(header(head, "01-NLS"), Some("boot"));
        assert_eq!(header(head, "CACHE-CONTROL"), Some("max-age=86400"));
    }
}
