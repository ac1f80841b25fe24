//! Description documents and SOAP envelopes served by every switch.

use fauxplug_domain::device::DeviceIdentity;
use fauxplug_domain::relay::RelayState;

/// Service description fetched from `/eventservice.xml`.
pub const EVENT_SERVICE_XML: &str = r#"<?scpd xmlns="urn:Belkin:service-1-0"?>
<actionList>
  <action>
    <name>SetBinaryState</name>
    <argumentList>
      <argument>
        <retval/>
        <name>BinaryState</name>
        <relatedStateVariable>BinaryState</relatedStateVariable>
        <direction>in</direction>
      </argument>
    </argumentList>
     <serviceStateTable>
      <stateVariable sendEvents="yes">
        <name>BinaryState</name>
        <dataType>Boolean</dataType>
        <defaultValue>0</defaultValue>
      </stateVariable>
      <stateVariable sendEvents="yes">
        <name>level</name>
        <dataType>string</dataType>
        <defaultValue>0</defaultValue>
      </stateVariable>
    </serviceStateTable>
  </action>
</scpd>
"#;

/// Render the device description fetched from `/setup.xml`.
#[must_use]
pub fn setup_xml(identity: &DeviceIdentity) -> String {
    format!(
        r#"<?xml version="1.0"?>
<root>
  <device>
    <deviceType>urn:LeMaRiva:device:controllee:1</deviceType>
    <friendlyName>{name}</friendlyName>
    <manufacturer>Belkin International Inc.</manufacturer>
    <modelName>Emulated Socket</modelName>
    <modelNumber>3.1415</modelNumber>
    <UDN>{udn}</UDN>
    <serialNumber>221517K0101769</serialNumber>
    <binaryState>0</binaryState>
    <serviceList>
      <service>
          <serviceType>urn:Belkin:service:basicevent:1</serviceType>
          <serviceId>urn:Belkin:serviceId:basicevent1</serviceId>
          <controlURL>/upnp/control/basicevent1</controlURL>
          <eventSubURL>/upnp/event/basicevent1</eventSubURL>
          <SCPDURL>/eventservice.xml</SCPDURL>
      </service>
    </serviceList>
  </device>
</root>
"#,
        name = escape_xml(identity.name()),
        udn = identity.udn(),
    )
}

/// Render the `GetBinaryStateResponse` envelope reporting `state`.
#[must_use]
pub fn binary_state_envelope(state: RelayState) -> String {
    format!(
        r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/">
  <s:Body>
    <u:GetBinaryStateResponse xmlns:u="urn:Belkin:service:basicevent:1">
      <BinaryState>{digit}</BinaryState>
    </u:GetBinaryStateResponse>
  </s:Body>
</s:Envelope>
"#,
        digit = state.binary_digit(),
    )
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}
