//! # Protocol Identifiers
//!
//! Which wire protocol an endpoint speaks, and the pure capability table
//! that drives chain construction. The mapping is fixed: construction
//! resolves it once, and the endpoint never re-inspects types at runtime.

use std::fmt;

/// Wire protocol spoken by a sender endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// Plain media transport.
    Media,
    /// Media transport with FEC source framing.
    MediaFec,
    /// Feedback/report control protocol.
    Control,
    /// Out-of-band session signaling. Appears in endpoint URIs but is not
    /// serviceable on the sender data path.
    Signaling,
}

/// Pipeline stages a protocol requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointCaps {
    /// Wrap the media composer in FEC source framing.
    pub needs_fec: bool,
    /// Use the control composer instead of the media composer.
    pub is_control: bool,
    /// The protocol defines inbound traffic toward the sender.
    pub supports_inbound: bool,
}

impl Protocol {
    /// Capability lookup. `None` means the sender data path cannot service
    /// this protocol and any endpoint built for it is invalid.
    pub fn capabilities(self) -> Option<EndpointCaps> {
        match self {
            Protocol::Media => Some(EndpointCaps {
                needs_fec: false,
                is_control: false,
                supports_inbound: false,
            }),
            Protocol::MediaFec => Some(EndpointCaps {
                needs_fec: true,
                is_control: false,
                supports_inbound: false,
            }),
            Protocol::Control => Some(EndpointCaps {
                needs_fec: false,
                is_control: true,
                supports_inbound: true,
            }),
            Protocol::Signaling => None,
        }
    }

    /// Parse a protocol from an endpoint URI scheme.
    pub fn from_scheme(scheme: &str) -> Option<Protocol> {
        match scheme {
            "media" => Some(Protocol::Media),
            "media+fec" => Some(Protocol::MediaFec),
            "control" => Some(Protocol::Control),
            "signal" => Some(Protocol::Signaling),
            _ => None,
        }
    }

    /// URI scheme naming this protocol.
    pub fn scheme(self) -> &'static str {
        match self {
            Protocol::Media => "media",
            Protocol::MediaFec => "media+fec",
            Protocol::Control => "control",
            Protocol::Signaling => "signal",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scheme())
    }
}
