//! Bolt protocol version constants and negotiation helpers.

/// Bolt magic preamble bytes.
pub const BOLT_MAGIC: [u8; 4] = [0x60, 0x60, 0xB0, 0x17];

/// The one protocol version this driver speaks.
pub const PROTOCOL_VERSION: (u8, u8) = (3, 0);

/// The "no version" response sent when negotiation fails.
pub const NO_VERSION: [u8; 4] = [0, 0, 0, 0];

/// Builds the 16-byte version proposal block: Bolt 3.0 in slot 0, the
/// remaining slots zeroed.
///
/// Each proposal is a 4-byte big-endian value:
/// - byte 0: padding (reserved)
/// - byte 1: range (count of prior minor versions also accepted)
/// - byte 2: minor version
/// - byte 3: major version
pub fn client_proposals() -> [u8; 16] {
    let mut proposals = [0u8; 16];
    proposals[2] = PROTOCOL_VERSION.1; // minor
    proposals[3] = PROTOCOL_VERSION.0; // major
    proposals
}

/// Parses the server's 4-byte negotiation reply into `(major, minor)`.
///
/// Returns `None` for the all-zero rejection reply.
pub fn parse_negotiated(reply: &[u8; 4]) -> Option<(u8, u8)> {
    let minor = reply[2];
    let major = reply[3];
    if major == 0 && minor == 0 {
        None
    } else {
        Some((major, minor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proposals_offer_only_v3() {
        let proposals = client_proposals();
        assert_eq!(&proposals[..4], &[0, 0, 0, 3]);
        assert_eq!(&proposals[4..], &[0u8; 12]);
    }

    #[test]
    fn parse_accepted_version() {
        assert_eq!(parse_negotiated(&[0, 0, 0, 3]), Some((3, 0)));
    }

    #[test]
    fn parse_rejection() {
        assert_eq!(parse_negotiated(&NO_VERSION), None);
    }
}
