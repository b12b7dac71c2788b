use serde::{Deserialize, Serialize};
use std::net::Ipv6Addr;

/// Connectivity candidate as browsers serialize `RTCIceCandidate`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdp_mid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdp_m_line_index: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username_fragment: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateTransport {
    Udp,
    Tcp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateType {
    Host,
    ServerReflexive,
    PeerReflexive,
    Relay,
}

impl IceCandidate {
    pub fn new(candidate: impl Into<String>) -> Self {
        Self {
            candidate: candidate.into(),
            sdp_mid: None,
            sdp_m_line_index: None,
            username_fragment: None,
        }
    }

    // candidate:<foundation> <component> <transport> <priority> <address> <port> typ <type> ...
    fn field(&self, index: usize) -> Option<&str> {
        self.candidate.split_whitespace().nth(index)
    }

    pub fn transport(&self) -> Option<CandidateTransport> {
        let transport = self.field(2)?;
        if transport.eq_ignore_ascii_case("udp") {
            Some(CandidateTransport::Udp)
        } else if transport.eq_ignore_ascii_case("tcp") {
            Some(CandidateTransport::Tcp)
        } else {
            None
        }
    }

    pub fn address(&self) -> Option<&str> {
        self.field(4)
    }

    pub fn candidate_type(&self) -> Option<CandidateType> {
        let mut tokens = self.candidate.split_whitespace();
        tokens.find(|t| *t == "typ")?;
        match tokens.next()? {
            "host" => Some(CandidateType::Host),
            "srflx" => Some(CandidateType::ServerReflexive),
            "prflx" => Some(CandidateType::PeerReflexive),
            "relay" => Some(CandidateType::Relay),
            _ => None,
        }
    }

    /// `fe80::/10` address.
    pub fn is_link_local_v6(&self) -> bool {
        self.address()
            .and_then(|a| a.parse::<Ipv6Addr>().ok())
            .is_some_and(|ip| ip.segments()[0] & 0xffc0 == 0xfe80)
    }
}
