use jamroom_core::{CandidateTransport, CandidateType, IceCandidate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateVerdict {
    Accept,
    /// TCP path that is not relayed; relayed TCP stays as a last resort.
    DirectTcp,
    LinkLocalV6,
}

pub fn classify_candidate(candidate: &IceCandidate) -> CandidateVerdict {
    let tcp = candidate.transport() == Some(CandidateTransport::Tcp);
    if tcp && candidate.candidate_type() != Some(CandidateType::Relay) {
        return CandidateVerdict::DirectTcp;
    }
    if candidate.is_link_local_v6() {
        return CandidateVerdict::LinkLocalV6;
    }
    CandidateVerdict::Accept
}
