use jamroom_core::IceCandidate;

/// Input to one pair session, in the order it must be applied.
#[derive(Debug, Clone, PartialEq)]
pub enum PairCommand {
    RemoteOffer(String),
    RemoteAnswer(String),
    /// `None` is the remote's end-of-candidates marker.
    RemoteCandidate(Option<IceCandidate>),
    /// The disconnect grace period ran out.
    GraceElapsed,
    Close,
}
