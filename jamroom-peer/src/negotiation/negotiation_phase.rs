/// Which side of a pair sends the first offer. The peer that joins later
/// initiates toward everyone already in the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairRole {
    Initiator,
    Responder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationPhase {
    Idle,
    Offering,
    AwaitingAnswer,
    OfferReceived,
    Answering,
    Established,
    /// Restarting in place after a connectivity failure. `awaiting_answer` is
    /// set while our restart offer is outstanding; cleared when creating it failed.
    Recovering { awaiting_answer: bool },
    Closed,
}

impl NegotiationPhase {
    pub fn accepts_answer(self) -> bool {
        matches!(
            self,
            Self::AwaitingAnswer
                | Self::Recovering {
                    awaiting_answer: true
                }
        )
    }

    /// A fresh offer from the remote side is only taken when we have none of our own in flight.
    pub fn accepts_offer(self) -> bool {
        matches!(
            self,
            Self::Idle
                | Self::Established
                | Self::Recovering {
                    awaiting_answer: false
                }
        )
    }

    pub fn is_closed(self) -> bool {
        self == Self::Closed
    }
}
