use jamroom_core::PeerId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NegotiationError {
    #[error("peer connection to {remote} failed to {step}: {source}")]
    Connection {
        remote: PeerId,
        step: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("no pair session for {0}")]
    UnknownPeer(PeerId),
}

impl NegotiationError {
    pub(crate) fn connection(remote: &PeerId, step: &'static str, source: anyhow::Error) -> Self {
        Self::Connection {
            remote: remote.clone(),
            step,
            source: source.into(),
        }
    }
}
