use crate::ThresholdParams;

/// Consensus parameters shared by every round of an application.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConsensusParams {
    /// Upper bound on the number of participants.
    ///
    /// Used as the expected number of participants while they are not declared yet,
    /// eg. when registering at startup.
    pub max_participants: usize,

    /// The quorum thresholds.
    pub threshold_params: ThresholdParams,
}

impl ConsensusParams {
    pub fn new(max_participants: usize) -> Self {
        Self {
            max_participants,
            threshold_params: ThresholdParams::default(),
        }
    }

    pub fn with_threshold_params(self, threshold_params: ThresholdParams) -> Self {
        Self {
            threshold_params,
            ..self
        }
    }
}
