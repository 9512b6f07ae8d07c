/// Counts of participants or payloads, used as the weight in threshold computations.
pub type Weight = u64;

/// Represents the quorum thresholds used by the rounds.
///
/// Every participant carries the same weight, so the total weight of a round
/// is its number of participants.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThresholdParams {
    /// Threshold for a quorum (default: more than 2/3 of the participants)
    pub quorum: ThresholdParam,
}

impl ThresholdParams {
    /// Minimum number of identical payloads needed to reach a quorum among `participants`.
    pub fn consensus_threshold(&self, participants: usize) -> usize {
        self.quorum.min_expected(participants as Weight) as usize
    }

    /// Whether `count` matching payloads out of `participants` form a quorum.
    pub fn is_quorum(&self, count: usize, participants: usize) -> bool {
        self.quorum.is_met(count as Weight, participants as Weight)
    }
}

impl Default for ThresholdParams {
    fn default() -> Self {
        Self {
            quorum: ThresholdParam::TWO_THIRDS,
        }
    }
}

/// Represents a single quorum threshold parameter.
///
/// The threshold is met when `weight > (numerator / denominator) * total`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThresholdParam {
    /// Numerator of the threshold fraction
    pub numerator: u64,

    /// Denominator of the threshold fraction
    pub denominator: u64,
}

impl ThresholdParam {
    /// More than two thirds of the total weight, ie. `⌊2n/3⌋ + 1`.
    pub const TWO_THIRDS: Self = Self::new(2, 3);

    /// More than one half of the total weight.
    pub const ONE_HALF: Self = Self::new(1, 2);

    /// Create a new threshold parameter with the given numerator and denominator.
    pub const fn new(numerator: u64, denominator: u64) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Check whether the threshold is met.
    pub fn is_met(&self, weight: Weight, total: Weight) -> bool {
        let lhs = weight
            .checked_mul(self.denominator)
            .expect("attempt to multiply with overflow");

        let rhs = total
            .checked_mul(self.numerator)
            .expect("attempt to multiply with overflow");

        lhs > rhs
    }

    /// Return the minimum expected weight to meet the threshold when applied to the given total.
    pub fn min_expected(&self, total: Weight) -> Weight {
        1 + total
            .checked_mul(self.numerator)
            .expect("attempt to multiply with overflow")
            .checked_div(self.denominator)
            .expect("attempt to divide with overflow")
    }
}
