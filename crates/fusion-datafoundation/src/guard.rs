//! Device-set ratchet: the applied count never goes down

/// Outcome of comparing the planned count with what is provisioned
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScaleDecision {
    /// Count to write
    pub applied: u64,
    /// Count the offering asked for
    pub desired: u64,
    /// Count already provisioned
    pub current: u64,
}

impl ScaleDecision {
    /// The offering asked for fewer device sets than exist
    pub fn downscale_rejected(&self) -> bool {
        self.desired < self.current
    }
}

/// Apply the non-decreasing rule
pub fn guard(desired: u64, current: u64) -> ScaleDecision {
    ScaleDecision {
        applied: desired.max(current),
        desired,
        current,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(3, 5, 5, true)]
    #[case(5, 2, 5, false)]
    #[case(5, 5, 5, false)]
    #[case(3, 0, 3, false)]
    #[case(0, 0, 0, false)]
    fn never_scales_down(
        #[case] desired: u64,
        #[case] current: u64,
        #[case] applied: u64,
        #[case] rejected: bool,
    ) {
        let decision = guard(desired, current);
        assert_eq!(decision.applied, applied);
        assert_eq!(decision.downscale_rejected(), rejected);
    }
}
