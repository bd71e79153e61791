//! One-way enable for the gateway subsystem

use fusion_common::crd::FeatureStrategy;

/// Outcome of applying the enable flag to the current strategy
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ToggleDecision {
    /// Strategy to write
    pub strategy: FeatureStrategy,
    /// A disable was requested on an enabled subsystem and dropped
    pub disable_ignored: bool,
}

/// Enabling always wins; disabling an enabled subsystem is ignored.
pub fn toggle(enable: bool, current: FeatureStrategy) -> ToggleDecision {
    match (enable, current) {
        (true, _) => ToggleDecision {
            strategy: FeatureStrategy::Enabled,
            disable_ignored: false,
        },
        (false, FeatureStrategy::Enabled) => ToggleDecision {
            strategy: FeatureStrategy::Enabled,
            disable_ignored: true,
        },
        (false, FeatureStrategy::Unset) => ToggleDecision {
            strategy: FeatureStrategy::Unset,
            disable_ignored: false,
        },
    }
}
