use std::fmt::{Display, Formatter};

/// Difficulty/independence level of a scaffolded exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tier {
    Detailed,
    Moderate,
    Minimal,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Detailed, Tier::Moderate, Tier::Minimal];

    pub fn code(self) -> &'static str {
        match self {
            Tier::Detailed => "TIER_1",
            Tier::Moderate => "TIER_2",
            Tier::Minimal => "TIER_3",
        }
    }

    /// Pure lookup of the scaffolding rules for this tier.
    pub fn policy(self) -> TierPolicy {
        match self {
            Tier::Detailed => TierPolicy {
                tier: self,
                min_hints: 5,
                max_hints: 7,
                max_preserved_logic_lines: 5,
                includes_examples: true,
            },
            Tier::Moderate => TierPolicy {
                tier: self,
                min_hints: 3,
                max_hints: 5,
                max_preserved_logic_lines: 5,
                includes_examples: false,
            },
            Tier::Minimal => TierPolicy {
                tier: self,
                min_hints: 2,
                max_hints: 3,
                max_preserved_logic_lines: 5,
                includes_examples: false,
            },
        }
    }
}

impl Display for Tier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Tier::Detailed => "detailed",
            Tier::Moderate => "moderate",
            Tier::Minimal => "minimal",
        };
        write!(f, "{} ({})", self.code(), name)
    }
}

/// Constant scaffolding rules for one tier. No behavior beyond lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierPolicy {
    pub tier: Tier,
    pub min_hints: usize,
    pub max_hints: usize,
    pub max_preserved_logic_lines: usize,
    pub includes_examples: bool,
}
