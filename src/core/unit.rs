use std::fmt::{Display, Formatter};

use crate::core::policy::Tier;

/// What kind of reference implementation a code block was declared to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    Function,
    Class,
    Algorithm,
    Test,
}

impl Display for UnitKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            UnitKind::Function => "function",
            UnitKind::Class => "class",
            UnitKind::Algorithm => "algorithm",
            UnitKind::Test => "test",
        };
        write!(f, "{name}")
    }
}

/// One complete, runnable reference implementation extracted from teaching
/// material by the discovery collaborator. Immutable input.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    pub source_text: String,
    pub declared_kind: UnitKind,
    pub declared_tier: Tier,
    pub context_id: String,
}

impl SourceUnit {
    pub fn new(
        source_text: impl Into<String>,
        declared_kind: UnitKind,
        declared_tier: Tier,
        context_id: impl Into<String>,
    ) -> Self {
        Self {
            source_text: source_text.into(),
            declared_kind,
            declared_tier,
            context_id: context_id.into(),
        }
    }
}
