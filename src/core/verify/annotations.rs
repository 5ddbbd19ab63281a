use crate::core::analyze::StructuralFeatureSet;
use crate::core::unit::UnitKind;

/// Parameter and return annotation coverage. Receiver parameters (`self`,
/// `cls`) are never expected to carry one.
#[derive(Debug, Clone, Default)]
pub struct TypeHintReport {
    pub coverage: f64,
    pub missing: Vec<String>,
}

pub(super) fn validate(features: &StructuralFeatureSet, kind: UnitKind) -> TypeHintReport {
    let mut expected = 0usize;
    let mut annotated = 0usize;
    let mut missing = Vec::new();

    for param in features.params.iter().filter(|p| !p.is_receiver) {
        expected += 1;
        if param.annotation.is_some() {
            annotated += 1;
        } else {
            missing.push(param.name.clone());
        }
    }

    // Tests conventionally omit a return annotation; a class unit has no
    // return position of its own.
    if !matches!(kind, UnitKind::Test | UnitKind::Class) {
        expected += 1;
        if features.return_annotation.is_some() {
            annotated += 1;
        } else {
            missing.push("return".to_string());
        }
    }

    let coverage = if expected == 0 {
        1.0
    } else {
        annotated as f64 / expected as f64
    };
    TypeHintReport { coverage, missing }
}
