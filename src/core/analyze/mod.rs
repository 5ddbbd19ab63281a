mod features;

pub use features::{call_names, extract, extract_def, ParamInfo, StructuralFeatureSet};

use thiserror::Error;

use crate::core::diag::Span;
use crate::core::lexer::{LexError, Lexer, Token};
use crate::core::parse::{ParseError, Parser};
use crate::core::tree::UnitTree;
use crate::core::unit::UnitKind;

#[derive(Debug, Clone, Error)]
pub enum AnalyzeError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl AnalyzeError {
    pub fn span(&self) -> Span {
        match self {
            AnalyzeError::Lex(e) => e.span(),
            AnalyzeError::Parse(e) => e.span(),
        }
    }
}

/// A parsed unit together with its derived structural profile.
#[derive(Debug, Clone)]
pub struct AnalyzedUnit {
    pub tree: UnitTree,
    pub features: StructuralFeatureSet,
}

/// Capability interface for structural analysis. Any source language can sit
/// behind this; downstream components only see the language-neutral
/// `StructuralFeatureSet` and tree shape.
pub trait StructuralAnalyzer: Send + Sync {
    fn analyze(&self, source: &str, kind: UnitKind) -> Result<AnalyzedUnit, AnalyzeError>;
}

/// Structural analyzer for Python source units.
#[derive(Debug, Default)]
pub struct PythonAnalyzer;

impl StructuralAnalyzer for PythonAnalyzer {
    fn analyze(&self, source: &str, _kind: UnitKind) -> Result<AnalyzedUnit, AnalyzeError> {
        let lexer = Lexer::new(source);
        let tokens = lexer
            .tokenize()
            .collect::<Result<Vec<Token>, LexError>>()?;

        let mut parser = Parser::new(source, &tokens);
        let tree = parser.parse()?;
        let features = extract(&tree);
        Ok(AnalyzedUnit { tree, features })
    }
}

#[cfg(test)]
#[path = "../../tests/analyze/t_features.rs"]
mod tests;
