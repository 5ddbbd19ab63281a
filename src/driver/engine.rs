use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use tracing::debug;

use crate::core::analyze::{PythonAnalyzer, StructuralAnalyzer};
use crate::core::convert::{convert, ScaffoldedCode};
use crate::core::diag::format_snippet;
use crate::core::hint::{HintGenerator, TemplateRegistry};
use crate::core::unit::SourceUnit;
use crate::core::verify::{verify, Severity, VerifierConfig, Verification};

/// Hint-quality floor below which a unit is flagged for review.
const MIN_ACCEPTED_HINT_SCORE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Accepted,
    Flagged,
    Failed,
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Status::Accepted => "ACCEPTED",
            Status::Flagged => "FLAGGED",
            Status::Failed => "FAILED",
        };
        write!(f, "{name}")
    }
}

/// Everything produced for one unit: the scaffold, the four verifier
/// reports, and the accept/flag decision. Failed units carry the rendered
/// analysis error instead of a scaffold.
#[derive(Debug, Clone)]
pub struct ConversionReport {
    pub context_id: String,
    pub status: Status,
    pub scaffolded_code: Option<ScaffoldedCode>,
    pub verification: Option<Verification>,
    pub failure: Option<String>,
}

impl Display for ConversionReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "unit {} -> {}", self.context_id, self.status)?;
        if let Some(failure) = &self.failure {
            return write!(f, "{failure}");
        }
        let (Some(code), Some(check)) = (&self.scaffolded_code, &self.verification) else {
            return Ok(());
        };
        writeln!(f, "hints:")?;
        for hint in &code.hints {
            writeln!(f, "  [{}] {}", hint.category, hint.content)?;
        }
        if !code.todo_markers.is_empty() {
            writeln!(f, "todo markers: {}", code.todo_markers.len())?;
        }
        for violation in &check.violations {
            writeln!(f, "solution leak ({}):", violation.severity)?;
            writeln!(
                f,
                "{}",
                format_snippet(&code.body, violation.span, "logic left in scaffold")
            )?;
        }
        writeln!(
            f,
            "type-hint coverage: {:.2}{}",
            check.type_hint_report.coverage,
            if check.type_hint_report.missing.is_empty() {
                String::new()
            } else {
                format!(" (missing: {})", check.type_hint_report.missing.join(", "))
            }
        )?;
        writeln!(f, "hint quality: {:.2}", check.hint_quality_report.score)?;
        for issue in &check.hint_quality_report.issues {
            writeln!(f, "  - {issue}")?;
        }
        let tier = &check.tier_consistency_report;
        match tier.observed_tier {
            Some(observed) => writeln!(
                f,
                "tier: declared {}, observed {}",
                tier.declared_tier, observed
            )?,
            None => writeln!(f, "tier: declared {}, observed none", tier.declared_tier)?,
        }
        for issue in &tier.issues {
            writeln!(f, "  - {issue}")?;
        }
        for finding in &check.inconclusive {
            writeln!(f, "inconclusive: {finding}")?;
        }
        Ok(())
    }
}

/// Coarse-grained cancellation shared between the caller and the batch
/// workers; checked between units, never mid-analysis.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Orchestrates analyze, convert and verify for each unit. Holds the injected
/// template registry and verifier knobs; one engine instance per worker pool
/// is fine since nothing here is mutated after construction.
pub struct ConversionEngine {
    registry: TemplateRegistry,
    config: VerifierConfig,
    analyzer: Box<dyn StructuralAnalyzer>,
}

impl ConversionEngine {
    pub fn new(registry: TemplateRegistry, config: VerifierConfig) -> Self {
        Self {
            registry,
            config,
            analyzer: Box::new(PythonAnalyzer),
        }
    }

    /// Swaps in a different source-language analyzer behind the same
    /// downstream pipeline.
    pub fn with_analyzer(mut self, analyzer: Box<dyn StructuralAnalyzer>) -> Self {
        self.analyzer = analyzer;
        self
    }

    /// Runs one unit through the whole lifecycle. An analysis failure is
    /// local-fatal to this unit only; the caller's batch continues.
    pub fn convert_unit(&self, unit: &SourceUnit) -> ConversionReport {
        let context_id = unit.context_id.as_str();
        debug!(context_id, state = "RECEIVED");

        let analyzed = match self.analyzer.analyze(&unit.source_text, unit.declared_kind) {
            Ok(analyzed) => analyzed,
            Err(err) => {
                debug!(context_id, state = "FAILED", error = %err);
                let failure = format_snippet(&unit.source_text, err.span(), &err);
                return ConversionReport {
                    context_id: unit.context_id.clone(),
                    status: Status::Failed,
                    scaffolded_code: None,
                    verification: None,
                    failure: Some(failure),
                };
            }
        };
        debug!(context_id, state = "ANALYZED");

        let policy = unit.declared_tier.policy();
        let hints = HintGenerator::new(&self.registry);
        let code = convert(
            &unit.source_text,
            &analyzed,
            unit.declared_kind,
            &policy,
            &hints,
        );
        debug!(context_id, state = "CONVERTED");

        let verification = verify(
            &code,
            &analyzed.features,
            &unit.source_text,
            unit.declared_kind,
            unit.declared_tier,
            &self.config,
            context_id,
        );
        debug!(context_id, state = "VERIFIED");

        let status = decide(&verification);
        debug!(context_id, state = %status);
        ConversionReport {
            context_id: unit.context_id.clone(),
            status,
            scaffolded_code: Some(code),
            verification: Some(verification),
            failure: None,
        }
    }

    /// Fans units out across scoped workers pulling from a shared index, then
    /// joins the per-worker results back into input order. No core data
    /// structure is mutated by more than one worker. Cancellation truncates
    /// the remaining work; finished reports are always returned whole.
    pub fn convert_batch(
        &self,
        units: &[SourceUnit],
        cancel: &CancelToken,
    ) -> Vec<ConversionReport> {
        if units.is_empty() {
            return Vec::new();
        }
        let workers = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .min(units.len());
        let next = AtomicUsize::new(0);

        let mut collected: Vec<(usize, ConversionReport)> = thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    scope.spawn(|| {
                        let mut out = Vec::new();
                        loop {
                            if cancel.is_cancelled() {
                                break;
                            }
                            let index = next.fetch_add(1, Ordering::SeqCst);
                            if index >= units.len() {
                                break;
                            }
                            out.push((index, self.convert_unit(&units[index])));
                        }
                        out
                    })
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|handle| handle.join().unwrap_or_default())
                .collect()
        });

        collected.sort_by_key(|(index, _)| *index);
        collected.into_iter().map(|(_, report)| report).collect()
    }
}

/// FLAGGED units are never dropped; they keep their full report set. LOW
/// violations (flawed examples) do not flag on their own.
fn decide(verification: &Verification) -> Status {
    let leaked = verification
        .violations
        .iter()
        .any(|v| v.severity == Severity::High);
    if leaked
        || !verification.tier_consistency_report.issues.is_empty()
        || !verification.inconclusive.is_empty()
        || verification.hint_quality_report.score < MIN_ACCEPTED_HINT_SCORE
    {
        Status::Flagged
    } else {
        Status::Accepted
    }
}
