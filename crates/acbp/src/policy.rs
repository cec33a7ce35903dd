//! The compiled policy facade.

use std::path::Path;
use std::sync::Arc;

use acbp_compiler::{explain, link, Explanation, ValidityFunction};
use acbp_config::{EngineConfig, ModelSource};
use acbp_core::{
    CategoryTuple, CompileError, EnumerationBudgetExceeded, Mask, Model,
    ModelDeclaration, TupleError,
};
use acbp_space::{
    analyze, audit, bit_valid_masks, dead_masks, estimate, present_only, present_only_tuples,
    project, ComplexityReport, DecisionRow, DecisionSpace, Enumerator, ObservationAudit,
    PresentOnly, SizingEstimate, ValidMaskSet, Verification, VerificationReport,
};
use tracing::info;

use crate::error::PolicyError;

/// A model edition compiled under one engine configuration.
///
/// Owns the model, its validity function and its complexity report.
/// Cloning is cheap and the value can be shared across threads.
#[derive(Debug, Clone)]
pub struct CompiledPolicy {
    function: ValidityFunction,
    config: Arc<EngineConfig>,
    report: Arc<ComplexityReport>,
}

/// A materialized decision space together with its projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyArtifacts {
    pub space: DecisionSpace,
    pub masks: ValidMaskSet,
}

impl CompiledPolicy {
    /// Loads, links and analyzes a model declaration.
    pub fn compile(decl: ModelDeclaration, config: EngineConfig) -> Result<Self, CompileError> {
        Self::from_model(Arc::new(Model::load(decl)?), config)
    }

    pub fn from_model(model: Arc<Model>, config: EngineConfig) -> Result<Self, CompileError> {
        let function = link(model)?;
        let report = analyze(&function, &config);
        info!(
            event = "policy_compiled",
            model = function.model().name(),
            clauses = function.clauses().len(),
            enumeration_allowed = report.enumeration_allowed(),
        );
        Ok(Self {
            function,
            config: Arc::new(config),
            report: Arc::new(report),
        })
    }

    /// Loads a model document (JSON, TOML or YAML by extension) and
    /// compiles it.
    pub fn from_file(path: impl AsRef<Path>, config: EngineConfig) -> Result<Self, PolicyError> {
        let decl = ModelDeclaration::from_file(path)?;
        Ok(Self::compile(decl, config)?)
    }

    pub fn model(&self) -> &Arc<Model> {
        self.function.model()
    }

    pub fn function(&self) -> &ValidityFunction {
        &self.function
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn complexity(&self) -> &ComplexityReport {
        &self.report
    }

    pub fn is_valid(&self, mask: Mask, tuple: &CategoryTuple) -> bool {
        self.function.is_valid(mask, tuple)
    }

    pub fn is_valid_values<S: AsRef<str>>(
        &self,
        mask: Mask,
        values: &[S],
    ) -> Result<bool, TupleError> {
        self.function.is_valid_values(mask, values)
    }

    /// Bit-only relaxation; see [`ValidityFunction::is_valid_mask`].
    pub fn is_valid_mask(&self, mask: Mask) -> bool {
        self.function.is_valid_mask(mask)
    }

    pub fn is_mask_reachable(&self, mask: Mask) -> bool {
        self.function.is_mask_reachable(mask)
    }

    pub fn explain(&self, mask: Mask, tuple: Option<&CategoryTuple>) -> Explanation {
        explain(&self.function, mask, tuple)
    }

    /// Explains with category values given by name.
    pub fn explain_values<S: AsRef<str>>(
        &self,
        mask: Mask,
        values: Option<&[S]>,
    ) -> Result<Explanation, TupleError> {
        let tuple = values.map(|v| self.model().resolve_tuple(v)).transpose()?;
        Ok(explain(&self.function, mask, tuple.as_ref()))
    }

    /// Enumerator for this policy, refused past the guardrail.
    pub fn enumerator(&self) -> Result<Enumerator, EnumerationBudgetExceeded> {
        Enumerator::new(&self.function, &self.report)
    }

    pub fn decision_space(&self) -> Result<DecisionSpace, EnumerationBudgetExceeded> {
        Ok(self.enumerator()?.collect(self.config.enumeration_threads))
    }

    /// M, always derived from D.
    pub fn valid_masks(&self) -> Result<ValidMaskSet, EnumerationBudgetExceeded> {
        Ok(project(&self.decision_space()?))
    }

    pub fn artifacts(&self) -> Result<PolicyArtifacts, EnumerationBudgetExceeded> {
        let space = self.decision_space()?;
        let masks = project(&space);
        Ok(PolicyArtifacts { space, masks })
    }

    /// Bit-valid masks absent from `masks`.
    pub fn dead_masks(&self, masks: &ValidMaskSet) -> Result<Vec<Mask>, EnumerationBudgetExceeded> {
        self.report.check_guardrail()?;
        Ok(dead_masks(&bit_valid_masks(&self.function, &self.report), masks))
    }

    pub fn present_only<R, S>(&self, space: &DecisionSpace, observed: &[R]) -> PresentOnly
    where
        R: AsRef<[S]>,
        S: AsRef<str>,
    {
        present_only(space, self.model(), observed)
    }

    pub fn present_only_tuples(
        &self,
        space: &DecisionSpace,
        observed: &[CategoryTuple],
    ) -> PresentOnly {
        present_only_tuples(space, self.model(), observed)
    }

    /// Verifies stored artifacts.
    ///
    /// Completeness is checked against a fresh enumeration when the
    /// guardrail allows one, and skipped otherwise.
    pub fn verify(&self, rows: &[DecisionRow], masks: &[Mask]) -> VerificationReport {
        self.verify_inner(rows, masks, None)
    }

    /// Verifies stored artifacts together with a decision mapping.
    pub fn verify_with_actions(
        &self,
        rows: &[DecisionRow],
        masks: &[Mask],
        actions: &[(DecisionRow, String)],
    ) -> VerificationReport {
        self.verify_inner(rows, masks, Some(actions))
    }

    fn verify_inner(
        &self,
        rows: &[DecisionRow],
        masks: &[Mask],
        actions: Option<&[(DecisionRow, String)]>,
    ) -> VerificationReport {
        let recomputed = self.decision_space().ok();
        let mut verification = Verification::new(&self.function, rows, masks);
        if let Some(actions) = actions {
            verification = verification.with_actions(actions);
        }
        if let Some(space) = recomputed.as_ref() {
            verification = verification.with_recomputed(space);
        }
        verification.run()
    }

    pub fn sizing_estimate(&self) -> Result<SizingEstimate, EnumerationBudgetExceeded> {
        self.report.check_guardrail()?;
        let bit_valid = bit_valid_masks(&self.function, &self.report);
        Ok(estimate(&self.function, &bit_valid, self.config.category_scan_limit))
    }

    /// Audits observed `(mask, values)` records.
    pub fn audit<R, S>(&self, observed: &[(Mask, R)]) -> ObservationAudit
    where
        R: AsRef<[S]>,
        S: AsRef<str>,
    {
        audit(&self.function, observed, self.config.audit_sample_size)
    }
}
