//! Round Processor - Single Entry Point
//!
//! One round = one complete scan → validate → group → emit pass over a build
//! unit, invoked by an external build driver. The first scan or validation
//! failure aborts the whole round with zero emission; there are no
//! partially-correct factories. `&mut self` makes rounds mutually exclusive
//! without any locking.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::diagnostics::{Diagnostic, DiagnosticsSink};
use crate::emitter::{ArtifactSink, CodeEmitter, EmitError, GeneratedFactory};
use crate::model::BuildUnit;
use crate::registry::{GroupRegistry, RegistryError};
use crate::scanner::{DeclarationScanner, ScanError};
use crate::typegraph::{TypeFacts, TypeGraph};
use crate::validator::{StructuralValidator, ValidationError};
use crate::TOOL_VERSION;

#[cfg(feature = "test-hooks")]
use std::sync::atomic::{AtomicU32, Ordering};

#[cfg(feature = "test-hooks")]
static VALIDATION_CALL_COUNT: AtomicU32 = AtomicU32::new(0);

#[cfg(feature = "test-hooks")]
pub fn get_validation_call_count() -> u32 {
    VALIDATION_CALL_COUNT.load(Ordering::SeqCst)
}

#[cfg(feature = "test-hooks")]
pub fn reset_validation_call_count() {
    VALIDATION_CALL_COUNT.store(0, Ordering::SeqCst);
}

#[derive(Debug, Error)]
pub enum RoundError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Emit(#[from] EmitError),

    #[error("the build unit {unit} requires tool >= {required}, running {current}")]
    ToolVersionMismatch {
        unit: String,
        required: String,
        current: String,
    },

    #[error("invalid build-unit manifest: {0}")]
    InvalidManifest(String),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FactorySummary {
    pub factory_name: String,
    pub group_key: String,
    pub entries: usize,
    pub source_hash: String,
}

impl From<&GeneratedFactory> for FactorySummary {
    fn from(artifact: &GeneratedFactory) -> Self {
        Self {
            factory_name: artifact.factory_name.clone(),
            group_key: artifact.group_key.clone(),
            entries: artifact.entries.len(),
            source_hash: artifact.source_hash.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundReport {
    pub round_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub tool_version: String,
    pub unit: String,
    pub factories: Vec<FactorySummary>,
}

pub struct RoundProcessor {
    environment: Vec<TypeFacts>,
    scanner: DeclarationScanner,
    validator: StructuralValidator,
    registry: GroupRegistry,
    emitter: CodeEmitter,
}

impl RoundProcessor {
    pub fn new() -> Self {
        Self::with_environment(Vec::new())
    }

    /// `environment` holds the types already compiled before any round; the
    /// build unit's own declarations are layered on top per round.
    pub fn with_environment(environment: Vec<TypeFacts>) -> Self {
        Self {
            environment,
            scanner: DeclarationScanner::new(),
            validator: StructuralValidator::new(),
            registry: GroupRegistry::new(),
            emitter: CodeEmitter::new(),
        }
    }

    /// Run one complete round.
    ///
    /// On any scan or validation failure the registry is cleared and nothing
    /// is emitted. On an emission write failure, factories already written
    /// stay written; the driver is expected to re-run a later round.
    pub fn process(
        &mut self,
        unit: &BuildUnit,
        sink: &mut dyn ArtifactSink,
        diagnostics: &mut dyn DiagnosticsSink,
    ) -> Result<RoundReport, RoundError> {
        let round_id = Uuid::new_v4();
        let started_at = Utc::now();

        self.check_tool_version(unit)?;

        let graph = TypeGraph::for_unit(self.environment.clone(), unit);

        let scanned = match self.scanner.scan(unit, &graph) {
            Ok(scanned) => scanned,
            Err(err) => {
                diagnostics.report(Diagnostic::new(
                    err.kind(),
                    Some(err.origin().to_string()),
                    err.to_string(),
                ));
                self.registry.clear();
                return Err(err.into());
            }
        };

        for decl in &scanned {
            #[cfg(feature = "test-hooks")]
            VALIDATION_CALL_COUNT.fetch_add(1, Ordering::SeqCst);

            if let Err(err) = self.validator.validate(decl, &graph) {
                diagnostics.report(Diagnostic::new(
                    err.kind(),
                    Some(err.origin().to_string()),
                    err.to_string(),
                ));
                self.registry.clear();
                return Err(err.into());
            }

            if let Err(err) = self.registry.add(decl) {
                diagnostics.report(Diagnostic::new(
                    err.kind(),
                    Some(err.origin().to_string()),
                    err.to_string(),
                ));
                self.registry.clear();
                return Err(err.into());
            }
        }

        // Scanning is complete; groups are finalized. Draining doubles as
        // the mandatory clear-before-next-round step.
        let groups = self.registry.drain();

        let mut factories = Vec::with_capacity(groups.len());
        for group in &groups {
            let artifact = self.emitter.emit(group);
            if let Err(err) = sink.write(&artifact) {
                // Round-scoped failure: no originating declaration.
                diagnostics.report(Diagnostic::new(err.kind(), None, err.to_string()));
                return Err(err.into());
            }
            factories.push(FactorySummary::from(&artifact));
        }

        Ok(RoundReport {
            round_id,
            started_at,
            tool_version: TOOL_VERSION.to_string(),
            unit: unit.name.clone(),
            factories,
        })
    }

    fn check_tool_version(&self, unit: &BuildUnit) -> Result<(), RoundError> {
        let Some(required) = unit.min_tool_version.as_deref() else {
            return Ok(());
        };
        let required_version = semver::Version::parse(required)
            .map_err(|e| RoundError::InvalidManifest(format!("minToolVersion: {}", e)))?;
        let current = semver::Version::parse(TOOL_VERSION)
            .map_err(|e| RoundError::InvalidManifest(format!("tool version: {}", e)))?;

        if current < required_version {
            return Err(RoundError::ToolVersionMismatch {
                unit: unit.name.clone(),
                required: required.to_string(),
                current: TOOL_VERSION.to_string(),
            });
        }
        Ok(())
    }
}

impl Default for RoundProcessor {
    fn default() -> Self {
        Self::new()
    }
}
