//! Declaration Scanner - Marker Intake
//!
//! Collects the marked declarations of a build unit and turns each into an
//! `AnnotatedDeclaration` for the validator. The scanner only rejects
//! malformed marker *usage*; structural conformance is the validator's job.

use thiserror::Error;

use crate::marker::FactoryMarker;
use crate::model::{AnnotatedDeclaration, BuildUnit, Declaration, DeclarationKind};
use crate::typegraph::{TypeGraph, TypeRef};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScanError {
    #[error("the factory id on {declaration} is empty; every marked declaration needs a non-empty id")]
    EmptyId { declaration: String },

    #[error("only classes can carry the factory marker; {declaration} is a {kind}")]
    TargetKindInvalid {
        declaration: String,
        kind: DeclarationKind,
    },

    #[error("factory target {target} on {declaration} names no known type")]
    TargetUnresolved {
        declaration: String,
        target: String,
    },
}

impl ScanError {
    pub fn kind(&self) -> &'static str {
        match self {
            ScanError::EmptyId { .. } => "EmptyId",
            ScanError::TargetKindInvalid { .. } => "TargetKindInvalid",
            ScanError::TargetUnresolved { .. } => "TargetUnresolved",
        }
    }

    /// Qualified name of the declaration the error originates from.
    pub fn origin(&self) -> &str {
        match self {
            ScanError::EmptyId { declaration }
            | ScanError::TargetKindInvalid { declaration, .. }
            | ScanError::TargetUnresolved { declaration, .. } => declaration,
        }
    }
}

#[derive(Debug, Default)]
pub struct DeclarationScanner;

impl DeclarationScanner {
    pub fn new() -> Self {
        Self
    }

    /// Scan one build unit. Output order is discovery order; the first
    /// malformed marker aborts the scan.
    pub fn scan(
        &self,
        unit: &BuildUnit,
        graph: &TypeGraph,
    ) -> Result<Vec<AnnotatedDeclaration>, ScanError> {
        unit.marked_declarations()
            .map(|(decl, marker)| self.scan_declaration(decl, marker, graph))
            .collect()
    }

    fn scan_declaration(
        &self,
        decl: &Declaration,
        marker: &FactoryMarker,
        graph: &TypeGraph,
    ) -> Result<AnnotatedDeclaration, ScanError> {
        // An empty id is rejected before anything else is looked at.
        if marker.id.is_empty() {
            return Err(ScanError::EmptyId {
                declaration: decl.qualified_name.clone(),
            });
        }

        if decl.kind != DeclarationKind::Class {
            return Err(ScanError::TargetKindInvalid {
                declaration: decl.qualified_name.clone(),
                kind: decl.kind,
            });
        }

        // The target may be compiled already or still in this unit; the graph
        // hands back the right reference variant either way.
        let group_key =
            graph
                .resolve(&marker.target)
                .ok_or_else(|| ScanError::TargetUnresolved {
                    declaration: decl.qualified_name.clone(),
                    target: marker.target.clone(),
                })?;

        // The declaring class is part of the unit the graph was built from,
        // so it always resolves; it only comes back Resolved instead of
        // Deferred when an environment type shadows the same name.
        let declaring_type = graph
            .resolve(&decl.qualified_name)
            .unwrap_or_else(|| TypeRef::Deferred(decl.qualified_name.clone()));

        Ok(AnnotatedDeclaration {
            id: marker.id.clone(),
            group_key,
            declaring_type,
            visibility: decl.visibility,
            is_abstract: decl.is_abstract,
            constructors: decl.constructors.clone(),
        })
    }
}
