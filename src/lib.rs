//! Factorygen Core - Annotation-Driven Factory Generator
//!
//! # The Round Contract (Non-Negotiable)
//! 1. Scan, Then Validate, Then Group, Then Emit
//! 2. Nothing Enters A Group Unvalidated
//! 3. First Failure Aborts The Round
//! 4. Ids Are Unique Per Group
//! 5. Emission Is Deterministic
//! 6. The Registry Is Empty When The Round Ends

pub mod demo;
pub mod diagnostics;
pub mod dispatch;
pub mod emitter;
pub mod marker;
pub mod model;
pub mod processor;
pub mod registry;
pub mod scanner;
pub mod typegraph;
pub mod validator;

pub use diagnostics::{CollectingSink, Diagnostic, DiagnosticsSink};
pub use dispatch::{DispatchError, DispatchTable};
pub use emitter::{ArtifactSink, CodeEmitter, EmitError, FsSink, GeneratedFactory, MemorySink};
pub use marker::FactoryMarker;
pub use model::{
    AnnotatedDeclaration, BuildUnit, ConstructorSignature, Declaration, DeclarationKind, Visibility,
};
pub use processor::{RoundError, RoundProcessor, RoundReport};
pub use registry::{Group, GroupRegistry, RegistryError};
pub use scanner::{DeclarationScanner, ScanError};
pub use typegraph::{TypeFacts, TypeGraph, TypeRef};
pub use validator::{StructuralValidator, ValidationError};

pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");
