//! Structural Validator - Acceptance Protocol
//!
//! Four rules, evaluated in strict order, first failure wins. A declaration
//! only ever reaches the group registry after passing every rule.

use thiserror::Error;

use crate::model::AnnotatedDeclaration;
use crate::typegraph::TypeGraph;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("the class {class} is not public")]
    NotPublic { class: String },

    #[error("the class {class} is abstract; abstract classes cannot carry the factory marker")]
    IsAbstract { class: String },

    #[error("the class {class} must directly implement the interface {target}")]
    InterfaceNotImplemented { class: String, target: String },

    #[error("the class {class} must inherit from {target}")]
    NotSubclass { class: String, target: String },

    #[error("the class {class} must provide a public empty default constructor")]
    NoDefaultConstructor { class: String },
}

impl ValidationError {
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationError::NotPublic { .. } => "NotPublic",
            ValidationError::IsAbstract { .. } => "IsAbstract",
            ValidationError::InterfaceNotImplemented { .. } => "InterfaceNotImplemented",
            ValidationError::NotSubclass { .. } => "NotSubclass",
            ValidationError::NoDefaultConstructor { .. } => "NoDefaultConstructor",
        }
    }

    pub fn origin(&self) -> &str {
        match self {
            ValidationError::NotPublic { class }
            | ValidationError::IsAbstract { class }
            | ValidationError::InterfaceNotImplemented { class, .. }
            | ValidationError::NotSubclass { class, .. }
            | ValidationError::NoDefaultConstructor { class } => class,
        }
    }
}

/// One acceptance rule. Rules are stateless; ordering is owned by the
/// validator that holds them.
pub trait StructuralRule {
    fn name(&self) -> &'static str;
    fn check(&self, decl: &AnnotatedDeclaration, graph: &TypeGraph) -> Result<(), ValidationError>;
}

/// Rule 1: the declaration must be externally constructible.
pub struct VisibilityRule;

impl StructuralRule for VisibilityRule {
    fn name(&self) -> &'static str {
        "visibility"
    }

    fn check(&self, decl: &AnnotatedDeclaration, _graph: &TypeGraph) -> Result<(), ValidationError> {
        if decl.visibility == crate::model::Visibility::Public {
            Ok(())
        } else {
            Err(ValidationError::NotPublic {
                class: decl.class_name().to_string(),
            })
        }
    }
}

/// Rule 2: no abstract classes.
pub struct ConcretenessRule;

impl StructuralRule for ConcretenessRule {
    fn name(&self) -> &'static str {
        "concreteness"
    }

    fn check(&self, decl: &AnnotatedDeclaration, _graph: &TypeGraph) -> Result<(), ValidationError> {
        if decl.is_abstract {
            Err(ValidationError::IsAbstract {
                class: decl.class_name().to_string(),
            })
        } else {
            Ok(())
        }
    }
}

/// Rule 3: hierarchy conformance against the marker's target.
///
/// Interface targets must appear in the declaration's *direct* interface
/// set; an implementation inherited through an intermediate interface is
/// rejected even though it would be behaviorally substitutable. That is a
/// known limitation of the original acceptance protocol, kept as-is.
/// Class targets are matched by walking the superclass chain one link at a
/// time and comparing qualified names.
pub struct HierarchyRule;

impl StructuralRule for HierarchyRule {
    fn name(&self) -> &'static str {
        "hierarchy"
    }

    fn check(&self, decl: &AnnotatedDeclaration, graph: &TypeGraph) -> Result<(), ValidationError> {
        let target = decl.group_qualified_name();

        if graph.is_interface(&decl.group_key) {
            let directly_implemented = graph
                .direct_interfaces(&decl.declaring_type)
                .iter()
                .any(|i| i.qualified_name() == target);
            if directly_implemented {
                Ok(())
            } else {
                Err(ValidationError::InterfaceNotImplemented {
                    class: decl.class_name().to_string(),
                    target: target.to_string(),
                })
            }
        } else {
            let mut visited = vec![decl.class_name().to_string()];
            let mut current = decl.declaring_type.clone();
            loop {
                match graph.superclass_of(&current) {
                    // Reached the root of the chain with no match.
                    None => {
                        return Err(ValidationError::NotSubclass {
                            class: decl.class_name().to_string(),
                            target: target.to_string(),
                        })
                    }
                    Some(superclass) => {
                        if superclass.qualified_name() == target {
                            return Ok(());
                        }
                        // A repeated name means the declared superclasses
                        // form a cycle; the chain can never reach the target.
                        if visited.iter().any(|v| v == superclass.qualified_name()) {
                            return Err(ValidationError::NotSubclass {
                                class: decl.class_name().to_string(),
                                target: target.to_string(),
                            });
                        }
                        visited.push(superclass.qualified_name().to_string());
                        current = superclass;
                    }
                }
            }
        }
    }
}

/// Rule 4: at least one directly declared public zero-argument constructor.
pub struct ConstructibilityRule;

impl StructuralRule for ConstructibilityRule {
    fn name(&self) -> &'static str {
        "constructibility"
    }

    fn check(&self, decl: &AnnotatedDeclaration, _graph: &TypeGraph) -> Result<(), ValidationError> {
        if decl.has_default_constructor() {
            Ok(())
        } else {
            Err(ValidationError::NoDefaultConstructor {
                class: decl.class_name().to_string(),
            })
        }
    }
}

/// Runs the rules in their fixed order and stops at the first failure.
pub struct StructuralValidator {
    rules: Vec<Box<dyn StructuralRule>>,
}

impl StructuralValidator {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(VisibilityRule),
                Box::new(ConcretenessRule),
                Box::new(HierarchyRule),
                Box::new(ConstructibilityRule),
            ],
        }
    }

    pub fn validate(
        &self,
        decl: &AnnotatedDeclaration,
        graph: &TypeGraph,
    ) -> Result<(), ValidationError> {
        for rule in &self.rules {
            rule.check(decl, graph)?;
        }
        Ok(())
    }
}

impl Default for StructuralValidator {
    fn default() -> Self {
        Self::new()
    }
}
