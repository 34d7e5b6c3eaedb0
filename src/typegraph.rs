//! Type Graph - Structural Queries Over Declared Types
//!
//! The graph answers the four questions the validator needs: is a type an
//! interface, what does it directly implement, what does it extend, and what
//! is it called. It is assembled from two layers: an *environment* of types
//! already compiled before this round, and the declarations of the build
//! unit currently being compiled. A name found only in the current unit
//! resolves to a deferred reference; both reference variants answer the
//! identical query surface and callers never branch on which one they hold.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::model::{BuildUnit, DeclarationKind};

/// Structural facts about one known type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeFacts {
    pub qualified_name: String,
    #[serde(default)]
    pub is_interface: bool,
    #[serde(default)]
    pub superclass: Option<String>,
    #[serde(default)]
    pub direct_interfaces: Vec<String>,
}

/// Handle into the type graph.
///
/// `Resolved` points at a type from the already-compiled environment;
/// `Deferred` at a type still being compiled in the current unit. The
/// distinction matters only to the graph itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Resolved(String),
    Deferred(String),
}

impl TypeRef {
    pub fn qualified_name(&self) -> &str {
        match self {
            TypeRef::Resolved(name) | TypeRef::Deferred(name) => name,
        }
    }

    pub fn simple_name(&self) -> &str {
        let name = self.qualified_name();
        name.rsplit('.').next().unwrap_or(name)
    }
}

pub struct TypeGraph {
    environment: HashMap<String, TypeFacts>,
    unit: HashMap<String, TypeFacts>,
}

impl TypeGraph {
    /// Build the graph for one round: environment types plus everything the
    /// unit itself declares as a class or interface.
    pub fn for_unit(environment: Vec<TypeFacts>, unit: &BuildUnit) -> Self {
        let environment: HashMap<_, _> = environment
            .into_iter()
            .map(|t| (t.qualified_name.clone(), t))
            .collect();

        let unit_types = unit
            .declarations
            .iter()
            .filter(|d| matches!(d.kind, DeclarationKind::Class | DeclarationKind::Interface))
            .map(|d| {
                let facts = TypeFacts {
                    qualified_name: d.qualified_name.clone(),
                    is_interface: d.kind == DeclarationKind::Interface,
                    superclass: d.superclass.clone(),
                    direct_interfaces: d.direct_interfaces.clone(),
                };
                (d.qualified_name.clone(), facts)
            })
            .collect();

        Self {
            environment,
            unit: unit_types,
        }
    }

    /// Resolve a qualified name to a type handle. Environment types win over
    /// same-named unit declarations, matching how a compiler sees them.
    pub fn resolve(&self, qualified_name: &str) -> Option<TypeRef> {
        if self.environment.contains_key(qualified_name) {
            Some(TypeRef::Resolved(qualified_name.to_string()))
        } else if self.unit.contains_key(qualified_name) {
            Some(TypeRef::Deferred(qualified_name.to_string()))
        } else {
            None
        }
    }

    fn facts(&self, type_ref: &TypeRef) -> Option<&TypeFacts> {
        let name = type_ref.qualified_name();
        self.environment.get(name).or_else(|| self.unit.get(name))
    }

    pub fn is_interface(&self, type_ref: &TypeRef) -> bool {
        self.facts(type_ref).map_or(false, |f| f.is_interface)
    }

    /// Interfaces the type names directly. Transitively inherited interfaces
    /// are not included.
    pub fn direct_interfaces(&self, type_ref: &TypeRef) -> Vec<TypeRef> {
        self.facts(type_ref)
            .map(|f| {
                f.direct_interfaces
                    .iter()
                    .filter_map(|name| self.resolve(name))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The declared superclass, or `None` once the chain reaches the root.
    /// A superclass name the graph has never seen also ends the chain.
    pub fn superclass_of(&self, type_ref: &TypeRef) -> Option<TypeRef> {
        let facts = self.facts(type_ref)?;
        let superclass = facts.superclass.as_deref()?;
        self.resolve(superclass)
    }
}
