//! Build-Unit Declaration Model
//!
//! A `BuildUnit` is the set of declarations handed to one processing round.
//! Declarations are plain data: the scanner and validator query them, the
//! registry groups them, nothing mutates them after construction.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::marker::FactoryMarker;
use crate::typegraph::TypeRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    NonPublic,
}

/// Declaration kinds the scanner can observe.
///
/// Only `Class` is instantiable; a marker on any other kind is a usage error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationKind {
    Class,
    Interface,
    Function,
    Field,
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DeclarationKind::Class => "class",
            DeclarationKind::Interface => "interface",
            DeclarationKind::Function => "function",
            DeclarationKind::Field => "field",
        };
        f.write_str(label)
    }
}

/// A directly declared constructor. Inherited constructors are never modeled;
/// the default-constructor rule only looks at what the class itself declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstructorSignature {
    pub parameter_count: usize,
    pub visibility: Visibility,
}

impl ConstructorSignature {
    /// Public, zero-argument. The only shape the generated factory can call.
    pub fn is_default(&self) -> bool {
        self.parameter_count == 0 && self.visibility == Visibility::Public
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Declaration {
    pub qualified_name: String,
    pub kind: DeclarationKind,
    #[serde(default = "default_visibility")]
    pub visibility: Visibility,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub superclass: Option<String>,
    #[serde(default)]
    pub direct_interfaces: Vec<String>,
    #[serde(default)]
    pub constructors: Vec<ConstructorSignature>,
    #[serde(default)]
    pub marker: Option<FactoryMarker>,
}

fn default_visibility() -> Visibility {
    Visibility::Public
}

impl Declaration {
    pub fn has_default_constructor(&self) -> bool {
        self.constructors.iter().any(ConstructorSignature::is_default)
    }
}

/// Everything declared in one compilation unit, as seen by one round.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildUnit {
    pub name: String,
    /// Minimum tool version this unit's declarations were written against.
    #[serde(default)]
    pub min_tool_version: Option<String>,
    #[serde(default)]
    pub declarations: Vec<Declaration>,
}

impl BuildUnit {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            min_tool_version: None,
            declarations: Vec::new(),
        }
    }

    /// Declarations carrying the factory marker, in discovery order.
    pub fn marked_declarations(&self) -> impl Iterator<Item = (&Declaration, &FactoryMarker)> {
        self.declarations
            .iter()
            .filter_map(|d| d.marker.as_ref().map(|m| (d, m)))
    }
}

/// A marked declaration that survived scanning. Immutable; consumed exactly
/// once by the validator and then, if accepted, by the group registry.
#[derive(Debug, Clone)]
pub struct AnnotatedDeclaration {
    pub id: String,
    /// The target supertype the declaration is grouped under.
    pub group_key: TypeRef,
    pub declaring_type: TypeRef,
    pub visibility: Visibility,
    pub is_abstract: bool,
    pub constructors: Vec<ConstructorSignature>,
}

impl AnnotatedDeclaration {
    pub fn group_qualified_name(&self) -> &str {
        self.group_key.qualified_name()
    }

    pub fn class_name(&self) -> &str {
        self.declaring_type.qualified_name()
    }

    pub fn has_default_constructor(&self) -> bool {
        self.constructors.iter().any(ConstructorSignature::is_default)
    }
}
