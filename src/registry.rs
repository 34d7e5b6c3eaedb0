//! Group Registry - Per-Round Aggregation
//!
//! Validated declarations are grouped by their target supertype. The
//! registry lives for exactly one round: `drain()` hands the groups to the
//! emitter and leaves the registry empty, so the next round starts clean.
//! Forgetting that step would re-emit constructs already produced earlier.

use thiserror::Error;

use crate::model::AnnotatedDeclaration;
use crate::typegraph::TypeRef;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Per-group id uniqueness is part of the marker contract. The original
    /// implementation let a second registration silently replace the first;
    /// here it is rejected outright.
    #[error("the id \"{id}\" on {declaration} is already registered in the {group} group")]
    DuplicateId {
        id: String,
        group: String,
        declaration: String,
    },
}

impl RegistryError {
    pub fn kind(&self) -> &'static str {
        match self {
            RegistryError::DuplicateId { .. } => "DuplicateId",
        }
    }

    pub fn origin(&self) -> &str {
        match self {
            RegistryError::DuplicateId { declaration, .. } => declaration,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GroupMember {
    pub id: String,
    pub declaring_type: TypeRef,
}

/// All validated declarations sharing one target supertype.
/// Member order is insertion order; it only affects emission readability.
#[derive(Debug, Clone)]
pub struct Group {
    pub key: TypeRef,
    pub members: Vec<GroupMember>,
}

impl Group {
    pub fn new(key: TypeRef) -> Self {
        Self {
            key,
            members: Vec::new(),
        }
    }

    pub fn qualified_name(&self) -> &str {
        self.key.qualified_name()
    }

    pub fn simple_name(&self) -> &str {
        self.key.simple_name()
    }

    /// Name of the dispatch construct generated for this group.
    pub fn factory_name(&self) -> String {
        format!("{}Factory", self.simple_name())
    }

    pub fn lookup(&self, id: &str) -> Option<&TypeRef> {
        self.members
            .iter()
            .find(|m| m.id == id)
            .map(|m| &m.declaring_type)
    }
}

/// Process-scoped mutable state shared across rounds; everything else in the
/// pipeline is pass-through. One round at a time, drained or cleared before
/// the next begins.
#[derive(Debug, Default)]
pub struct GroupRegistry {
    groups: Vec<Group>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a validated declaration into the group for its target,
    /// creating the group on first member.
    pub fn add(&mut self, decl: &AnnotatedDeclaration) -> Result<(), RegistryError> {
        let key_name = decl.group_qualified_name().to_string();

        let index = match self
            .groups
            .iter()
            .position(|g| g.qualified_name() == key_name)
        {
            Some(existing) => existing,
            None => {
                self.groups.push(Group::new(decl.group_key.clone()));
                self.groups.len() - 1
            }
        };
        let group = &mut self.groups[index];

        if group.lookup(&decl.id).is_some() {
            return Err(RegistryError::DuplicateId {
                id: decl.id.clone(),
                group: key_name,
                declaration: decl.class_name().to_string(),
            });
        }

        group.members.push(GroupMember {
            id: decl.id.clone(),
            declaring_type: decl.declaring_type.clone(),
        });
        Ok(())
    }

    /// Hand back every accumulated group and leave the registry empty.
    /// Clearing is a post-condition of emission, not optional cleanup.
    pub fn drain(&mut self) -> Vec<Group> {
        std::mem::take(&mut self.groups)
    }

    pub fn clear(&mut self) {
        self.groups.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }
}
