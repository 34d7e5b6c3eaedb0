//! Runtime Dispatch - The Generated Construct's Behavior
//!
//! A `DispatchTable` is what a generated factory *does*: resolve a string id
//! to the concrete type registered under it and construct a fresh instance.
//! Nothing is cached or pooled; every `create` call allocates anew, and the
//! same id against the same table always yields the same concrete type.

use thiserror::Error;

use crate::registry::Group;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("{factory} knows no declaration registered under the id \"{id}\"")]
    UnknownId { id: String, factory: String },

    #[error("the factory id must not be null")]
    NullId,
}

/// Zero-argument constructor for one registered concrete type.
pub type Constructor<T> = fn() -> Box<T>;

/// Raised while *building* a table, when a registered class has no bound
/// constructor. This is a wiring error, not a dispatch failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("no constructor bound for the class {0}")]
pub struct UnboundClass(pub String);

pub struct DispatchTable<T: ?Sized> {
    factory_name: String,
    constructors: Vec<(String, Constructor<T>)>,
}

impl<T: ?Sized> DispatchTable<T> {
    pub fn new(factory_name: impl Into<String>) -> Self {
        Self {
            factory_name: factory_name.into(),
            constructors: Vec::new(),
        }
    }

    /// Build a table from a finalized group, resolving each member's class
    /// to its constructor.
    pub fn from_group(
        group: &Group,
        resolve: impl Fn(&str) -> Option<Constructor<T>>,
    ) -> Result<Self, UnboundClass> {
        Self::from_entries(
            group.factory_name(),
            group
                .members
                .iter()
                .map(|m| (m.id.clone(), m.declaring_type.qualified_name().to_string())),
            resolve,
        )
    }

    /// Build a table from `(id, class)` pairs, resolving each class to its
    /// constructor. Ids are assumed unique; the registry enforces that.
    pub fn from_entries(
        factory_name: impl Into<String>,
        entries: impl IntoIterator<Item = (String, String)>,
        resolve: impl Fn(&str) -> Option<Constructor<T>>,
    ) -> Result<Self, UnboundClass> {
        let mut table = Self::new(factory_name);
        for (id, class) in entries {
            let constructor = resolve(&class).ok_or_else(|| UnboundClass(class))?;
            table.constructors.push((id, constructor));
        }
        Ok(table)
    }

    pub fn bind(&mut self, id: impl Into<String>, constructor: Constructor<T>) {
        self.constructors.push((id.into(), constructor));
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.constructors.iter().map(|(id, _)| id.as_str())
    }

    /// The factory operation: construct a fresh instance of the type
    /// registered under `id`.
    pub fn create(&self, id: Option<&str>) -> Result<Box<T>, DispatchError> {
        let id = id.ok_or(DispatchError::NullId)?;
        self.constructors
            .iter()
            .find(|(registered, _)| registered == id)
            .map(|(_, constructor)| constructor())
            .ok_or_else(|| DispatchError::UnknownId {
                id: id.to_string(),
                factory: self.factory_name.clone(),
            })
    }
}
