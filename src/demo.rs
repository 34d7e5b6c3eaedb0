//! Demo Domain - The Pizza Store
//!
//! A small meal domain used by the example application and the end-to-end
//! tests. The declarations below are described twice: once as ordinary Rust
//! types, and once as a build unit the processor can run a round over. The
//! rest of the crate contains the engineering; this module is illustration.

use thiserror::Error;

use crate::diagnostics::CollectingSink;
use crate::dispatch::{Constructor, DispatchError, DispatchTable, UnboundClass};
use crate::emitter::MemorySink;
use crate::marker::FactoryMarker;
use crate::model::{
    BuildUnit, ConstructorSignature, Declaration, DeclarationKind, Visibility,
};
use crate::processor::{RoundError, RoundProcessor};

pub trait Meal {
    fn price(&self) -> f32;
}

#[derive(Default)]
pub struct MargheritaPizza;

impl Meal for MargheritaPizza {
    fn price(&self) -> f32 {
        6.0
    }
}

#[derive(Default)]
pub struct CalzonePizza;

impl Meal for CalzonePizza {
    fn price(&self) -> f32 {
        8.5
    }
}

#[derive(Default)]
pub struct Tiramisu;

impl Meal for Tiramisu {
    fn price(&self) -> f32 {
        4.5
    }
}

fn meal_class(qualified_name: &str, id: &str) -> Declaration {
    Declaration {
        qualified_name: qualified_name.to_string(),
        kind: DeclarationKind::Class,
        visibility: Visibility::Public,
        is_abstract: false,
        superclass: None,
        direct_interfaces: vec!["store.Meal".to_string()],
        constructors: vec![ConstructorSignature {
            parameter_count: 0,
            visibility: Visibility::Public,
        }],
        marker: Some(FactoryMarker::new("store.Meal", id)),
    }
}

/// The pizza-store compilation unit: the `Meal` interface plus three marked
/// implementations, all still being compiled together.
pub fn demo_build_unit() -> BuildUnit {
    let mut unit = BuildUnit::new("store");
    unit.declarations.push(Declaration {
        qualified_name: "store.Meal".to_string(),
        kind: DeclarationKind::Interface,
        visibility: Visibility::Public,
        is_abstract: false,
        superclass: None,
        direct_interfaces: vec![],
        constructors: vec![],
        marker: None,
    });
    unit.declarations
        .push(meal_class("store.MargheritaPizza", "Margherita"));
    unit.declarations
        .push(meal_class("store.CalzonePizza", "Calzone"));
    unit.declarations.push(meal_class("store.Tiramisu", "Tiramisu"));
    unit
}

/// Resolves the demo unit's qualified class names to constructors.
pub fn meal_constructor(qualified_name: &str) -> Option<Constructor<dyn Meal>> {
    match qualified_name {
        "store.MargheritaPizza" => Some(|| Box::new(MargheritaPizza)),
        "store.CalzonePizza" => Some(|| Box::new(CalzonePizza)),
        "store.Tiramisu" => Some(|| Box::new(Tiramisu)),
        _ => None,
    }
}

#[derive(Debug, Error)]
pub enum DemoError {
    #[error(transparent)]
    Round(#[from] RoundError),

    #[error(transparent)]
    Unbound(#[from] UnboundClass),

    #[error("the demo round produced no MealFactory")]
    MissingFactory,
}

/// The example application: runs one processing round over the demo unit and
/// serves orders through the resulting `MealFactory` dispatch table.
pub struct PizzaStore {
    factory: DispatchTable<dyn Meal>,
}

impl PizzaStore {
    pub fn open() -> Result<Self, DemoError> {
        let mut processor = RoundProcessor::new();
        let mut sink = MemorySink::new();
        let mut diagnostics = CollectingSink::new();
        processor.process(&demo_build_unit(), &mut sink, &mut diagnostics)?;

        let artifact = sink
            .artifacts
            .iter()
            .find(|a| a.factory_name == "MealFactory")
            .ok_or(DemoError::MissingFactory)?;

        let factory = DispatchTable::from_entries(
            artifact.factory_name.clone(),
            artifact
                .entries
                .iter()
                .map(|e| (e.id.clone(), e.class.clone())),
            meal_constructor,
        )?;

        Ok(Self { factory })
    }

    pub fn order(&self, meal_name: Option<&str>) -> Result<Box<dyn Meal>, DispatchError> {
        self.factory.create(meal_name)
    }

    pub fn menu(&self) -> Vec<&str> {
        self.factory.ids().collect()
    }
}
