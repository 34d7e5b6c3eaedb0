//! Round Contract Tests
//!
//! These tests verify the non-negotiable guarantees of the
//! scan → validate → group → emit pipeline, end to end.

use factorygen_core::{
    demo::{demo_build_unit, PizzaStore},
    diagnostics::CollectingSink,
    dispatch::{DispatchError, DispatchTable},
    emitter::{ArtifactSink, EmitError, FsSink, GeneratedFactory, MemorySink},
    BuildUnit, ConstructorSignature, Declaration, DeclarationKind, FactoryMarker, RoundError,
    RoundProcessor, Visibility,
};

trait Shape {
    fn name(&self) -> &'static str;
}

struct ShapeA;
impl Shape for ShapeA {
    fn name(&self) -> &'static str {
        "ShapeA"
    }
}

struct ShapeB;
impl Shape for ShapeB {
    fn name(&self) -> &'static str {
        "ShapeB"
    }
}

fn shape_interface() -> Declaration {
    Declaration {
        qualified_name: "geo.Shape".to_string(),
        kind: DeclarationKind::Interface,
        visibility: Visibility::Public,
        is_abstract: false,
        superclass: None,
        direct_interfaces: vec![],
        constructors: vec![],
        marker: None,
    }
}

fn shape_class(qualified_name: &str, id: &str) -> Declaration {
    Declaration {
        qualified_name: qualified_name.to_string(),
        kind: DeclarationKind::Class,
        visibility: Visibility::Public,
        is_abstract: false,
        superclass: None,
        direct_interfaces: vec!["geo.Shape".to_string()],
        constructors: vec![ConstructorSignature {
            parameter_count: 0,
            visibility: Visibility::Public,
        }],
        marker: Some(FactoryMarker::new("geo.Shape", id)),
    }
}

fn shape_unit() -> BuildUnit {
    let mut unit = BuildUnit::new("geo");
    unit.declarations.push(shape_interface());
    unit.declarations.push(shape_class("geo.ShapeA", "A"));
    unit.declarations.push(shape_class("geo.ShapeB", "B"));
    unit
}

fn shape_constructor(class: &str) -> Option<fn() -> Box<dyn Shape>> {
    match class {
        "geo.ShapeA" => Some(|| Box::new(ShapeA)),
        "geo.ShapeB" => Some(|| Box::new(ShapeB)),
        _ => None,
    }
}

fn run_round(unit: &BuildUnit) -> (Result<(), RoundError>, MemorySink, CollectingSink) {
    let mut processor = RoundProcessor::new();
    let mut sink = MemorySink::new();
    let mut diagnostics = CollectingSink::new();
    let result = processor
        .process(unit, &mut sink, &mut diagnostics)
        .map(|_| ());
    (result, sink, diagnostics)
}

#[test]
fn invariant_valid_group_emits_one_dispatch_construct() {
    let (result, sink, diagnostics) = run_round(&shape_unit());
    assert!(result.is_ok());
    assert!(diagnostics.diagnostics.is_empty());
    assert_eq!(sink.artifacts.len(), 1);

    let artifact = &sink.artifacts[0];
    assert_eq!(artifact.factory_name, "ShapeFactory");
    assert_eq!(artifact.group_key, "geo.Shape");
    assert_eq!(artifact.entries.len(), 2);
}

#[test]
fn invariant_create_returns_the_registered_concrete_type() {
    let (result, sink, _) = run_round(&shape_unit());
    assert!(result.is_ok());

    let artifact = &sink.artifacts[0];
    let factory: DispatchTable<dyn Shape> = DispatchTable::from_entries(
        artifact.factory_name.clone(),
        artifact
            .entries
            .iter()
            .map(|e| (e.id.clone(), e.class.clone())),
        shape_constructor,
    )
    .unwrap();

    assert_eq!(factory.create(Some("A")).unwrap().name(), "ShapeA");
    assert_eq!(factory.create(Some("B")).unwrap().name(), "ShapeB");

    let err = factory.create(Some("C")).err().unwrap();
    assert_eq!(
        err,
        DispatchError::UnknownId {
            id: "C".to_string(),
            factory: "ShapeFactory".to_string(),
        }
    );
    assert_eq!(factory.create(None).err().unwrap(), DispatchError::NullId);
}

#[test]
fn invariant_missing_default_constructor_aborts_the_round() {
    let mut unit = shape_unit();
    // Third shape exposes only a two-argument constructor.
    let mut broken = shape_class("geo.ShapeC", "C");
    broken.constructors = vec![ConstructorSignature {
        parameter_count: 2,
        visibility: Visibility::Public,
    }];
    unit.declarations.push(broken);

    let (result, sink, diagnostics) = run_round(&unit);
    assert!(matches!(result, Err(RoundError::Validation(_))));
    // Zero factories for the whole round, not just the offending group.
    assert!(sink.artifacts.is_empty());
    assert_eq!(diagnostics.diagnostics.len(), 1);
    assert_eq!(diagnostics.diagnostics[0].kind, "NoDefaultConstructor");
    assert_eq!(
        diagnostics.diagnostics[0].origin.as_deref(),
        Some("geo.ShapeC")
    );
}

#[test]
fn invariant_marker_on_a_function_fails_before_any_hierarchy_check() {
    let mut unit = shape_unit();
    unit.declarations.push(Declaration {
        qualified_name: "geo.area".to_string(),
        kind: DeclarationKind::Function,
        visibility: Visibility::Public,
        is_abstract: false,
        superclass: None,
        direct_interfaces: vec![],
        constructors: vec![],
        marker: Some(FactoryMarker::new("geo.Shape", "area")),
    });

    let (result, sink, diagnostics) = run_round(&unit);
    assert!(matches!(result, Err(RoundError::Scan(_))));
    assert!(sink.artifacts.is_empty());
    assert_eq!(diagnostics.diagnostics[0].kind, "TargetKindInvalid");
}

#[test]
fn invariant_empty_id_aborts_the_round() {
    let mut unit = shape_unit();
    unit.declarations.push(shape_class("geo.ShapeC", ""));

    let (result, _, diagnostics) = run_round(&unit);
    assert!(matches!(result, Err(RoundError::Scan(_))));
    assert_eq!(diagnostics.diagnostics[0].kind, "EmptyId");
}

#[test]
fn invariant_duplicate_id_is_rejected_not_overwritten() {
    let mut unit = shape_unit();
    unit.declarations.push(shape_class("geo.ShapeC", "A"));

    let (result, sink, diagnostics) = run_round(&unit);
    assert!(matches!(result, Err(RoundError::Registry(_))));
    assert!(sink.artifacts.is_empty());
    assert_eq!(diagnostics.diagnostics[0].kind, "DuplicateId");
    assert_eq!(
        diagnostics.diagnostics[0].origin.as_deref(),
        Some("geo.ShapeC")
    );
}

#[test]
fn invariant_transitive_interface_implementation_is_rejected() {
    let mut unit = shape_unit();
    // geo.Polygon extends geo.Shape; geo.ShapeC implements only geo.Polygon
    // while targeting geo.Shape. Behaviorally substitutable, still rejected.
    unit.declarations.push(Declaration {
        qualified_name: "geo.Polygon".to_string(),
        kind: DeclarationKind::Interface,
        visibility: Visibility::Public,
        is_abstract: false,
        superclass: None,
        direct_interfaces: vec!["geo.Shape".to_string()],
        constructors: vec![],
        marker: None,
    });
    let mut indirect = shape_class("geo.ShapeC", "C");
    indirect.direct_interfaces = vec!["geo.Polygon".to_string()];
    unit.declarations.push(indirect);

    let (result, sink, diagnostics) = run_round(&unit);
    assert!(matches!(result, Err(RoundError::Validation(_))));
    assert!(sink.artifacts.is_empty());
    assert_eq!(diagnostics.diagnostics[0].kind, "InterfaceNotImplemented");
}

#[test]
fn invariant_rounds_start_clean_after_emission() {
    let mut processor = RoundProcessor::new();
    let unit = shape_unit();

    let mut first_sink = MemorySink::new();
    let mut diagnostics = CollectingSink::new();
    processor
        .process(&unit, &mut first_sink, &mut diagnostics)
        .unwrap();

    // Same processor, second round: the first round's groups must not be
    // emitted again.
    let mut second_sink = MemorySink::new();
    processor
        .process(&unit, &mut second_sink, &mut diagnostics)
        .unwrap();
    assert_eq!(first_sink.artifacts.len(), 1);
    assert_eq!(second_sink.artifacts.len(), 1);
}

#[test]
fn invariant_rounds_start_clean_after_an_abort() {
    let mut processor = RoundProcessor::new();

    let mut bad_unit = shape_unit();
    bad_unit.declarations.push(shape_class("geo.ShapeC", ""));
    let mut sink = MemorySink::new();
    let mut diagnostics = CollectingSink::new();
    assert!(processor
        .process(&bad_unit, &mut sink, &mut diagnostics)
        .is_err());

    // A corrected later round sees none of the aborted round's state.
    let mut sink = MemorySink::new();
    let report = processor
        .process(&shape_unit(), &mut sink, &mut diagnostics)
        .unwrap();
    assert_eq!(sink.artifacts.len(), 1);
    assert_eq!(sink.artifacts[0].entries.len(), 2);
    assert_eq!(report.factories.len(), 1);
}

#[test]
fn invariant_emission_is_deterministic() {
    let (_, first, _) = run_round(&shape_unit());
    let (_, second, _) = run_round(&shape_unit());
    assert_eq!(first.artifacts[0].source, second.artifacts[0].source);
    assert_eq!(
        first.artifacts[0].source_hash,
        second.artifacts[0].source_hash
    );
}

#[test]
fn invariant_tool_version_gate() {
    let mut unit = shape_unit();
    unit.min_tool_version = Some("99.0.0".to_string());

    let (result, sink, _) = run_round(&unit);
    assert!(matches!(result, Err(RoundError::ToolVersionMismatch { .. })));
    assert!(sink.artifacts.is_empty());
}

/// Accepts a fixed number of writes, then reports an I/O failure.
struct FlakySink {
    written: Vec<GeneratedFactory>,
    capacity: usize,
}

impl ArtifactSink for FlakySink {
    fn write(&mut self, artifact: &GeneratedFactory) -> Result<(), EmitError> {
        if self.written.len() < self.capacity {
            self.written.push(artifact.clone());
            Ok(())
        } else {
            Err(EmitError::Io {
                factory: artifact.factory_name.clone(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            })
        }
    }
}

#[test]
fn invariant_emit_failure_is_round_scoped_and_keeps_written_factories() {
    // Two groups: geo.Shape (two members) and geo.Solid (one member).
    let mut unit = shape_unit();
    unit.declarations.push(Declaration {
        qualified_name: "geo.Solid".to_string(),
        kind: DeclarationKind::Interface,
        visibility: Visibility::Public,
        is_abstract: false,
        superclass: None,
        direct_interfaces: vec![],
        constructors: vec![],
        marker: None,
    });
    let mut cube = shape_class("geo.Cube", "Cube");
    cube.direct_interfaces = vec!["geo.Solid".to_string()];
    cube.marker = Some(FactoryMarker::new("geo.Solid", "Cube"));
    unit.declarations.push(cube);

    let mut processor = RoundProcessor::new();
    let mut sink = FlakySink {
        written: Vec::new(),
        capacity: 1,
    };
    let mut diagnostics = CollectingSink::new();

    let result = processor.process(&unit, &mut sink, &mut diagnostics);
    assert!(matches!(result, Err(RoundError::Emit(_))));

    // The write failure is round-scoped: reported with no originating
    // declaration, and the factory written before it stays written.
    assert_eq!(diagnostics.diagnostics.len(), 1);
    assert_eq!(diagnostics.diagnostics[0].kind, "IOFailure");
    assert_eq!(diagnostics.diagnostics[0].origin, None);
    assert_eq!(sink.written.len(), 1);
    assert_eq!(sink.written[0].factory_name, "ShapeFactory");
}

#[test]
fn invariant_fs_sink_writes_one_file_per_factory() {
    let out = tempfile::tempdir().unwrap();
    let mut processor = RoundProcessor::new();
    let mut sink = FsSink::new(out.path());
    let mut diagnostics = CollectingSink::new();

    processor
        .process(&shape_unit(), &mut sink, &mut diagnostics)
        .unwrap();

    let written = out.path().join("shape_factory.rs");
    let source = std::fs::read_to_string(written).unwrap();
    assert!(source.contains("pub struct ShapeFactory;"));
    assert!(source.contains(r#"Some("A")"#));
}

#[test]
fn invariant_demo_round_matches_the_handwritten_store() {
    let (result, sink, _) = run_round(&demo_build_unit());
    assert!(result.is_ok());
    assert_eq!(sink.artifacts[0].factory_name, "MealFactory");

    let store = PizzaStore::open().unwrap();
    assert_eq!(store.order(Some("Margherita")).unwrap().price(), 6.0);
    assert!(matches!(
        store.order(Some("Quattro")).err().unwrap(),
        DispatchError::UnknownId { .. }
    ));
}

#[cfg(feature = "test-hooks")]
#[test]
fn invariant_every_registered_declaration_was_validated() {
    use factorygen_core::processor::{get_validation_call_count, reset_validation_call_count};

    reset_validation_call_count();
    let (result, sink, _) = run_round(&shape_unit());
    assert!(result.is_ok());

    // Two marked declarations, two validator passes, two grouped entries.
    assert_eq!(get_validation_call_count(), 2);
    assert_eq!(sink.artifacts[0].entries.len(), 2);
}
