//! Code Emitter - Deterministic Factory Rendering
//!
//! Consumes one finalized group and renders one dispatch construct:
//! `<GroupSimpleName>Factory` with a single `create` operation. Rendering is
//! pure; the same group always yields byte-identical source and hash. The
//! actual write goes through an `ArtifactSink`, which is the only place
//! emission can fail.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

use crate::registry::Group;
use crate::TOOL_VERSION;

#[derive(Debug, Error)]
pub enum EmitError {
    #[error("failed to write generated factory {factory}: {source}")]
    Io {
        factory: String,
        #[source]
        source: std::io::Error,
    },
}

impl EmitError {
    pub fn kind(&self) -> &'static str {
        match self {
            EmitError::Io { .. } => "IOFailure",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FactoryEntry {
    pub id: String,
    pub class: String,
}

/// One rendered dispatch construct, ready to be written.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedFactory {
    pub factory_name: String,
    pub group_key: String,
    pub group_simple_name: String,
    pub entries: Vec<FactoryEntry>,
    pub source: String,
    pub source_hash: String,
}

#[derive(Debug, Default)]
pub struct CodeEmitter;

impl CodeEmitter {
    pub fn new() -> Self {
        Self
    }

    pub fn emit(&self, group: &Group) -> GeneratedFactory {
        let factory_name = group.factory_name();
        let entries: Vec<FactoryEntry> = group
            .members
            .iter()
            .map(|m| FactoryEntry {
                id: m.id.clone(),
                class: m.declaring_type.qualified_name().to_string(),
            })
            .collect();

        let source = render_factory(&factory_name, group.simple_name(), &entries);
        let source_hash = sha256_hex(source.as_bytes());

        GeneratedFactory {
            factory_name,
            group_key: group.qualified_name().to_string(),
            group_simple_name: group.simple_name().to_string(),
            entries,
            source,
            source_hash,
        }
    }
}

fn render_factory(factory_name: &str, group_simple_name: &str, entries: &[FactoryEntry]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "// Generated by factorygen v{}. Do not edit.\n\n",
        TOOL_VERSION
    ));
    out.push_str("use factorygen_core::dispatch::DispatchError;\n\n");
    out.push_str(&format!("pub struct {};\n\n", factory_name));
    out.push_str(&format!("impl {} {{\n", factory_name));
    out.push_str(&format!(
        "    /// Instantiates the `{}` implementation registered under `id`.\n",
        group_simple_name
    ));
    out.push_str(&format!(
        "    pub fn create(id: Option<&str>) -> Result<Box<dyn {}>, DispatchError> {{\n",
        group_simple_name
    ));
    out.push_str("        match id {\n");
    out.push_str("            None => Err(DispatchError::NullId),\n");
    for entry in entries {
        out.push_str(&format!(
            "            Some({:?}) => Ok(Box::new({}::default())),\n",
            entry.id,
            rust_path(&entry.class)
        ));
    }
    out.push_str("            Some(other) => Err(DispatchError::UnknownId {\n");
    out.push_str("                id: other.to_string(),\n");
    out.push_str(&format!(
        "                factory: {:?}.to_string(),\n",
        factory_name
    ));
    out.push_str("            }),\n");
    out.push_str("        }\n");
    out.push_str("    }\n");
    out.push_str("}\n");
    out
}

/// Dotted qualified names become Rust paths.
fn rust_path(qualified_name: &str) -> String {
    qualified_name.replace('.', "::")
}

/// Filename for a generated construct: CamelCase to snake_case, `.rs` suffix.
pub fn module_file_name(factory_name: &str) -> String {
    let mut out = String::with_capacity(factory_name.len() + 8);
    for (i, ch) in factory_name.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out.push_str(".rs");
    out
}

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Where rendered factories go. The core never touches the filesystem
/// directly; the sink is the external write mechanism.
pub trait ArtifactSink {
    fn write(&mut self, artifact: &GeneratedFactory) -> Result<(), EmitError>;
}

/// Collects artifacts in memory. Used by tests and by CLI commands that
/// only inspect the factory model.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub artifacts: Vec<GeneratedFactory>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ArtifactSink for MemorySink {
    fn write(&mut self, artifact: &GeneratedFactory) -> Result<(), EmitError> {
        self.artifacts.push(artifact.clone());
        Ok(())
    }
}

/// Writes one `.rs` file per factory into an output directory.
#[derive(Debug)]
pub struct FsSink {
    out_dir: PathBuf,
}

impl FsSink {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }
}

impl ArtifactSink for FsSink {
    fn write(&mut self, artifact: &GeneratedFactory) -> Result<(), EmitError> {
        let io = |source| EmitError::Io {
            factory: artifact.factory_name.clone(),
            source,
        };
        fs::create_dir_all(&self.out_dir).map_err(io)?;
        let path = self.out_dir.join(module_file_name(&artifact.factory_name));
        fs::write(path, &artifact.source).map_err(io)
    }
}
