//! Renders ABIs and preset sources into Solidity interface files

pub mod declaration;

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::abi::{Abi, AbiItem, AbiParam, ItemKind, StateMutability};
use crate::error::{Error, Result};
use crate::types::ResolvedInterface;
use crate::utils::atomic_write;

const HEADER: &str = "// SPDX-License-Identifier: MIT\npragma solidity ^0.8.0;\n";

const RESERVED: &[&str] = &[
    "address", "bool", "string", "bytes", "mapping", "function", "event", "error", "struct",
    "enum", "contract", "interface", "library", "memory", "storage", "calldata", "external",
    "internal", "public", "private", "returns", "return", "view", "pure", "payable", "indexed",
    "anonymous", "constant", "immutable", "override", "virtual", "type", "new", "delete", "this",
    "super", "from", "import", "is", "let", "var",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Location {
    Calldata,
    Memory,
    None,
}

struct StructDef {
    name: String,
    fields: Vec<AbiParam>,
}

/// Stateless renderer; equal inputs always produce byte-identical output.
#[derive(Debug, Clone, Default)]
pub struct InterfaceSynthesizer;

impl InterfaceSynthesizer {
    pub fn new() -> Self {
        Self
    }

    pub fn render_abi(&self, name: &str, abi: &Abi) -> String {
        let structs = collect_structs(abi);
        let sections: Vec<Vec<String>> = vec![
            structs.iter().map(render_struct).collect(),
            render_kind(abi, ItemKind::Event),
            render_kind(abi, ItemKind::Error),
            render_kind(abi, ItemKind::Function),
        ];

        let mut out = String::from(HEADER);
        let _ = writeln!(out, "\ninterface {name} {{");
        let body: Vec<String> = sections
            .into_iter()
            .filter(|s| !s.is_empty())
            .map(|s| s.join("\n"))
            .collect();
        if !body.is_empty() {
            out.push_str(&body.join("\n\n"));
            out.push('\n');
        }
        out.push_str("}\n");
        out
    }

    /// Rename the first interface declaration of `source` to `name`, leaving
    /// every other byte untouched.
    pub fn render_preset(&self, name: &str, source: &str) -> Result<String> {
        let trimmed = source.trim_start();
        if trimmed.starts_with('[') || trimmed.starts_with('{') {
            return Err(Error::SynthesisError(format!(
                "preset for '{name}' is JSON, expected Solidity source"
            )));
        }
        let decl = declaration::find_interface(source).ok_or_else(|| {
            Error::SynthesisError(format!("preset for '{name}' has no interface declaration"))
        })?;

        let mut out = String::with_capacity(source.len() + name.len());
        out.push_str(&source[..decl.name_span.start]);
        out.push_str(name);
        out.push_str(&source[decl.name_span.end..]);
        Ok(out)
    }

    /// Write `dir/<Name>.sol`, replacing any previous version atomically.
    pub fn write_interface(&self, dir: &Path, interface: &ResolvedInterface) -> Result<PathBuf> {
        let path = dir.join(interface.file_name());
        atomic_write(&path, interface.source_text.as_bytes())?;
        tracing::debug!("Wrote interface {} to {:?}", interface.name, path);
        Ok(path)
    }
}

fn render_kind(abi: &Abi, kind: ItemKind) -> Vec<String> {
    abi.items
        .iter()
        .filter(|item| item.kind == kind && !item.name.is_empty())
        .map(|item| match kind {
            ItemKind::Event => render_event(item),
            ItemKind::Error => render_error(item),
            _ => render_function(item),
        })
        .collect()
}

fn render_function(item: &AbiItem) -> String {
    let mut line = format!(
        "    function {}({}) external",
        item.name,
        render_params(&item.inputs, Location::Calldata)
    );
    match item.mutability() {
        StateMutability::View => line.push_str(" view"),
        StateMutability::Pure => line.push_str(" pure"),
        StateMutability::Payable => line.push_str(" payable"),
        StateMutability::Nonpayable => {}
    }
    if !item.outputs.is_empty() {
        let _ = write!(
            line,
            " returns ({})",
            render_params(&item.outputs, Location::Memory)
        );
    }
    line.push(';');
    line
}

fn render_event(item: &AbiItem) -> String {
    let params: Vec<String> = item
        .inputs
        .iter()
        .map(|p| {
            let mut s = param_type(p);
            if p.indexed {
                s.push_str(" indexed");
            }
            push_name(&mut s, &p.name);
            s
        })
        .collect();
    let anonymous = if item.anonymous { " anonymous" } else { "" };
    format!("    event {}({}){};", item.name, params.join(", "), anonymous)
}

fn render_error(item: &AbiItem) -> String {
    format!(
        "    error {}({});",
        item.name,
        render_params(&item.inputs, Location::None)
    )
}

fn render_params(params: &[AbiParam], location: Location) -> String {
    params
        .iter()
        .map(|p| {
            let mut s = param_type(p);
            if is_reference(p) {
                match location {
                    Location::Calldata => s.push_str(" calldata"),
                    Location::Memory => s.push_str(" memory"),
                    Location::None => {}
                }
            }
            push_name(&mut s, &p.name);
            s
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_struct(def: &StructDef) -> String {
    let mut out = format!("    struct {} {{\n", def.name);
    for (i, field) in def.fields.iter().enumerate() {
        let name = if field.name.is_empty() {
            format!("field{i}")
        } else {
            safe_name(&field.name)
        };
        let _ = writeln!(out, "        {} {};", param_type(field), name);
    }
    out.push_str("    }");
    out
}

fn push_name(out: &mut String, name: &str) {
    if !name.is_empty() {
        out.push(' ');
        out.push_str(&safe_name(name));
    }
}

fn safe_name(name: &str) -> String {
    if RESERVED.contains(&name) {
        format!("{name}_")
    } else {
        name.to_string()
    }
}

fn param_type(param: &AbiParam) -> String {
    if param.is_tuple() {
        format!("{}{}", struct_name(param), param.tuple_suffix())
    } else {
        param.canonical_type()
    }
}

fn is_reference(param: &AbiParam) -> bool {
    param.is_tuple() || param.ty.contains('[') || param.ty == "string" || param.ty == "bytes"
}

/// `struct Book.Order[]` → `Order`
fn struct_name(param: &AbiParam) -> String {
    let from_internal = param.internal_type.as_deref().and_then(|internal| {
        let base = internal.strip_prefix("struct ")?;
        let base = base.split('[').next()?;
        base.rsplit('.').next().map(str::to_string)
    });
    from_internal.unwrap_or_else(|| {
        let mut name = String::from("Tuple");
        for component in &param.components {
            name.push('_');
            name.push_str(&component.canonical_type().replace(['(', ')', ',', '[', ']'], ""));
        }
        name
    })
}

fn collect_structs(abi: &Abi) -> Vec<StructDef> {
    let mut structs: Vec<StructDef> = Vec::new();
    for item in &abi.items {
        if matches!(item.kind, ItemKind::Constructor | ItemKind::Fallback | ItemKind::Receive) {
            continue;
        }
        for param in item.inputs.iter().chain(item.outputs.iter()) {
            visit_struct(param, &mut structs);
        }
    }
    structs
}

fn visit_struct(param: &AbiParam, structs: &mut Vec<StructDef>) {
    if !param.is_tuple() {
        return;
    }
    let name = struct_name(param);
    if !structs.iter().any(|s| s.name == name) {
        structs.push(StructDef {
            name,
            fields: param.components.clone(),
        });
    }
    for component in &param.components {
        visit_struct(component, structs);
    }
}
