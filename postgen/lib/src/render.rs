//! Go source emitter for a [`GenerationInfo`].
//!
//! The generated file declares one interface per group, an `ErrorHandler`
//! interface when the error constructor is kept separate, and a composite
//! struct that implements the original interface by forwarding every
//! method to the group that owns it.

use std::path::Path;

use indexmap::IndexSet;

use crate::error::PostgenError;
use crate::shared::{GenerationInfo, ImportDescriptor, MethodDescriptor};

pub const GENERATED_HEADER: &str = "// Code generated by ogen-postgen, DO NOT EDIT.";

/// Name of the struct that recomposes the split interfaces.
pub const COMPOSITE_TYPE: &str = "PostgenHandler";

/// Interface holding the error constructor under the separate policy.
pub const ERROR_HANDLER_INTERFACE: &str = "ErrorHandler";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Package clause of the generated file.
    pub package: String,
    /// Interface the composite struct is asserted against.
    pub interface_name: String,
    /// Emit `var _ Interface = (*PostgenHandler)(nil)`.
    pub assert_interface: bool,
}

/// Renders the whole Go file.
pub fn render(info: &GenerationInfo, options: &RenderOptions) -> String {
    let mut out = String::new();
    out.push_str(GENERATED_HEADER);
    out.push_str("\n\n");
    out.push_str(&format!("package {}\n\n", options.package));

    let imports = used_imports(info);
    if !imports.is_empty() {
        out.push_str("import (\n");
        for import in imports {
            match import.emitted_alias() {
                "" => out.push_str(&format!("\t\"{}\"\n", import.path)),
                alias => out.push_str(&format!("\t{alias} \"{}\"\n", import.path)),
            }
        }
        out.push_str(")\n\n");
    }

    for group in &info.groups {
        let comment = format!(
            "{} groups methods split from {}.",
            group.name, options.interface_name
        );
        render_interface(&mut out, &group.name, &comment, &group.methods);
    }

    if let Some(handler) = &info.error_handler {
        let comment = format!(
            "{ERROR_HANDLER_INTERFACE} holds the error constructor shared by every service of {}.",
            options.interface_name
        );
        render_interface(
            &mut out,
            ERROR_HANDLER_INTERFACE,
            &comment,
            std::slice::from_ref(handler),
        );
    }

    render_composite(&mut out, info, options);
    out
}

fn render_interface(out: &mut String, name: &str, comment: &str, methods: &[MethodDescriptor]) {
    out.push_str(&format!("// {comment}\n"));
    out.push_str(&format!("type {name} interface {{\n"));
    for method in methods {
        for line in method.doc_comment.lines() {
            if line.is_empty() {
                out.push_str("\t//\n");
            } else {
                out.push_str(&format!("\t// {line}\n"));
            }
        }
        out.push_str(&format!("\t{}\n", method.signature()));
    }
    out.push_str("}\n\n");
}

fn render_composite(out: &mut String, info: &GenerationInfo, options: &RenderOptions) {
    let mut fields: Vec<&str> = info.groups.iter().map(|group| group.name.as_str()).collect();
    if info.error_handler.is_some() {
        fields.push(ERROR_HANDLER_INTERFACE);
    }
    let width = fields.iter().map(|field| field.len()).max().unwrap_or_default();

    out.push_str(&format!(
        "// {COMPOSITE_TYPE} implements {} by delegating to the split services.\n",
        options.interface_name
    ));
    out.push_str(&format!("type {COMPOSITE_TYPE} struct {{\n"));
    for field in &fields {
        out.push_str(&format!("\t{field:<width$} {field}\n"));
    }
    out.push_str("}\n");

    if options.assert_interface {
        out.push_str(&format!(
            "\nvar _ {} = (*{COMPOSITE_TYPE})(nil)\n",
            options.interface_name
        ));
    }

    // fan-out under tags: the first group owning a method serves it
    let mut forwarded: IndexSet<&str> = IndexSet::new();
    for group in &info.groups {
        for method in &group.methods {
            if forwarded.insert(method.name.as_str()) {
                render_forwarder(out, &group.name, method);
            }
        }
    }
    if let Some(handler) = &info.error_handler {
        if forwarded.insert(handler.name.as_str()) {
            render_forwarder(out, ERROR_HANDLER_INTERFACE, handler);
        }
    }
}

fn render_forwarder(out: &mut String, field: &str, method: &MethodDescriptor) {
    let (typed, arguments) = method.forwarding_parameters();
    let call = format!("h.{field}.{}({arguments})", method.name);
    let body = if method.results.is_empty() {
        call
    } else {
        format!("return {call}")
    };

    out.push_str(&format!(
        "\n// {} delegates to {field}.\nfunc (h *{COMPOSITE_TYPE}) {}({typed}){} {{\n\t{body}\n}}\n",
        method.name,
        method.name,
        method.result_clause()
    ));
}

/// Imports referenced by the types of an emitted method, in table order.
///
/// Go rejects unused imports; blank and dot imports are never emitted.
pub fn used_imports(info: &GenerationInfo) -> Vec<&ImportDescriptor> {
    let referenced: IndexSet<&str> = info
        .all_methods()
        .flat_map(|method| method.import_paths.iter().map(String::as_str))
        .collect();

    info.imports
        .iter()
        .filter(|import| import.is_qualifying() && referenced.contains(import.path.as_str()))
        .collect()
}

/// Writes the rendered file, creating parent directories as needed.
///
/// ## Errors
/// Returns [`PostgenError::Write`] when the directory or file cannot be written.
pub fn write_output(path: &Path, contents: &str) -> Result<(), PostgenError> {
    let write_error = |source| PostgenError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }
    }
    std::fs::write(path, contents).map_err(write_error)
}
