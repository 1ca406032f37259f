//! SDL artifact.

use std::fmt::Write;

use super::order::TypeOrder;
use crate::error::SchemaError;
use crate::model::{RootKind, SourceDeclaration, SourceModel};
use crate::schema::{ObjectType, ResolvedSchema, TypeId, TypeNode};

/// Renders the schema document and checks that it parses.
pub fn render(
    model: &SourceModel,
    schema: &ResolvedSchema,
    order: &TypeOrder,
) -> Result<String, SchemaError> {
    let mut out = String::new();

    let query = schema.entry_point(RootKind::Query);
    let mutation = schema.entry_point(RootKind::Mutation);
    if query.is_some() || mutation.is_some() {
        out.push_str("schema {\n");
        for (label, entry) in [("query", query), ("mutation", mutation)] {
            if let Some(name) = entry.and_then(|id| schema.graph.type_name(id)) {
                let _ = writeln!(out, "  {label}: {name}");
            }
        }
        out.push_str("}\n");
    }

    for id in order.all() {
        if !out.is_empty() {
            out.push('\n');
        }
        match schema.graph.node(id) {
            TypeNode::Object(object) => render_object(&mut out, model, schema, object),
            TypeNode::Enum(enumeration) => {
                let SourceDeclaration::Enum(decl) = model.get(enumeration.decl) else {
                    return Err(SchemaError::Internal(format!(
                        "enum `{}` lost its declaration",
                        enumeration.name
                    )));
                };
                description(&mut out, "", decl.description.as_deref());
                let _ = writeln!(out, "enum {} {{", decl.name);
                for value in &decl.values {
                    description(&mut out, "  ", value.description.as_deref());
                    let deprecation = deprecated(value.deprecation.as_deref());
                    let _ = writeln!(out, "  {}{deprecation}", value.name);
                }
                out.push_str("}\n");
            }
            TypeNode::Scalar(scalar) => {
                let text = scalar.decl.and_then(|decl| model.get(decl).description());
                description(&mut out, "", text);
                let _ = writeln!(out, "scalar {}", scalar.name);
            }
            other => {
                return Err(SchemaError::Internal(format!(
                    "unexpected node in emission order: {other:?}"
                )));
            }
        }
    }

    async_graphql_parser::parse_schema(&out).map_err(|err| SchemaError::Emit(err.to_string()))?;
    Ok(out)
}

fn render_object(
    out: &mut String,
    model: &SourceModel,
    schema: &ResolvedSchema,
    object: &ObjectType,
) {
    description(out, "", object.description.as_deref());
    let _ = writeln!(out, "type {} {{", object.name);
    for field in &object.fields {
        let descriptor = model.field(field.source);
        description(out, "  ", descriptor.and_then(|d| d.description.as_deref()));
        let _ = write!(out, "  {}", field.name);
        if !field.args.is_empty() {
            let args: Vec<String> = field
                .args
                .iter()
                .map(|arg| format!("{}: {}", arg.name, render_type(schema, arg.ty)))
                .collect();
            let _ = write!(out, "({})", args.join(", "));
        }
        let _ = writeln!(
            out,
            ": {}{}",
            render_type(schema, field.ty),
            deprecated(descriptor.and_then(|d| d.deprecation.as_deref()))
        );
    }
    out.push_str("}\n");
}

fn render_type(schema: &ResolvedSchema, ty: TypeId) -> String {
    schema.graph.render(ty)
}

fn description(out: &mut String, indent: &str, text: Option<&str>) {
    if let Some(text) = text {
        let _ = writeln!(out, "{indent}{}", string_literal(text));
    }
}

fn deprecated(reason: Option<&str>) -> String {
    match reason {
        Some(reason) => format!(" @deprecated(reason: {})", string_literal(reason)),
        None => String::new(),
    }
}

/// GraphQL string literal; JSON string escapes are a subset GraphQL accepts.
fn string_literal(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{}\"", text.escape_default()))
}
