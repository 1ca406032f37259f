//! Rust bindings artifact.
//!
//! The generated module targets the `async-graphql` dynamic schema API. Host
//! types are imported from the configured model module and must follow a
//! small contract:
//!
//! - object types are `Clone + Send + Sync + 'static`; stored properties are
//!   read with `.clone()`
//! - enums implement `AsRef<str>` for output and `FromStr` for arguments
//! - custom scalars implement `Into<async_graphql::Value>` and `Deserialize`
//! - entry objects are registered as schema data

use std::collections::HashMap;
use std::fmt::Write;

use super::order::TypeOrder;
use crate::config::CompilerConfig;
use crate::error::SchemaError;
use crate::model::{DeclId, FieldDescriptor, SourceDeclaration, SourceModel};
use crate::naming::{rust_ident, to_snake_case};
use crate::resolvers::{
    Accessor, ArgumentBinding, ArgumentDecode, ArgumentShape, Bindings, ParentSource,
    ResolverBinding,
};
use crate::schema::{
    GenericTemplate, ObjectOrigin, ObjectType, ResolvedSchema, ScalarType, TemplateType, TypeId,
    TypeNode,
};

pub const GENERATED_HEADER: &str = "// @generated by gqlforge. Do not edit.";

/// Imports the generated module may need, with the marker that proves use.
const IMPORTS: [(&str, &str); 10] = [
    ("Enum", "Enum::new("),
    ("EnumItem", "EnumItem::new("),
    ("Field", "Field"),
    ("FieldFuture", "FieldFuture::new("),
    ("FieldValue", "FieldValue::"),
    ("InputValue", "InputValue::new("),
    ("Object", "Object"),
    ("Scalar", "Scalar::new("),
    ("SchemaBuilder", "SchemaBuilder"),
    ("TypeRef", "TypeRef::"),
];

/// Schema-facing shape of a field or argument type.
#[derive(Debug, Clone)]
enum Shape {
    Leaf(Leaf),
    List(Box<Shape>),
    NonNull(Box<Shape>),
}

#[derive(Debug, Clone)]
struct Leaf {
    /// Rust expression evaluating to the schema type name.
    name: String,
    convert: Convert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Convert {
    Value,
    Id,
    Enum,
    Object,
    /// The factory's value converter.
    Param,
}

/// Renders the bindings module of one unit.
pub fn render(
    model: &SourceModel,
    schema: &ResolvedSchema,
    bindings: &Bindings,
    order: &TypeOrder,
    config: &CompilerConfig,
) -> Result<String, SchemaError> {
    RustEmitter {
        model,
        schema,
        bindings,
        order,
        config,
    }
    .render()
}

struct RustEmitter<'a> {
    model: &'a SourceModel,
    schema: &'a ResolvedSchema,
    bindings: &'a Bindings,
    order: &'a TypeOrder,
    config: &'a CompilerConfig,
}

impl RustEmitter<'_> {
    fn render(&self) -> Result<String, SchemaError> {
        self.check_identifiers()?;

        let mut body = String::new();
        self.register_fn(&mut body)?;

        for &id in &self.order.declared {
            body.push('\n');
            match self.schema.graph.node(id) {
                TypeNode::Object(object) => self.object_fn(&mut body, id, object)?,
                TypeNode::Enum(enumeration) => self.enum_fn(&mut body, enumeration.decl)?,
                TypeNode::Scalar(scalar) => {
                    let description =
                        scalar.decl.and_then(|decl| self.model.get(decl).description());
                    let _ = writeln!(body, "fn {}_scalar() -> Scalar {{", to_snake_case(&scalar.name));
                    let _ = writeln!(body, "    Scalar::new({:?}){}", scalar.name, description_call(description));
                    body.push_str("}\n");
                }
                other => {
                    return Err(SchemaError::Internal(format!(
                        "cannot emit bindings for {other:?}"
                    )));
                }
            }
        }

        for template in &self.schema.templates {
            body.push('\n');
            self.factory_fn(&mut body, template)?;
        }

        let used: Vec<&str> = IMPORTS
            .iter()
            .filter(|(_, marker)| body.contains(marker))
            .map(|(name, _)| *name)
            .collect();
        let values: Vec<&str> = [("Name", "Name::new("), ("Value", "Value::Enum(")]
            .iter()
            .filter(|(_, marker)| body.contains(marker))
            .map(|(name, _)| *name)
            .collect();

        let mut out = String::new();
        let _ = writeln!(out, "{GENERATED_HEADER}");
        let _ = writeln!(out, "// Unit: {}", self.model.unit().escape_debug());
        out.push('\n');
        let _ = writeln!(out, "use async_graphql::dynamic::{{{}}};", used.join(", "));
        if !values.is_empty() {
            let _ = writeln!(out, "use async_graphql::{{{}}};", values.join(", "));
        }
        out.push('\n');
        let _ = writeln!(out, "#[allow(unused_imports)]");
        let _ = writeln!(out, "use {}::*;", self.config.model_module);
        out.push('\n');
        out.push_str(&body);
        Ok(out)
    }

    /// Fails when two types would share a generated function, or a type name
    /// cannot stand as a Rust type in the module.
    fn check_identifiers(&self) -> Result<(), SchemaError> {
        let graph = &self.schema.graph;
        let mut types: Vec<(&str, Vec<String>)> = Vec::new();
        for &id in &self.order.declared {
            let (name, functions) = match graph.node(id) {
                TypeNode::Object(object) => {
                    let snake = to_snake_case(&object.name);
                    let mut functions = vec![format!("{snake}_object")];
                    if self.order.is_cyclic(id) {
                        functions.push(format!("{snake}_fields"));
                    }
                    (object.name.as_str(), functions)
                }
                TypeNode::Enum(enumeration) => (
                    enumeration.name.as_str(),
                    vec![format!("{}_enum", to_snake_case(&enumeration.name))],
                ),
                TypeNode::Scalar(scalar) => (
                    scalar.name.as_str(),
                    vec![format!("{}_scalar", to_snake_case(&scalar.name))],
                ),
                _ => continue,
            };
            types.push((name, functions));
        }
        for template in &self.schema.templates {
            if is_reserved_type_name(&template.param) {
                return Err(SchemaError::Emit(format!(
                    "type parameter `{}` of `{}` shadows a name the bindings module uses",
                    template.param, template.name
                )));
            }
            let snake = to_snake_case(&template.name);
            types.push((template.name.as_str(), vec![format!("{snake}_object")]));
        }

        let mut owners: HashMap<String, &str> = HashMap::new();
        for (name, functions) in types {
            if is_reserved_type_name(name) {
                return Err(SchemaError::Emit(format!(
                    "type `{name}` shadows a name the bindings module uses"
                )));
            }
            for function in functions {
                if let Some(other) = owners.insert(function.clone(), name) {
                    return Err(SchemaError::Emit(format!(
                        "types `{other}` and `{name}` both generate `fn {function}`"
                    )));
                }
            }
        }
        Ok(())
    }

    fn register_fn(&self, out: &mut String) -> Result<(), SchemaError> {
        let graph = &self.schema.graph;
        let mut calls = Vec::new();
        for &id in &self.order.declared {
            let call = match graph.node(id) {
                TypeNode::Object(object) => format!("{}_object()", to_snake_case(&object.name)),
                TypeNode::Enum(enumeration) => format!("{}_enum()", to_snake_case(&enumeration.name)),
                TypeNode::Scalar(scalar) => format!("{}_scalar()", to_snake_case(&scalar.name)),
                _ => continue,
            };
            calls.push(call);
        }
        for &id in &self.order.instantiated {
            let Some(ObjectType {
                origin: ObjectOrigin::Instantiated { generic, argument },
                ..
            }) = graph.object(id)
            else {
                return Err(SchemaError::Internal(format!(
                    "instantiation #{} is not an instantiated object",
                    id.index()
                )));
            };
            let generic = self.model.get(*generic).name();
            let argument_name = graph.type_name(*argument).unwrap_or_default();
            calls.push(format!(
                "{}_object::<{}>({argument_name:?}, {})",
                to_snake_case(generic),
                self.rust_type(*argument)?,
                self.converter(*argument)?
            ));
        }

        let _ = writeln!(out, "/// Registers every type of this unit with the schema builder.");
        let _ = writeln!(out, "pub fn register(builder: SchemaBuilder) -> SchemaBuilder {{");
        out.push_str("    builder\n");
        for call in calls {
            let _ = writeln!(out, "        .register({call})");
        }
        out.push_str("}\n");
        Ok(())
    }

    fn object_fn(
        &self,
        out: &mut String,
        id: TypeId,
        object: &ObjectType,
    ) -> Result<(), SchemaError> {
        let Some(bindings) = self.bindings.object(id) else {
            return Err(SchemaError::Internal(format!(
                "object `{}` has no resolver bindings",
                object.name
            )));
        };
        let snake = to_snake_case(&object.name);
        let header = format!(
            "Object::new({:?}){}",
            object.name,
            description_call(object.description.as_deref())
        );

        let mut fields = Vec::with_capacity(object.fields.len());
        for (field, binding) in object.fields.iter().zip(bindings) {
            let shape = self.shape(field.ty)?;
            let args = field
                .args
                .iter()
                .map(|arg| Ok((arg.name.as_str(), self.shape(arg.ty)?)))
                .collect::<Result<Vec<_>, SchemaError>>()?;
            fields.push(self.field_expr(&object.name, binding, &shape, &args, false)?);
        }

        if self.order.is_cyclic(id) {
            let _ = writeln!(out, "fn {snake}_object() -> Object {{");
            let _ = writeln!(out, "    {snake}_fields().into_iter().fold({header}, Object::field)");
            out.push_str("}\n\n");
            let _ = writeln!(out, "fn {snake}_fields() -> Vec<Field> {{");
            out.push_str("    vec![\n");
            for field in fields {
                let _ = writeln!(out, "{},", indent(&field, 8));
            }
            out.push_str("    ]\n}\n");
        } else {
            let _ = writeln!(out, "fn {snake}_object() -> Object {{");
            let _ = writeln!(out, "    {header}");
            for field in fields {
                let _ = writeln!(out, "        .field(\n{},\n        )", indent(&field, 12));
            }
            out.push_str("}\n");
        }
        Ok(())
    }

    fn enum_fn(&self, out: &mut String, decl: DeclId) -> Result<(), SchemaError> {
        let SourceDeclaration::Enum(enumeration) = self.model.get(decl) else {
            return Err(SchemaError::Internal(format!(
                "declaration #{} is not an enum",
                decl.index()
            )));
        };
        let _ = writeln!(out, "fn {}_enum() -> Enum {{", to_snake_case(&enumeration.name));
        let _ = writeln!(
            out,
            "    Enum::new({:?}){}",
            enumeration.name,
            description_call(enumeration.description.as_deref())
        );
        for value in &enumeration.values {
            let _ = writeln!(
                out,
                "        .item(EnumItem::new({:?}){}{})",
                value.name,
                description_call(value.description.as_deref()),
                deprecation_call(value.deprecation.as_deref())
            );
        }
        out.push_str("}\n");
        Ok(())
    }

    fn factory_fn(&self, out: &mut String, template: &GenericTemplate) -> Result<(), SchemaError> {
        let Some(bindings) = self.bindings.template(template.decl) else {
            return Err(SchemaError::Internal(format!(
                "generic `{}` has no resolver bindings",
                template.name
            )));
        };
        let param = &template.param;
        let generic_type = format!("{}<{param}>", template.name);

        let mut fields = Vec::with_capacity(template.fields.len());
        let mut converts = false;
        for (field, binding) in template.fields.iter().zip(bindings) {
            let shape = self.template_shape(&field.ty, template)?;
            converts |= shape.uses(Convert::Param);
            let args = field
                .args
                .iter()
                .map(|arg| Ok((arg.name.as_str(), self.shape(arg.ty)?)))
                .collect::<Result<Vec<_>, SchemaError>>()?;
            fields.push(self.field_expr(&generic_type, binding, &shape, &args, true)?);
        }

        let _ = writeln!(
            out,
            "/// Object factory for `{}<{param}>`; `argument` is the schema name of `{param}`.",
            template.name
        );
        let _ = writeln!(
            out,
            "pub fn {}_object<{param}>(argument: &str, {}convert: fn({param}) -> FieldValue<'static>) -> Object",
            to_snake_case(&template.name),
            if converts { "" } else { "_" }
        );
        out.push_str("where\n");
        let _ = writeln!(out, "    {param}: Clone + Send + Sync + 'static,");
        out.push_str("{\n");
        let _ = writeln!(
            out,
            "    Object::new(format!(\"{{argument}}{}\")){}",
            template.name,
            description_call(self.model.get(template.decl).description())
        );
        for field in fields {
            let _ = writeln!(out, "        .field(\n{},\n        )", indent(&field, 12));
        }
        out.push_str("}\n");
        Ok(())
    }

    /// One `Field::new(..)` expression, unindented.
    fn field_expr(
        &self,
        parent_type: &str,
        binding: &ResolverBinding,
        shape: &Shape,
        args: &[(&str, Shape)],
        factory: bool,
    ) -> Result<String, SchemaError> {
        let descriptor = self.descriptor(binding)?;
        let capture = if factory { "move " } else { "" };

        let mut out = String::new();
        let _ = writeln!(
            out,
            "Field::new({:?}, {}, {capture}|ctx| {{",
            binding.field,
            type_ref(shape)
        );
        out.push_str("    FieldFuture::new(async move {\n");
        match binding.parent {
            ParentSource::RootData => {
                let _ = writeln!(out, "        let parent = ctx.data::<{parent_type}>()?;");
            }
            ParentSource::Value => {
                let _ = writeln!(
                    out,
                    "        let parent = ctx.parent_value.try_downcast_ref::<{parent_type}>()?;"
                );
            }
        }
        for argument in binding.accessor.arguments() {
            let _ = writeln!(out, "        {}", self.decode_statement(argument));
        }

        let member = rust_ident(binding.accessor.member());
        let read = match &binding.accessor {
            Accessor::Property { .. } => format!("parent.{member}.clone()"),
            Accessor::Method { arguments, .. } => {
                let params: Vec<&str> = arguments.iter().map(|arg| arg.variable.as_str()).collect();
                format!("parent.{member}({})", params.join(", "))
            }
        };
        let awaited = if binding.is_deferred() { ".await" } else { "" };
        let _ = writeln!(out, "        let value = {read}{awaited};");
        let result = match shape {
            Shape::NonNull(inner) => format!("Ok(Some({}))", convert_required(inner, "value", 0)),
            nullable => format!("Ok(value.map(|v0| {}))", convert_required(nullable, "v0", 1)),
        };
        let _ = writeln!(out, "        {result}");
        out.push_str("    })\n})");

        if let Some(text) = descriptor.description.as_deref() {
            let _ = write!(out, "\n.description({text:?})");
        }
        if let Some(reason) = descriptor.deprecation.as_deref() {
            let _ = write!(out, "\n.deprecation(Some({reason:?}))");
        }
        for (name, arg_shape) in args {
            let description = descriptor
                .args
                .iter()
                .find(|arg| arg.name == *name)
                .and_then(|arg| arg.description.as_deref());
            let _ = write!(
                out,
                "\n.argument(InputValue::new({name:?}, {}){})",
                type_ref(arg_shape),
                description_call(description)
            );
        }
        Ok(out)
    }

    fn decode_statement(&self, argument: &ArgumentBinding) -> String {
        let decode = |var: &str| match &argument.decode {
            ArgumentDecode::String => format!("{var}.string().map(str::to_string)"),
            ArgumentDecode::Boolean => format!("{var}.boolean()"),
            ArgumentDecode::Int => format!("{var}.i64().and_then(|n| Ok(i32::try_from(n)?))"),
            ArgumentDecode::Float => format!("{var}.f64()"),
            ArgumentDecode::Id => format!(
                "{var}.string().map(|s| {}::from(s.to_string()))",
                self.config.id_type
            ),
            ArgumentDecode::Enum(name) => {
                format!("{var}.enum_name().and_then(|s| Ok(s.parse::<{name}>()?))")
            }
            ArgumentDecode::Deserialize(name) => format!("{var}.deserialize::<{name}>()"),
        };
        let value = match argument.shape {
            ArgumentShape::Value => decode("v"),
            ArgumentShape::List { nullable_items } => {
                let item = if nullable_items {
                    format!("if v.is_null() {{ Ok(None) }} else {{ {}.map(Some) }}", decode("v"))
                } else {
                    decode("v")
                };
                format!(
                    "v.list().and_then(|list| list.iter().map(|v| {item}).collect::<async_graphql::Result<Vec<_>>>())"
                )
            }
        };
        if argument.nullable {
            format!(
                "let {} = ctx.args.get({:?}).filter(|v| !v.is_null()).map(|v| {value}).transpose()?;",
                argument.variable, argument.name
            )
        } else {
            format!(
                "let {} = ctx.args.try_get({:?}).and_then(|v| {value})?;",
                argument.variable, argument.name
            )
        }
    }

    fn descriptor(&self, binding: &ResolverBinding) -> Result<&FieldDescriptor, SchemaError> {
        self.model.field(binding.source).ok_or_else(|| {
            SchemaError::Internal(format!("binding `{}` lost its field descriptor", binding.field))
        })
    }

    fn shape(&self, id: TypeId) -> Result<Shape, SchemaError> {
        let graph = &self.schema.graph;
        Ok(match graph.node(id) {
            TypeNode::List(inner) => Shape::List(Box::new(self.shape(*inner)?)),
            TypeNode::NonNull(inner) => Shape::NonNull(Box::new(self.shape(*inner)?)),
            TypeNode::Scalar(scalar) if scalar.is_builtin() => Shape::Leaf(Leaf {
                name: format!("TypeRef::{}", scalar.name.to_uppercase()),
                convert: if scalar.name == "ID" { Convert::Id } else { Convert::Value },
            }),
            TypeNode::Scalar(scalar) => Shape::Leaf(Leaf {
                name: format!("{:?}", scalar.name),
                convert: Convert::Value,
            }),
            TypeNode::Enum(enumeration) => Shape::Leaf(Leaf {
                name: format!("{:?}", enumeration.name),
                convert: Convert::Enum,
            }),
            TypeNode::Object(object) => Shape::Leaf(Leaf {
                name: format!("{:?}", object.name),
                convert: Convert::Object,
            }),
            other => {
                return Err(SchemaError::Internal(format!(
                    "unexpected {other:?} in an emitted field type"
                )));
            }
        })
    }

    fn template_shape(
        &self,
        ty: &TemplateType,
        template: &GenericTemplate,
    ) -> Result<Shape, SchemaError> {
        Ok(match ty {
            TemplateType::Node(id) if *id == template.placeholder => Shape::Leaf(Leaf {
                name: "argument".to_string(),
                convert: Convert::Param,
            }),
            TemplateType::Node(id) => self.shape(*id)?,
            TemplateType::Application { name, .. } => Shape::Leaf(Leaf {
                name: format!("format!(\"{{argument}}{name}\")"),
                convert: Convert::Object,
            }),
            TemplateType::List(inner) => {
                Shape::List(Box::new(self.template_shape(inner, template)?))
            }
            TemplateType::NonNull(inner) => {
                Shape::NonNull(Box::new(self.template_shape(inner, template)?))
            }
        })
    }

    /// Host Rust type of a named node.
    fn rust_type(&self, id: TypeId) -> Result<String, SchemaError> {
        let graph = &self.schema.graph;
        Ok(match graph.node(id) {
            TypeNode::Scalar(scalar) if scalar.is_builtin() => match scalar.name.as_str() {
                "String" => "String".to_string(),
                "Boolean" => "bool".to_string(),
                "Int" => "i32".to_string(),
                "Float" => "f64".to_string(),
                _ => self.config.id_type.clone(),
            },
            TypeNode::Scalar(ScalarType { name, .. }) => name.clone(),
            TypeNode::Enum(enumeration) => enumeration.name.clone(),
            TypeNode::Object(object) => match object.origin {
                ObjectOrigin::Declared(_) => object.name.clone(),
                ObjectOrigin::Instantiated { generic, argument } => format!(
                    "{}<{}>",
                    self.model.get(generic).name(),
                    self.rust_type(argument)?
                ),
            },
            other => {
                return Err(SchemaError::Internal(format!(
                    "{other:?} has no host type"
                )));
            }
        })
    }

    /// Value converter handed to a generic factory for its argument type.
    fn converter(&self, argument: TypeId) -> Result<String, SchemaError> {
        let rust_type = self.rust_type(argument)?;
        let Shape::Leaf(leaf) = self.shape(argument)? else {
            return Err(SchemaError::Internal(format!(
                "generic argument `{rust_type}` is not a named type"
            )));
        };
        Ok(match leaf.convert {
            Convert::Object => "FieldValue::owned_any".to_string(),
            convert => format!("|v: {rust_type}| {}", convert_leaf(convert, "v")),
        })
    }
}

impl Shape {
    fn uses(&self, convert: Convert) -> bool {
        match self {
            Self::Leaf(leaf) => leaf.convert == convert,
            Self::List(inner) | Self::NonNull(inner) => inner.uses(convert),
        }
    }
}

/// Converts a value known to be present.
fn convert_required(shape: &Shape, var: &str, depth: usize) -> String {
    match shape {
        Shape::Leaf(leaf) => convert_leaf(leaf.convert, var),
        Shape::NonNull(inner) => convert_required(inner, var, depth),
        Shape::List(item) => {
            let next = format!("v{depth}");
            format!(
                "FieldValue::list({var}.into_iter().map(|{next}| {}))",
                convert_optional(item, &next, depth + 1)
            )
        }
    }
}

/// Converts a value that may be absent, unless its shape says otherwise.
fn convert_optional(shape: &Shape, var: &str, depth: usize) -> String {
    match shape {
        Shape::NonNull(inner) => convert_required(inner, var, depth),
        nullable => {
            let next = format!("v{depth}");
            format!(
                "{var}.map_or(FieldValue::NULL, |{next}| {})",
                convert_required(nullable, &next, depth + 1)
            )
        }
    }
}

fn convert_leaf(convert: Convert, var: &str) -> String {
    match convert {
        Convert::Value => format!("FieldValue::value({var})"),
        Convert::Id => format!("FieldValue::value({var}.to_string())"),
        Convert::Enum => format!("FieldValue::value(Value::Enum(Name::new({var})))"),
        Convert::Object => format!("FieldValue::owned_any({var})"),
        Convert::Param => format!("convert({var})"),
    }
}

/// `TypeRef` expression for a shape, using the shorthand constructors when
/// one fits.
fn type_ref(shape: &Shape) -> String {
    let (required, rest) = strip_non_null(shape);
    match rest {
        Shape::Leaf(leaf) if required => format!("TypeRef::named_nn({})", leaf.name),
        Shape::Leaf(leaf) => format!("TypeRef::named({})", leaf.name),
        Shape::List(item) => match strip_non_null(item) {
            (items_required, Shape::Leaf(leaf)) => {
                let helper = match (items_required, required) {
                    (false, false) => "named_list",
                    (true, false) => "named_nn_list",
                    (false, true) => "named_list_nn",
                    (true, true) => "named_nn_list_nn",
                };
                format!("TypeRef::{helper}({})", leaf.name)
            }
            _ => explicit_type_ref(shape),
        },
        Shape::NonNull(_) => explicit_type_ref(shape),
    }
}

fn explicit_type_ref(shape: &Shape) -> String {
    match shape {
        Shape::Leaf(leaf) => format!("TypeRef::named({})", leaf.name),
        Shape::List(inner) => format!("TypeRef::List(Box::new({}))", explicit_type_ref(inner)),
        Shape::NonNull(inner) => {
            format!("TypeRef::NonNull(Box::new({}))", explicit_type_ref(inner))
        }
    }
}

fn strip_non_null(shape: &Shape) -> (bool, &Shape) {
    match shape {
        Shape::NonNull(inner) => (true, inner),
        other => (false, other),
    }
}

/// Whether a host type name would be shadowed by, or collide with, a name
/// the generated module relies on.
fn is_reserved_type_name(name: &str) -> bool {
    const PRELUDE: &[&str] = &[
        "Box", "Clone", "Name", "None", "Ok", "Option", "Result", "Send", "Some", "String",
        "Sync", "Value", "Vec",
    ];
    PRELUDE.contains(&name)
        || IMPORTS.iter().any(|(import, _)| *import == name)
        || rust_ident(name) != name
        || matches!(name, "Self" | "self" | "super" | "crate")
}

fn description_call(text: Option<&str>) -> String {
    text.map(|text| format!(".description({text:?})")).unwrap_or_default()
}

fn deprecation_call(reason: Option<&str>) -> String {
    reason
        .map(|reason| format!(".deprecation(Some({reason:?}))"))
        .unwrap_or_default()
}

fn indent(block: &str, width: usize) -> String {
    let pad = " ".repeat(width);
    block
        .lines()
        .map(|line| format!("{pad}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::host::{HostArgument, HostDeclaration, HostField, HostTypeShape, HostUnit};
    use crate::model::{RootKind, extract};
    use crate::resolvers::ResolverBinder;
    use crate::schema::TypeResolver;

    fn named(name: &str) -> HostTypeShape {
        HostTypeShape::named(name)
    }

    fn bindings_of(unit: HostUnit) -> String {
        let model = extract(&unit).unwrap();
        let schema = TypeResolver::new(&model).resolve().unwrap();
        let bindings = ResolverBinder::new(&model, &schema).bind().unwrap();
        let order = TypeOrder::of(&schema);
        render(&model, &schema, &bindings, &order, &CompilerConfig::default()).unwrap()
    }

    fn user_unit() -> HostUnit {
        HostUnit::new("accounts")
            .with_declaration(
                HostDeclaration::object("User")
                    .with_field(HostField::property("firstName", HostTypeShape::nullable(named("string"))))
                    .with_field(HostField::accessor("fullName", named("string")))
                    .with_field(HostField::accessor("group", named("UserGroup")).deferred()),
            )
            .with_declaration(
                HostDeclaration::object("UserGroup").with_field(HostField::property("name", named("string"))),
            )
    }

    #[test]
    fn test_header_and_imports() {
        let out = bindings_of(user_unit());
        assert!(out.starts_with("// @generated by gqlforge. Do not edit.\n// Unit: accounts\n"));
        assert!(out.contains(
            "use async_graphql::dynamic::{Field, FieldFuture, FieldValue, Object, SchemaBuilder, TypeRef};"
        ));
        assert!(!out.contains("use async_graphql::{"));
        assert!(out.contains("use crate::model::*;"));
    }

    #[test]
    fn test_access_and_effect_kinds() {
        let out = bindings_of(user_unit());

        assert!(out.contains("            Field::new(\"firstName\", TypeRef::named(TypeRef::STRING), |ctx| {\n"));
        assert!(out.contains("let parent = ctx.parent_value.try_downcast_ref::<User>()?;"));
        assert!(out.contains("let value = parent.first_name.clone();"));
        assert!(out.contains("Ok(value.map(|v0| FieldValue::value(v0)))"));

        assert!(out.contains("let value = parent.full_name();"));
        assert!(out.contains("Ok(Some(FieldValue::value(value)))"));

        assert!(out.contains("Field::new(\"group\", TypeRef::named_nn(\"UserGroup\"), |ctx| {"));
        assert!(out.contains("let value = parent.group().await;"));
        assert!(out.contains("Ok(Some(FieldValue::owned_any(value)))"));
    }

    #[test]
    fn test_register_lists_types_once_in_order() {
        let out = bindings_of(user_unit());
        assert!(out.contains(
            "pub fn register(builder: SchemaBuilder) -> SchemaBuilder {\n    builder\n        .register(user_object())\n        .register(user_group_object())\n}\n"
        ));
        assert_eq!(out.matches("fn user_object()").count(), 1);
    }

    #[test]
    fn test_root_arguments_and_enums() {
        let unit = HostUnit::new("u")
            .with_declaration(
                HostDeclaration::object("Query").as_root(RootKind::Query).with_field(
                    HostField::accessor("users", HostTypeShape::array(named("User")))
                        .with_arg(HostArgument::new("role", HostTypeShape::nullable(named("Role"))))
                        .with_arg(HostArgument::new("first", named("number")).with_tag("Int"))
                        .with_arg(HostArgument::new("ids", HostTypeShape::array(named("ID")))),
                ),
            )
            .with_declaration(
                HostDeclaration::object("User").with_field(HostField::property("role", named("Role"))),
            )
            .with_declaration(HostDeclaration::enumeration("Role", ["ADMIN", "GUEST"]));

        let out = bindings_of(unit);
        assert!(out.contains("use async_graphql::{Name, Value};"));
        assert!(out.contains("let parent = ctx.data::<Query>()?;"));
        assert!(out.contains(
            "let arg_role = ctx.args.get(\"role\").filter(|v| !v.is_null()).map(|v| v.enum_name().and_then(|s| Ok(s.parse::<Role>()?))).transpose()?;"
        ));
        assert!(out.contains(
            "let arg_first = ctx.args.try_get(\"first\").and_then(|v| v.i64().and_then(|n| Ok(i32::try_from(n)?)))?;"
        ));
        assert!(out.contains(
            "let arg_ids = ctx.args.try_get(\"ids\").and_then(|v| v.list().and_then(|list| list.iter().map(|v| v.string().map(|s| async_graphql::ID::from(s.to_string()))).collect::<async_graphql::Result<Vec<_>>>()))?;"
        ));
        assert!(out.contains("let value = parent.users(arg_role, arg_first, arg_ids);"));
        assert!(out.contains("Ok(Some(FieldValue::list(value.into_iter().map(|v0| FieldValue::owned_any(v0)))))"));
        assert!(out.contains(".argument(InputValue::new(\"role\", TypeRef::named(\"Role\")))"));
        assert!(out.contains(".argument(InputValue::new(\"ids\", TypeRef::named_nn_list_nn(TypeRef::ID)))"));
        assert!(out.contains("FieldValue::value(Value::Enum(Name::new(value)))"));
        assert!(out.contains("fn role_enum() -> Enum {\n    Enum::new(\"Role\")\n        .item(EnumItem::new(\"ADMIN\"))\n"));
    }

    #[test]
    fn test_cyclic_objects_use_field_blocks() {
        let unit = HostUnit::new("u")
            .with_declaration(
                HostDeclaration::object("Author")
                    .with_field(HostField::property("posts", HostTypeShape::array(named("Post")))),
            )
            .with_declaration(
                HostDeclaration::object("Post").with_field(HostField::property("author", named("Author"))),
            );

        let out = bindings_of(unit);
        assert!(out.contains("fn author_object() -> Object {\n    author_fields().into_iter().fold(Object::new(\"Author\"), Object::field)\n}"));
        assert!(out.contains("fn author_fields() -> Vec<Field> {\n    vec![\n"));
        assert!(out.contains("fn post_fields() -> Vec<Field> {"));
    }

    #[test]
    fn test_generic_factories_and_instantiations() {
        let unit = HostUnit::new("u")
            .with_declaration(
                HostDeclaration::generic("Edge", "Node")
                    .with_field(HostField::property("node", named("Node")))
                    .with_field(HostField::property("cursor", named("string"))),
            )
            .with_declaration(
                HostDeclaration::generic("Connection", "Node")
                    .with_field(HostField::property(
                        "edges",
                        HostTypeShape::array(HostTypeShape::generic("Edge", [named("Node")])),
                    )),
            )
            .with_declaration(
                HostDeclaration::object("User")
                    .with_field(HostField::property("friends", HostTypeShape::generic("Connection", [named("User")]))),
            );

        let out = bindings_of(unit);
        assert!(out.contains(
            "        .register(user_object())\n        .register(edge_object::<User>(\"User\", FieldValue::owned_any))\n        .register(connection_object::<User>(\"User\", FieldValue::owned_any))\n"
        ));
        assert!(out.contains(
            "pub fn edge_object<Node>(argument: &str, convert: fn(Node) -> FieldValue<'static>) -> Object\nwhere\n    Node: Clone + Send + Sync + 'static,\n{\n    Object::new(format!(\"{argument}Edge\"))\n"
        ));
        assert!(out.contains("Field::new(\"node\", TypeRef::named_nn(argument), move |ctx| {"));
        assert!(out.contains("let parent = ctx.parent_value.try_downcast_ref::<Edge<Node>>()?;"));
        assert!(out.contains("Ok(Some(convert(value)))"));
        assert!(out.contains("pub fn connection_object<Node>(argument: &str, _convert: fn(Node) -> FieldValue<'static>) -> Object"));
        assert!(out.contains("TypeRef::named_nn_list_nn(format!(\"{argument}Edge\"))"));
        assert!(out.contains("Field::new(\"friends\", TypeRef::named_nn(\"UserConnection\"), |ctx| {"));
    }

    #[test]
    fn test_scalar_instantiation_converter() {
        let unit = HostUnit::new("u")
            .with_declaration(
                HostDeclaration::generic("Page", "T").with_field(HostField::property("items", HostTypeShape::array(named("T")))),
            )
            .with_declaration(
                HostDeclaration::object("Feed")
                    .with_field(HostField::property("tags", HostTypeShape::generic("Page", [named("string")]))),
            );

        let out = bindings_of(unit);
        assert!(out.contains(".register(page_object::<String>(\"String\", |v: String| FieldValue::value(v)))"));
        assert!(out.contains("Ok(Some(FieldValue::list(value.into_iter().map(|v0| convert(v0)))))"));
    }
}
