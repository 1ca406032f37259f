//! Resolver Binder.
//!
//! Classifies every resolved field by access kind and effect kind and
//! records how its call arguments are reconstructed. The binder only reads
//! the Type Graph; argument types were already resolved by the Type Resolver.

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::error::SchemaError;
use crate::model::{
    AccessKind, DeclId, EffectKind, FieldDescriptor, FieldRef, SourceDeclaration, SourceModel,
};
use crate::naming::to_snake_case;
use crate::schema::{ResolvedArgument, ResolvedSchema, TypeGraph, TypeId, TypeNode};

/// What a resolver reads its receiver from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentSource {
    /// The parent value handed down by the runtime.
    Value,
    /// Shared root data registered with the schema; used by entry objects.
    RootData,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accessor {
    /// Read `member` directly off the parent value.
    Property { member: String },
    /// Invoke `member` on the parent value with the arguments in order.
    Method {
        member: String,
        arguments: Vec<ArgumentBinding>,
    },
}

impl Accessor {
    pub fn member(&self) -> &str {
        match self {
            Self::Property { member } | Self::Method { member, .. } => member,
        }
    }

    pub fn arguments(&self) -> &[ArgumentBinding] {
        match self {
            Self::Property { .. } => &[],
            Self::Method { arguments, .. } => arguments,
        }
    }
}

/// How a raw argument value is turned into the parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgumentDecode {
    /// Raw identifier converted into the configured ID value object.
    Id,
    String,
    Boolean,
    Int,
    Float,
    /// Enum item name parsed into the named host enum.
    Enum(String),
    /// Structured deserialization into the named custom scalar type.
    Deserialize(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentShape {
    Value,
    List { nullable_items: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentBinding {
    /// Schema argument name.
    pub name: String,
    /// Rust identifier the decoded value is bound to. The `arg_` prefix keeps
    /// it apart from the resolver's own locals.
    pub variable: String,
    pub decode: ArgumentDecode,
    pub shape: ArgumentShape,
    pub nullable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverBinding {
    pub field: String,
    pub source: FieldRef,
    pub parent: ParentSource,
    pub accessor: Accessor,
    pub effect: EffectKind,
}

impl ResolverBinding {
    pub fn is_deferred(&self) -> bool {
        self.effect == EffectKind::Deferred
    }
}

/// Bindings of one pass, keyed by declared object and by generic template.
#[derive(Debug, Default)]
pub struct Bindings {
    objects: IndexMap<TypeId, Vec<ResolverBinding>>,
    templates: IndexMap<DeclId, Vec<ResolverBinding>>,
}

impl Bindings {
    /// Bindings of a declared object, in field order.
    pub fn object(&self, id: TypeId) -> Option<&[ResolverBinding]> {
        self.objects.get(&id).map(Vec::as_slice)
    }

    /// Bindings of a generic declaration, shared by all its instantiations.
    pub fn template(&self, decl: DeclId) -> Option<&[ResolverBinding]> {
        self.templates.get(&decl).map(Vec::as_slice)
    }

    /// Total number of bound fields.
    pub fn len(&self) -> usize {
        self.objects.values().chain(self.templates.values()).map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct ResolverBinder<'a> {
    model: &'a SourceModel,
    schema: &'a ResolvedSchema,
}

impl<'a> ResolverBinder<'a> {
    pub fn new(model: &'a SourceModel, schema: &'a ResolvedSchema) -> Self {
        Self { model, schema }
    }

    /// Binds every field of every declared object and generic template.
    pub fn bind(&self) -> Result<Bindings, SchemaError> {
        let mut bindings = Bindings::default();

        for (_, declaration) in self.model.iter() {
            let SourceDeclaration::Object(object) = declaration else {
                continue;
            };
            let Some(node) = self.schema.graph.lookup(&object.name) else {
                return Err(SchemaError::Internal(format!(
                    "object `{}` has no node in the type graph",
                    object.name
                )));
            };
            let Some(resolved) = self.schema.graph.object(node) else {
                return Err(SchemaError::Internal(format!(
                    "`{}` did not resolve to an object",
                    object.name
                )));
            };
            let parent = match object.root {
                Some(_) => ParentSource::RootData,
                None => ParentSource::Value,
            };
            let fields = resolved
                .fields
                .iter()
                .map(|field| self.bind_field(field.source, &field.args, &parent))
                .collect::<Result<Vec<_>, _>>()?;
            bindings.objects.insert(node, fields);
        }

        for template in &self.schema.templates {
            let fields = template
                .fields
                .iter()
                .map(|field| self.bind_field(field.source, &field.args, &ParentSource::Value))
                .collect::<Result<Vec<_>, _>>()?;
            bindings.templates.insert(template.decl, fields);
        }

        debug!(
            unit = %self.model.unit(),
            objects = bindings.objects.len(),
            templates = bindings.templates.len(),
            fields = bindings.len(),
            "Bound resolvers"
        );
        Ok(bindings)
    }

    fn bind_field(
        &self,
        source: FieldRef,
        args: &[ResolvedArgument],
        parent: &ParentSource,
    ) -> Result<ResolverBinding, SchemaError> {
        let owner = self.model.get(source.decl).name();
        let Some(field) = self.model.field(source) else {
            return Err(SchemaError::Internal(format!(
                "field #{} of `{owner}` is missing from the source model",
                source.index
            )));
        };

        let accessor = match field.access {
            AccessKind::Property if !field.args.is_empty() => {
                return Err(SchemaError::unbound_accessor(
                    owner,
                    &field.name,
                    "a stored property cannot take arguments",
                ));
            }
            AccessKind::Property if field.effect == EffectKind::Deferred => {
                return Err(SchemaError::unbound_accessor(
                    owner,
                    &field.name,
                    "only computed accessors can be deferred",
                ));
            }
            AccessKind::Property => Accessor::Property {
                member: field.member.clone(),
            },
            AccessKind::Accessor => {
                let arguments: Vec<ArgumentBinding> = args
                    .iter()
                    .map(|arg| self.bind_argument(owner, field, arg))
                    .collect::<Result<_, _>>()?;
                let mut variables = HashMap::new();
                for argument in &arguments {
                    if let Some(other) = variables.insert(&argument.variable, &argument.name) {
                        return Err(SchemaError::unbound_accessor(
                            owner,
                            &field.name,
                            format!(
                                "arguments `{other}` and `{}` both decode into `{}`",
                                argument.name, argument.variable
                            ),
                        ));
                    }
                }
                Accessor::Method {
                    member: field.member.clone(),
                    arguments,
                }
            }
        };

        trace!(
            declaration = %owner,
            field = %field.name,
            access = ?field.access,
            effect = ?field.effect,
            "Bound field"
        );
        Ok(ResolverBinding {
            field: field.name.clone(),
            source,
            parent: parent.clone(),
            accessor,
            effect: field.effect,
        })
    }

    fn bind_argument(
        &self,
        owner: &str,
        field: &FieldDescriptor,
        arg: &ResolvedArgument,
    ) -> Result<ArgumentBinding, SchemaError> {
        let graph = &self.schema.graph;
        let fail = |reason: String| SchemaError::unbound_accessor(owner, &field.name, reason);

        let (nullable, inner) = unwrap_non_null(graph, arg.ty);
        let (shape, named) = match graph.node(inner) {
            TypeNode::List(item) => {
                let (nullable_items, item) = unwrap_non_null(graph, *item);
                if matches!(graph.node(item), TypeNode::List(_)) {
                    return Err(fail(format!(
                        "argument `{}` is a nested list, which cannot be decoded",
                        arg.name
                    )));
                }
                (ArgumentShape::List { nullable_items }, item)
            }
            _ => (ArgumentShape::Value, inner),
        };

        let decode = match graph.node(named) {
            TypeNode::Scalar(scalar) => match scalar.name.as_str() {
                "ID" if scalar.is_builtin() => ArgumentDecode::Id,
                "String" if scalar.is_builtin() => ArgumentDecode::String,
                "Boolean" if scalar.is_builtin() => ArgumentDecode::Boolean,
                "Int" if scalar.is_builtin() => ArgumentDecode::Int,
                "Float" if scalar.is_builtin() => ArgumentDecode::Float,
                name => ArgumentDecode::Deserialize(name.to_string()),
            },
            TypeNode::Enum(enumeration) => ArgumentDecode::Enum(enumeration.name.clone()),
            TypeNode::GenericPlaceholder(param) => {
                return Err(fail(format!(
                    "argument `{}` depends on the type parameter `{param}`",
                    arg.name
                )));
            }
            other => {
                let name = graph.type_name(named).unwrap_or_default();
                return Err(fail(format!(
                    "argument `{}` has output type `{name}` ({}); only scalars and enums can be arguments",
                    arg.name,
                    match other {
                        TypeNode::Object(_) => "object",
                        _ => "unresolved",
                    }
                )));
            }
        };

        Ok(ArgumentBinding {
            name: arg.name.clone(),
            variable: format!("arg_{}", to_snake_case(&arg.name)),
            decode,
            shape,
            nullable,
        })
    }
}

/// Returns whether the type is nullable, and the type under its non-null
/// wrapper.
fn unwrap_non_null(graph: &TypeGraph, id: TypeId) -> (bool, TypeId) {
    match graph.node(id) {
        TypeNode::NonNull(inner) => (false, *inner),
        _ => (true, id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::extract;
    use crate::model::host::{HostArgument, HostDeclaration, HostField, HostTypeShape, HostUnit};
    use crate::model::RootKind;
    use crate::schema::TypeResolver;

    fn named(name: &str) -> HostTypeShape {
        HostTypeShape::named(name)
    }

    fn bind(unit: HostUnit) -> Result<(ResolvedSchema, Bindings), SchemaError> {
        let model = extract(&unit)?;
        let schema = TypeResolver::new(&model).resolve()?;
        let bindings = ResolverBinder::new(&model, &schema).bind()?;
        Ok((schema, bindings))
    }

    fn user_unit() -> HostUnit {
        HostUnit::new("accounts")
            .with_declaration(
                HostDeclaration::object("User")
                    .with_field(HostField::property("firstName", HostTypeShape::nullable(named("string"))))
                    .with_field(HostField::property("lastName", HostTypeShape::nullable(named("string"))))
                    .with_field(HostField::accessor("fullName", HostTypeShape::nullable(named("string"))))
                    .with_field(HostField::accessor("group", named("UserGroup")).deferred()),
            )
            .with_declaration(
                HostDeclaration::object("UserGroup").with_field(HostField::property("name", named("string"))),
            )
    }

    #[test]
    fn test_access_and_effect_kinds() {
        let (schema, bindings) = bind(user_unit()).unwrap();
        let user = bindings.object(schema.graph.lookup("User").unwrap()).unwrap();
        let names: Vec<_> = user.iter().map(|b| b.field.as_str()).collect();
        assert_eq!(names, ["firstName", "lastName", "fullName", "group"]);

        assert_eq!(
            user[0].accessor,
            Accessor::Property {
                member: "first_name".into()
            }
        );
        assert!(matches!(user[2].accessor, Accessor::Method { ref member, .. } if member == "full_name"));
        assert!(!user[2].is_deferred());
        assert!(matches!(user[3].accessor, Accessor::Method { .. }));
        assert!(user[3].is_deferred());
        assert_eq!(user[3].parent, ParentSource::Value);
        assert_eq!(bindings.len(), 5);
    }

    #[test]
    fn test_argument_decoding() {
        let unit = HostUnit::new("u")
            .with_declaration(HostDeclaration::enumeration("Role", ["ADMIN", "MEMBER"]))
            .with_declaration(HostDeclaration::scalar("DateTime", "Date"))
            .with_declaration(
                HostDeclaration::object("Query")
                    .as_root(RootKind::Query)
                    .with_field(
                        HostField::accessor("users", HostTypeShape::array(named("string")))
                            .deferred()
                            .with_arg(HostArgument::new("groupId", named("ID")))
                            .with_arg(HostArgument::new("role", HostTypeShape::nullable(named("Role"))))
                            .with_arg(HostArgument::new("since", named("Date")))
                            .with_arg(HostArgument::new("limit", named("number")).with_tag("Int"))
                            .with_arg(HostArgument::new(
                                "type",
                                HostTypeShape::nullable(HostTypeShape::array(HostTypeShape::nullable(named("string")))),
                            )),
                    ),
            );

        let (schema, bindings) = bind(unit).unwrap();
        let query = bindings.object(schema.graph.lookup("Query").unwrap()).unwrap();
        assert_eq!(query[0].parent, ParentSource::RootData);

        let args = query[0].accessor.arguments();
        assert_eq!(args[0].variable, "arg_group_id");
        assert_eq!(args[0].decode, ArgumentDecode::Id);
        assert!(!args[0].nullable);
        assert_eq!(args[1].decode, ArgumentDecode::Enum("Role".into()));
        assert!(args[1].nullable);
        assert_eq!(args[2].decode, ArgumentDecode::Deserialize("DateTime".into()));
        assert_eq!(args[3].decode, ArgumentDecode::Int);
        assert_eq!(args[4].variable, "arg_type");
        assert_eq!(args[4].shape, ArgumentShape::List { nullable_items: true });
        assert!(args[4].nullable);
    }

    #[test]
    fn test_arguments_named_like_resolver_locals() {
        let unit = HostUnit::new("u").with_declaration(
            HostDeclaration::object("Folder").with_field(
                HostField::accessor("children", HostTypeShape::array(named("string")))
                    .with_arg(HostArgument::new("parent", named("ID")))
                    .with_arg(HostArgument::new("ctx", named("string")))
                    .with_arg(HostArgument::new("value", HostTypeShape::nullable(named("boolean")))),
            ),
        );
        let (schema, bindings) = bind(unit).unwrap();
        let folder = bindings.object(schema.graph.lookup("Folder").unwrap()).unwrap();
        let variables: Vec<&str> = folder[0]
            .accessor
            .arguments()
            .iter()
            .map(|arg| arg.variable.as_str())
            .collect();
        assert_eq!(variables, ["arg_parent", "arg_ctx", "arg_value"]);
    }

    #[test]
    fn test_colliding_argument_variables_are_unbound() {
        let unit = HostUnit::new("u").with_declaration(
            HostDeclaration::object("User").with_field(
                HostField::accessor("posts", HostTypeShape::array(named("string")))
                    .with_arg(HostArgument::new("authorId", named("ID")))
                    .with_arg(HostArgument::new("author_id", named("ID"))),
            ),
        );
        let err = bind(unit).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::UnboundAccessor { ref field, ref reason, .. }
                if field == "posts" && reason.contains("arg_author_id")
        ));
    }

    #[test]
    fn test_property_with_arguments_is_unbound() {
        let unit = HostUnit::new("u").with_declaration(
            HostDeclaration::object("User").with_field(
                HostField::property("name", named("string"))
                    .with_arg(HostArgument::new("locale", named("string"))),
            ),
        );
        let err = bind(unit).unwrap_err();
        assert!(matches!(err, SchemaError::UnboundAccessor { ref field, .. } if field == "name"));
    }

    #[test]
    fn test_object_argument_is_unbound() {
        let unit = user_unit().with_declaration(
            HostDeclaration::object("Directory").with_field(
                HostField::accessor("members", HostTypeShape::array(named("User")))
                    .with_arg(HostArgument::new("group", named("UserGroup"))),
            ),
        );
        let err = bind(unit).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::UnboundAccessor { ref declaration, ref field, .. }
                if declaration == "Directory" && field == "members"
        ));
    }

    #[test]
    fn test_template_bindings() {
        let unit = HostUnit::new("u").with_declaration(
            HostDeclaration::generic("Edge", "Node")
                .with_field(HostField::property("node", named("Node")))
                .with_field(HostField::accessor("cursor", named("string"))),
        );
        let (schema, bindings) = bind(unit).unwrap();
        let edge = bindings.template(schema.templates[0].decl).unwrap();
        assert_eq!(edge.len(), 2);
        assert_eq!(edge[0].accessor.member(), "node");
        assert!(matches!(edge[1].accessor, Accessor::Method { .. }));
    }

    #[test]
    fn test_generic_parameter_argument_is_unbound() {
        let unit = HostUnit::new("u").with_declaration(
            HostDeclaration::generic("Filter", "T")
                .with_field(HostField::property("sample", named("T")))
                .with_field(
                    HostField::accessor("matches", named("boolean"))
                        .with_arg(HostArgument::new("value", named("T"))),
                ),
        );
        let err = bind(unit).unwrap_err();
        assert!(matches!(err, SchemaError::UnboundAccessor { ref reason, .. } if reason.contains("type parameter")));
    }
}
