//! Generic Instantiation Engine.
//!
//! Instantiations are memoized by [`InstantiationKey`]; the same key always
//! yields the same object node. The memo entry is reserved before the
//! generic's fields resolve, so a generic that refers to itself (or to a
//! nested application of its own argument) terminates.
//!
//! Instantiated names follow one fixed rule: the argument's schema name
//! followed by the generic's name, so `Connection<User>` is `UserConnection`.

use indexmap::IndexMap;
use tracing::{debug, trace};

use super::graph::{ObjectOrigin, ObjectType, ResolvedArgument, TypeId, TypeNode};
use super::type_resolver::{Site, Substitution, TypeResolver, accessor_error};
use crate::error::SchemaError;
use crate::model::{DeclId, FieldRef, GenericObjectDecl, SourceDeclaration, TypeExpr, TypeExprKind};

/// Generic declaration name plus the ordered schema names of its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstantiationKey {
    pub generic: String,
    pub arguments: Vec<String>,
}

/// Derives the schema name of an instantiation.
pub fn instantiated_name(generic: &str, arguments: &[String]) -> String {
    let mut name = arguments.concat();
    name.push_str(generic);
    name
}

/// Memo table of one compilation pass.
#[derive(Debug, Default)]
pub struct GenericEngine {
    memo: IndexMap<InstantiationKey, TypeId>,
    completed: Vec<TypeId>,
}

impl GenericEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &InstantiationKey) -> Option<TypeId> {
        self.memo.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.memo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memo.is_empty()
    }

    /// Instantiations in request order.
    pub fn instantiations(&self) -> impl Iterator<Item = (&InstantiationKey, TypeId)> {
        self.memo.iter().map(|(key, &id)| (key, id))
    }

    /// Instantiations in completion order; nested ones precede their
    /// containers.
    pub fn completion_order(&self) -> &[TypeId] {
        &self.completed
    }
}

/// Factory description of a generic declaration, independent of any argument.
#[derive(Debug, Clone)]
pub struct GenericTemplate {
    pub decl: DeclId,
    pub name: String,
    pub param: String,
    /// The placeholder node standing for `param`.
    pub placeholder: TypeId,
    pub fields: Vec<TemplateField>,
}

#[derive(Debug, Clone)]
pub struct TemplateField {
    pub name: String,
    pub ty: TemplateType,
    pub args: Vec<ResolvedArgument>,
    pub source: FieldRef,
}

/// Field type of a template. Mirrors the declared shape level by level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateType {
    /// A named node; the generic placeholder when it is the parameter.
    Node(TypeId),
    /// Another generic applied to this template's parameter.
    Application { generic: DeclId, name: String },
    List(Box<TemplateType>),
    NonNull(Box<TemplateType>),
}

impl TemplateType {
    /// Generic applications this type depends on.
    pub fn application(&self) -> Option<(DeclId, &str)> {
        match self {
            Self::Application { generic, name } => Some((*generic, name.as_str())),
            Self::List(inner) | Self::NonNull(inner) => inner.application(),
            Self::Node(_) => None,
        }
    }
}

impl<'m> TypeResolver<'m> {
    /// Returns the object for `name<args>`, building it on first request.
    pub(super) fn instantiate(
        &mut self,
        name: &str,
        args: &[String],
        site: Site<'_>,
        substitution: Option<Substitution<'_>>,
    ) -> Result<TypeId, SchemaError> {
        let (decl, generic) = self.generic_declaration(name, args.len(), site)?;

        let mut arguments = Vec::with_capacity(args.len());
        let mut argument_names = Vec::with_capacity(args.len());
        for arg in args {
            let node = self.resolve_named(arg, site, substitution)?;
            argument_names.push(self.graph.type_name(node).unwrap_or(arg.as_str()).to_string());
            arguments.push(node);
        }

        let key = InstantiationKey {
            generic: generic.name.clone(),
            arguments: argument_names,
        };
        if let Some(node) = self.generics.get(&key) {
            trace!(generic = %key.generic, arguments = ?key.arguments, "Reusing instantiation");
            return Ok(node);
        }

        let type_name = instantiated_name(&key.generic, &key.arguments);
        let node = self.graph.placeholder(&type_name);
        self.generics.memo.insert(key, node);

        let scope = Substitution {
            param: &generic.type_param,
            node: arguments[0],
        };
        let fields = self.resolve_fields(&generic.fields, &generic.name, Some(scope))?;
        let object = ObjectType {
            name: type_name.clone(),
            description: generic.description.clone(),
            root: None,
            origin: ObjectOrigin::Instantiated {
                generic: decl,
                argument: arguments[0],
            },
            fields,
        };
        self.graph.define(node, TypeNode::Object(object), &generic.name)?;
        self.generics.completed.push(node);

        debug!(generic = %generic.name, instantiation = %type_name, "Instantiated generic object");
        Ok(node)
    }

    /// Looks up a generic declaration and checks the argument count.
    fn generic_declaration(
        &self,
        name: &str,
        arity: usize,
        site: Site<'_>,
    ) -> Result<(DeclId, &'m GenericObjectDecl), SchemaError> {
        let model = self.model;
        let arity_error = |expected| SchemaError::InvalidGenericArity {
            generic: name.to_string(),
            expected,
            actual: arity,
            declaration: site.declaration.to_string(),
            field: site.field.map(str::to_string),
        };
        match model.lookup(name) {
            Some((id, SourceDeclaration::GenericObject(generic))) if arity == 1 => {
                Ok((id, generic))
            }
            Some((_, SourceDeclaration::GenericObject(_))) => Err(arity_error(1)),
            Some(_) => Err(arity_error(0)),
            None => Err(SchemaError::UnresolvedTypeReference {
                name: name.to_string(),
                declaration: site.declaration.to_string(),
                field: site.field.map(str::to_string),
            }),
        }
    }

    /// Builds the factory template of a generic declaration.
    pub(super) fn build_template(
        &mut self,
        decl: DeclId,
        generic: &'m GenericObjectDecl,
    ) -> Result<GenericTemplate, SchemaError> {
        let placeholder = self.graph.generic_placeholder(&generic.type_param);
        let scope = Substitution {
            param: &generic.type_param,
            node: placeholder,
        };

        let mut fields = Vec::with_capacity(generic.fields.len());
        for (index, field) in generic.fields.iter().enumerate() {
            let site = Site::field(&generic.name, field);
            let ty = self
                .resolve_template(&field.ty, generic, site)
                .map_err(|err| accessor_error(site, err))?;
            let args = self.resolve_arguments(field, site, Some(scope))?;
            fields.push(TemplateField {
                name: field.name.clone(),
                ty,
                args,
                source: FieldRef { decl, index },
            });
        }

        trace!(generic = %generic.name, fields = fields.len(), "Built generic template");
        Ok(GenericTemplate {
            decl,
            name: generic.name.clone(),
            param: generic.type_param.clone(),
            placeholder,
            fields,
        })
    }

    fn resolve_template(
        &mut self,
        expr: &TypeExpr,
        generic: &GenericObjectDecl,
        site: Site<'_>,
    ) -> Result<TemplateType, SchemaError> {
        let inner = match &expr.kind {
            TypeExprKind::Named(name) if *name == generic.type_param => {
                TemplateType::Node(self.graph.generic_placeholder(name))
            }
            TypeExprKind::Named(name) => TemplateType::Node(self.resolve_named(name, site, None)?),
            TypeExprKind::List(element) => {
                TemplateType::List(Box::new(self.resolve_template(element, generic, site)?))
            }
            TypeExprKind::Generic { name, args } if args.contains(&generic.type_param) => {
                let (decl, applied) = self.generic_declaration(name, args.len(), site)?;
                TemplateType::Application {
                    generic: decl,
                    name: applied.name.clone(),
                }
            }
            TypeExprKind::Generic { name, args } => {
                TemplateType::Node(self.instantiate(name, args, site, None)?)
            }
        };
        Ok(if expr.nullable {
            inner
        } else {
            TemplateType::NonNull(Box::new(inner))
        })
    }
}
