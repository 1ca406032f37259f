//! Type Resolver: Source Model to Type Graph.
//!
//! Declarations are walked in source order and fields in declaration order.
//! Named references hand out name-keyed slots immediately, so forward and
//! mutually recursive references never recurse; a slot still pending once
//! every declaration has been processed is a dangling reference.

use std::collections::HashMap;

use tracing::{debug, trace};

use super::generic::{GenericEngine, GenericTemplate};
use super::graph::{
    EnumType, ObjectOrigin, ObjectType, ResolvedArgument, ResolvedField, ScalarType, TypeGraph,
    TypeId, TypeNode,
};
use crate::error::SchemaError;
use crate::model::{
    AccessKind, ArgumentDescriptor, FieldDescriptor, FieldRef, RootKind, SourceDeclaration,
    SourceModel, TypeExpr, TypeExprKind,
};
use crate::types::{ScalarKey, ScalarLookupError, ScalarRegistry};

/// Where a type expression was written, and the tag it carries.
#[derive(Debug, Clone, Copy)]
pub(super) struct Site<'a> {
    pub declaration: &'a str,
    pub field: Option<&'a str>,
    pub accessor: bool,
    pub tag: Option<&'a str>,
    pub tag_inherited: bool,
}

impl<'a> Site<'a> {
    pub fn field(declaration: &'a str, field: &'a FieldDescriptor) -> Self {
        Self {
            declaration,
            field: Some(&field.name),
            accessor: field.access == AccessKind::Accessor,
            tag: field.tag.as_deref(),
            tag_inherited: field.tag_inherited,
        }
    }

    pub fn argument(self, argument: &'a ArgumentDescriptor) -> Self {
        Self {
            accessor: false,
            tag: argument.tag.as_deref(),
            tag_inherited: argument.tag_inherited,
            ..self
        }
    }
}

/// Type-parameter substitution active while a generic's fields resolve.
#[derive(Debug, Clone, Copy)]
pub(super) struct Substitution<'a> {
    pub param: &'a str,
    pub node: TypeId,
}

/// First reference made to a slot that was still undeclared at the time.
#[derive(Debug)]
struct Referrer {
    declaration: String,
    field: Option<String>,
    accessor: bool,
}

/// A completed resolution pass.
#[derive(Debug)]
pub struct ResolvedSchema {
    pub graph: TypeGraph,
    pub registry: ScalarRegistry,
    pub generics: GenericEngine,
    /// One factory template per generic declaration, in declaration order.
    pub templates: Vec<GenericTemplate>,
    /// Declared types to start traversal from: entry objects first (query
    /// before mutation), then every other declaration in source order.
    pub roots: Vec<TypeId>,
}

impl ResolvedSchema {
    /// Instantiated objects in completion order.
    pub fn instantiations(&self) -> &[TypeId] {
        self.generics.completion_order()
    }

    /// The object registered as the given entry point, if any.
    pub fn entry_point(&self, kind: RootKind) -> Option<TypeId> {
        self.roots
            .iter()
            .copied()
            .find(|&id| self.graph.object(id).is_some_and(|object| object.root == Some(kind)))
    }
}

/// Builds the Type Graph of one Source Model.
///
/// Owns the pass-scoped Scalar Registry and generic memo table; both are
/// handed out with the [`ResolvedSchema`] and dropped with it.
pub struct TypeResolver<'m> {
    pub(super) model: &'m SourceModel,
    pub(super) graph: TypeGraph,
    pub(super) generics: GenericEngine,
    registry: ScalarRegistry,
    referrers: HashMap<TypeId, Referrer>,
}

impl<'m> TypeResolver<'m> {
    pub fn new(model: &'m SourceModel) -> Self {
        let mut graph = TypeGraph::new();
        let registry = ScalarRegistry::with_builtins(&mut graph);
        Self {
            model,
            graph,
            generics: GenericEngine::new(),
            registry,
            referrers: HashMap::new(),
        }
    }

    /// Runs the pass.
    ///
    /// # Errors
    ///
    /// Fails on the first registry conflict, generic misuse, type conflict or
    /// dangling reference; no partial graph is returned.
    pub fn resolve(mut self) -> Result<ResolvedSchema, SchemaError> {
        let model = self.model;
        self.register_scalars()?;

        let mut entry_points = Vec::new();
        let mut roots = Vec::new();
        let mut templates = Vec::new();

        for (id, declaration) in model.iter() {
            trace!(declaration = %declaration.name(), kind = ?declaration.kind(), "Resolving declaration");
            match declaration {
                SourceDeclaration::Object(object) => {
                    let node = self.graph.placeholder(&object.name);
                    let fields = self.resolve_fields(&object.fields, &object.name, None)?;
                    let resolved = ObjectType {
                        name: object.name.clone(),
                        description: object.description.clone(),
                        root: object.root,
                        origin: ObjectOrigin::Declared(id),
                        fields,
                    };
                    self.graph.define(node, TypeNode::Object(resolved), &object.name)?;
                    match object.root {
                        Some(_) => entry_points.push(node),
                        None => roots.push(node),
                    }
                }
                SourceDeclaration::Enum(enumeration) => {
                    let node = TypeNode::Enum(EnumType {
                        name: enumeration.name.clone(),
                        decl: id,
                    });
                    let name = &enumeration.name;
                    roots.push(self.graph.insert_named(name, node, name)?);
                }
                SourceDeclaration::Scalar(scalar) => {
                    if let Some(node) = self.graph.lookup(&scalar.name) {
                        roots.push(node);
                    }
                }
                SourceDeclaration::GenericObject(generic) => {
                    templates.push(self.build_template(id, generic)?);
                }
            }
        }

        self.check_pending()?;

        let graph = &self.graph;
        entry_points.sort_by_key(|&node| {
            graph.object(node).and_then(|object| object.root) == Some(RootKind::Mutation)
        });
        entry_points.extend(roots);

        debug!(
            unit = %model.unit(),
            nodes = self.graph.len(),
            named = self.graph.named().count(),
            instantiations = self.generics.len(),
            templates = templates.len(),
            "Resolved type graph"
        );

        Ok(ResolvedSchema {
            graph: self.graph,
            registry: self.registry,
            generics: self.generics,
            templates,
            roots: entry_points,
        })
    }

    /// Registers every scalar declaration before any field is resolved.
    fn register_scalars(&mut self) -> Result<(), SchemaError> {
        let model = self.model;
        for (id, declaration) in model.iter() {
            let SourceDeclaration::Scalar(scalar) = declaration else {
                continue;
            };
            let node = TypeNode::Scalar(ScalarType {
                name: scalar.name.clone(),
                decl: Some(id),
            });
            let node = self.graph.insert_named(&scalar.name, node, &scalar.name)?;
            let key = ScalarKey::new(&scalar.internal_type, scalar.tag.as_deref());
            trace!(scalar = %scalar.name, binding = %key, "Registering scalar");
            self.registry.register(key, node, &scalar.name)?;
        }
        Ok(())
    }

    pub(super) fn resolve_fields(
        &mut self,
        fields: &[FieldDescriptor],
        owner: &str,
        substitution: Option<Substitution<'_>>,
    ) -> Result<Vec<ResolvedField>, SchemaError> {
        let mut resolved = Vec::with_capacity(fields.len());
        for (index, field) in fields.iter().enumerate() {
            let site = Site::field(owner, field);
            let ty = self
                .resolve_expr(&field.ty, site, substitution)
                .map_err(|err| accessor_error(site, err))?;
            let args = self.resolve_arguments(field, site, substitution)?;
            resolved.push(ResolvedField {
                name: field.name.clone(),
                ty,
                args,
                source: FieldRef {
                    decl: field.owner,
                    index,
                },
            });
        }
        Ok(resolved)
    }

    pub(super) fn resolve_arguments(
        &mut self,
        field: &FieldDescriptor,
        site: Site<'_>,
        substitution: Option<Substitution<'_>>,
    ) -> Result<Vec<ResolvedArgument>, SchemaError> {
        let mut args = Vec::with_capacity(field.args.len());
        for argument in &field.args {
            let ty = self.resolve_expr(&argument.ty, site.argument(argument), substitution)?;
            args.push(ResolvedArgument {
                name: argument.name.clone(),
                ty,
            });
        }
        Ok(args)
    }

    /// Applies the wrapping grammar: every level without a null marker is
    /// wrapped in `NonNull`, arrays become `List` of their element.
    pub(super) fn resolve_expr(
        &mut self,
        expr: &TypeExpr,
        site: Site<'_>,
        substitution: Option<Substitution<'_>>,
    ) -> Result<TypeId, SchemaError> {
        let inner = match &expr.kind {
            TypeExprKind::Named(name) => self.resolve_named(name, site, substitution)?,
            TypeExprKind::List(element) => {
                let element = self.resolve_expr(element, site, substitution)?;
                self.graph.list_of(element)
            }
            TypeExprKind::Generic { name, args } => {
                self.instantiate(name, args, site, substitution)?
            }
        };
        Ok(if expr.nullable {
            inner
        } else {
            self.graph.non_null(inner)
        })
    }

    /// Resolves a bare name: type parameter, declaration, scalar
    /// representation, or a slot that must be filled before the pass ends.
    pub(super) fn resolve_named(
        &mut self,
        name: &str,
        site: Site<'_>,
        substitution: Option<Substitution<'_>>,
    ) -> Result<TypeId, SchemaError> {
        if let Some(substitution) = substitution.filter(|s| s.param == name) {
            return Ok(substitution.node);
        }

        if let Some((_, declaration)) = self.model.lookup(name) {
            if let SourceDeclaration::GenericObject(generic) = declaration {
                return Err(SchemaError::InvalidGenericArity {
                    generic: generic.name.clone(),
                    expected: 1,
                    actual: 0,
                    declaration: site.declaration.to_string(),
                    field: site.field.map(str::to_string),
                });
            }
            return Ok(self.graph.placeholder(name));
        }

        if self.registry.has_representation(name) {
            return self.lookup_scalar(name, site);
        }

        let node = self.graph.placeholder(name);
        if matches!(self.graph.node(node), TypeNode::Pending { .. }) {
            self.referrers.entry(node).or_insert_with(|| Referrer {
                declaration: site.declaration.to_string(),
                field: site.field.map(str::to_string),
                accessor: site.accessor,
            });
        }
        Ok(node)
    }

    /// A tag inherited from the declaration only applies where a tagged
    /// binding exists; an explicit field tag must match exactly.
    fn lookup_scalar(&self, internal_type: &str, site: Site<'_>) -> Result<TypeId, SchemaError> {
        let found = match self.registry.lookup(internal_type, site.tag) {
            Err(ScalarLookupError::Unknown) if site.tag_inherited => {
                self.registry.lookup(internal_type, None)
            }
            found => found,
        };
        found.map_err(|err| {
            err.at(
                &ScalarKey::new(internal_type, site.tag),
                site.declaration,
                site.field,
            )
        })
    }

    fn check_pending(&self) -> Result<(), SchemaError> {
        let Some((node, name)) = self.graph.pending().next() else {
            return Ok(());
        };
        let referrer = self.referrers.get(&node);
        let declaration = referrer.map_or_else(|| name.to_string(), |r| r.declaration.clone());
        let field = referrer.and_then(|r| r.field.clone());
        let cause = SchemaError::UnresolvedTypeReference {
            name: name.to_string(),
            declaration: declaration.clone(),
            field: field.clone(),
        };
        match (referrer, field) {
            (Some(referrer), Some(field)) if referrer.accessor => {
                Err(SchemaError::accessor_unresolved(declaration, field, cause))
            }
            _ => Err(cause),
        }
    }
}

/// Failures in an accessor's return shape surface as binding failures.
pub(super) fn accessor_error(site: Site<'_>, err: SchemaError) -> SchemaError {
    match site.field {
        Some(field) if site.accessor && !matches!(err, SchemaError::UnboundAccessor { .. }) => {
            SchemaError::accessor_unresolved(site.declaration, field, err)
        }
        _ => err,
    }
}
