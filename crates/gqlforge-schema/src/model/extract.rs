//! Declaration Extractor: host metadata to Source Model.

use std::collections::{HashMap, HashSet};

use tracing::{debug, trace};

use super::host::{
    HostAccess, HostArgument, HostDeclaration, HostDeclarationKind, HostField, HostTypeShape,
    HostUnit,
};
use super::{
    AccessKind, ArgumentDescriptor, DeclId, EffectKind, EnumDecl, EnumValue, FieldDescriptor,
    GenericObjectDecl, ObjectDecl, RootKind, ScalarDecl, SourceDeclaration, SourceModel,
    TypeExpr, TypeExprKind,
};
use crate::error::SchemaError;
use crate::naming::{is_rust_member_name, is_valid_graphql_name, to_snake_case};

/// Builds the Source Model of one compilation unit.
///
/// Declaration order is preserved. Declarations that do not participate are
/// skipped; a participating declaration that lacks the shape its kind
/// requires fails the whole unit.
pub fn extract(unit: &HostUnit) -> Result<SourceModel, SchemaError> {
    let mut model = SourceModel::new(&unit.name);
    let mut skipped = 0usize;
    let mut entry_points = HashMap::new();

    for host in &unit.declarations {
        let entry = unit.participation.get(&host.name);
        let participates = entry.map_or(host.participates, |entry| entry.participates);
        if !participates {
            trace!(declaration = %host.name, "Skipping non-participating declaration");
            skipped += 1;
            continue;
        }

        if !is_valid_graphql_name(&host.name) {
            return Err(SchemaError::extraction(
                &host.name,
                "declaration name is not a valid GraphQL name",
            ));
        }

        if let Some(root) = host.root {
            if host.kind != HostDeclarationKind::Object {
                return Err(SchemaError::extraction(
                    &host.name,
                    "only object declarations can be entry points",
                ));
            }
            if entry_points.insert(root, host.name.as_str()).is_some() {
                return Err(SchemaError::extraction(
                    &host.name,
                    format!("a second {root:?} entry point in this unit"),
                ));
            }
        }

        let default_tag = entry
            .and_then(|entry| entry.tag.clone())
            .or_else(|| host.tag.clone());
        let id = DeclId(model.len());
        let declaration = match host.kind {
            HostDeclarationKind::Object => extract_object(id, host, default_tag.as_deref())?,
            HostDeclarationKind::GenericObject => {
                extract_generic(id, host, default_tag.as_deref())?
            }
            HostDeclarationKind::Enum => extract_enum(host)?,
            HostDeclarationKind::Scalar => extract_scalar(host, default_tag)?,
        };

        trace!(declaration = %host.name, kind = ?host.kind, "Extracted declaration");
        if model.push(declaration).is_none() {
            return Err(SchemaError::extraction(
                &host.name,
                "declaration name is used more than once in this unit",
            ));
        }
    }

    if let Some(mutation) = entry_points.get(&RootKind::Mutation) {
        if !entry_points.contains_key(&RootKind::Query) {
            return Err(SchemaError::extraction(
                *mutation,
                "a mutation entry point needs a query entry point in the same unit",
            ));
        }
    }

    debug!(
        unit = %unit.name,
        declarations = model.len(),
        skipped,
        "Extracted source model"
    );
    Ok(model)
}

fn extract_object(
    id: DeclId,
    host: &HostDeclaration,
    default_tag: Option<&str>,
) -> Result<SourceDeclaration, SchemaError> {
    if !host.type_params.is_empty() {
        return Err(SchemaError::extraction(
            &host.name,
            "object declarations cannot have type parameters; declare it as generic_object",
        ));
    }
    let fields = extract_fields(id, host, default_tag)?;
    Ok(SourceDeclaration::Object(ObjectDecl {
        name: host.name.clone(),
        description: host.description.clone(),
        root: host.root,
        fields,
    }))
}

fn extract_generic(
    id: DeclId,
    host: &HostDeclaration,
    default_tag: Option<&str>,
) -> Result<SourceDeclaration, SchemaError> {
    let [type_param] = host.type_params.as_slice() else {
        return Err(SchemaError::extraction(
            &host.name,
            format!(
                "generic declarations need exactly one type parameter, found {}",
                host.type_params.len()
            ),
        ));
    };
    if !is_valid_graphql_name(type_param) {
        return Err(SchemaError::extraction(
            &host.name,
            format!("type parameter `{type_param}` is not a valid GraphQL name"),
        ));
    }

    let fields = extract_fields(id, host, default_tag)?;
    if !fields.iter().any(|field| field.ty.mentions(type_param)) {
        return Err(SchemaError::extraction(
            &host.name,
            format!("type parameter `{type_param}` is not used by any field"),
        ));
    }

    Ok(SourceDeclaration::GenericObject(GenericObjectDecl {
        name: host.name.clone(),
        description: host.description.clone(),
        type_param: type_param.clone(),
        fields,
    }))
}

fn extract_enum(host: &HostDeclaration) -> Result<SourceDeclaration, SchemaError> {
    if host.values.is_empty() {
        return Err(SchemaError::extraction(&host.name, "enum has no values"));
    }

    let mut seen = HashSet::new();
    let mut values = Vec::with_capacity(host.values.len());
    for value in &host.values {
        if !is_valid_graphql_name(&value.name) || matches!(value.name.as_str(), "true" | "false" | "null") {
            return Err(SchemaError::extraction_at(
                &host.name,
                &value.name,
                "enum value is not a valid GraphQL enum value name",
            ));
        }
        if !seen.insert(value.name.as_str()) {
            return Err(SchemaError::extraction_at(
                &host.name,
                &value.name,
                "duplicate enum value",
            ));
        }
        values.push(EnumValue {
            name: value.name.clone(),
            description: value.description.clone(),
            deprecation: value.deprecation.clone(),
        });
    }

    Ok(SourceDeclaration::Enum(EnumDecl {
        name: host.name.clone(),
        description: host.description.clone(),
        values,
    }))
}

fn extract_scalar(
    host: &HostDeclaration,
    tag: Option<String>,
) -> Result<SourceDeclaration, SchemaError> {
    let internal_type = host
        .internal_type
        .as_deref()
        .map(str::trim)
        .filter(|internal| !internal.is_empty())
        .ok_or_else(|| {
            SchemaError::extraction(&host.name, "scalar declaration has no internal representation type")
        })?;

    Ok(SourceDeclaration::Scalar(ScalarDecl {
        name: host.name.clone(),
        description: host.description.clone(),
        internal_type: internal_type.to_string(),
        tag,
    }))
}

fn extract_fields(
    owner: DeclId,
    host: &HostDeclaration,
    default_tag: Option<&str>,
) -> Result<Vec<FieldDescriptor>, SchemaError> {
    if host.fields.is_empty() {
        return Err(SchemaError::extraction(&host.name, "declaration has no fields"));
    }

    let mut seen = HashSet::new();
    host.fields
        .iter()
        .map(|field| {
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::extraction_at(
                    &host.name,
                    &field.name,
                    "duplicate field name",
                ));
            }
            extract_field(owner, host, field, default_tag)
        })
        .collect()
}

fn extract_field(
    owner: DeclId,
    host: &HostDeclaration,
    field: &HostField,
    default_tag: Option<&str>,
) -> Result<FieldDescriptor, SchemaError> {
    if !is_valid_graphql_name(&field.name) {
        return Err(SchemaError::extraction_at(
            &host.name,
            &field.name,
            "field name is not a valid GraphQL name",
        ));
    }

    let ty = normalize(&field.ty)
        .map_err(|message| SchemaError::extraction_at(&host.name, &field.name, message))?;

    let mut seen = HashSet::new();
    let args = field
        .args
        .iter()
        .map(|arg| {
            if !seen.insert(arg.name.as_str()) {
                return Err(SchemaError::extraction_at(
                    &host.name,
                    &field.name,
                    format!("duplicate argument `{}`", arg.name),
                ));
            }
            extract_argument(host, field, arg, default_tag)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let access = match field.access {
        HostAccess::Property => AccessKind::Property,
        HostAccess::Accessor => AccessKind::Accessor,
    };
    let effect = if field.deferred {
        EffectKind::Deferred
    } else {
        EffectKind::Immediate
    };

    let member = field
        .member
        .clone()
        .unwrap_or_else(|| to_snake_case(&field.name));
    if !is_rust_member_name(&member) {
        return Err(SchemaError::extraction_at(
            &host.name,
            &field.name,
            format!("member `{member}` cannot be referenced from generated code"),
        ));
    }

    Ok(FieldDescriptor {
        owner,
        name: field.name.clone(),
        member,
        ty,
        tag: field.tag.clone().or_else(|| default_tag.map(str::to_string)),
        tag_inherited: field.tag.is_none() && default_tag.is_some(),
        args,
        access,
        effect,
        description: field.description.clone(),
        deprecation: field.deprecation.clone(),
    })
}

fn extract_argument(
    host: &HostDeclaration,
    field: &HostField,
    arg: &HostArgument,
    default_tag: Option<&str>,
) -> Result<ArgumentDescriptor, SchemaError> {
    if !is_valid_graphql_name(&arg.name) {
        return Err(SchemaError::extraction_at(
            &host.name,
            &field.name,
            format!("argument `{}` is not a valid GraphQL name", arg.name),
        ));
    }
    let ty = normalize(&arg.ty).map_err(|message| {
        SchemaError::extraction_at(
            &host.name,
            &field.name,
            format!("argument `{}`: {message}", arg.name),
        )
    })?;

    Ok(ArgumentDescriptor {
        name: arg.name.clone(),
        ty,
        tag: arg.tag.clone().or_else(|| default_tag.map(str::to_string)),
        tag_inherited: arg.tag.is_none() && default_tag.is_some(),
        description: arg.description.clone(),
    })
}

/// Normalizes a raw shape into a [`TypeExpr`].
///
/// A union of exactly one type and a null marker is nullable; every other
/// accepted shape is required.
fn normalize(shape: &HostTypeShape) -> Result<TypeExpr, String> {
    match shape {
        HostTypeShape::Named { name } => {
            if name.trim().is_empty() {
                return Err("empty type name".into());
            }
            Ok(TypeExpr::required(TypeExprKind::Named(name.clone())))
        }
        HostTypeShape::Null => Err("a bare null type has no schema representation".into()),
        HostTypeShape::Array { element } => {
            let element = normalize(element)?;
            Ok(TypeExpr::required(TypeExprKind::List(Box::new(element))))
        }
        HostTypeShape::Generic { name, args } => {
            let args = args
                .iter()
                .map(|arg| match arg {
                    HostTypeShape::Named { name } => Ok(name.clone()),
                    _ => Err(format!(
                        "type arguments of `{name}` must be plain named types"
                    )),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(TypeExpr::required(TypeExprKind::Generic {
                name: name.clone(),
                args,
            }))
        }
        HostTypeShape::Union { members } => {
            let mut rest = Vec::new();
            let mut has_null = false;
            flatten_union(members, &mut rest, &mut has_null);

            match rest.as_slice() {
                [] => Err("union has no non-null member".into()),
                [only] => {
                    let mut expr = normalize(only)?;
                    expr.nullable |= has_null;
                    Ok(expr)
                }
                many => Err(format!(
                    "unions of {} types are not supported; only `T | null` is",
                    many.len()
                )),
            }
        }
    }
}

fn flatten_union<'a>(
    members: &'a [HostTypeShape],
    rest: &mut Vec<&'a HostTypeShape>,
    has_null: &mut bool,
) {
    for member in members {
        match member {
            HostTypeShape::Null => *has_null = true,
            HostTypeShape::Union { members } => flatten_union(members, rest, has_null),
            other => rest.push(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::host::{HostArgument, HostParticipation};
    use crate::model::{DeclKind, RootKind};

    fn named(name: &str) -> HostTypeShape {
        HostTypeShape::named(name)
    }

    #[test]
    fn test_preserves_declaration_and_field_order() {
        let unit = HostUnit::new("blog")
            .with_declaration(
                HostDeclaration::object("Post")
                    .with_field(HostField::property("title", named("string")))
                    .with_field(HostField::property("body", named("string"))),
            )
            .with_declaration(HostDeclaration::enumeration("Status", ["DRAFT", "LIVE"]))
            .with_declaration(HostDeclaration::scalar("DateTime", "Date"));

        let model = extract(&unit).unwrap();
        let names: Vec<_> = model.iter().map(|(_, decl)| decl.name()).collect();
        assert_eq!(names, ["Post", "Status", "DateTime"]);

        let (_, post) = model.lookup("Post").unwrap();
        let fields: Vec<_> = post.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(fields, ["title", "body"]);
        assert_eq!(model.lookup("Status").unwrap().1.kind(), DeclKind::Enum);
    }

    #[test]
    fn test_union_with_null_is_nullable() {
        let expr = normalize(&HostTypeShape::nullable(named("string"))).unwrap();
        assert!(expr.nullable);
        assert_eq!(expr.kind, TypeExprKind::Named("string".into()));

        let nested = HostTypeShape::Union {
            members: vec![
                HostTypeShape::Null,
                HostTypeShape::nullable(named("User")),
            ],
        };
        let expr = normalize(&nested).unwrap();
        assert!(expr.nullable);
        assert_eq!(expr.kind, TypeExprKind::Named("User".into()));

        let required = normalize(&named("User")).unwrap();
        assert!(!required.nullable);
    }

    #[test]
    fn test_array_nullability_is_per_level() {
        let shape = HostTypeShape::nullable(HostTypeShape::array(HostTypeShape::nullable(named(
            "User",
        ))));
        let expr = normalize(&shape).unwrap();
        assert!(expr.nullable);
        assert_eq!(expr.list_depth(), 1);
        let TypeExprKind::List(element) = &expr.kind else {
            panic!("expected list");
        };
        assert!(element.nullable);
    }

    #[test]
    fn test_rejects_multi_member_union() {
        let shape = HostTypeShape::Union {
            members: vec![named("A"), named("B"), HostTypeShape::Null],
        };
        assert!(normalize(&shape).is_err());
        assert!(normalize(&HostTypeShape::Null).is_err());
    }

    #[test]
    fn test_skips_non_participating_and_honors_table() {
        let unit = HostUnit::new("u")
            .with_declaration(
                HostDeclaration::object("Hidden")
                    .opted_out()
                    .with_field(HostField::property("x", named("string"))),
            )
            .with_declaration(HostDeclaration::enumeration("Role", ["ADMIN"]).opted_out())
            .with_participation(
                "Role",
                HostParticipation {
                    participates: true,
                    tag: None,
                },
            );

        let model = extract(&unit).unwrap();
        assert!(model.lookup("Hidden").is_none());
        assert!(model.lookup("Role").is_some());
    }

    #[test]
    fn test_defaults_member_and_tag() {
        let unit = HostUnit::new("u").with_declaration(
            HostDeclaration::object("Stats")
                .with_tag("Int")
                .with_field(HostField::property("viewCount", named("number")))
                .with_field(HostField::property("ratio", named("number")).with_tag("Float"))
                .with_field(
                    HostField::accessor("top", named("string"))
                        .with_arg(HostArgument::new("limit", named("number"))),
                ),
        );

        let model = extract(&unit).unwrap();
        let fields = model.lookup("Stats").unwrap().1.fields();
        assert_eq!(fields[0].member, "view_count");
        assert_eq!(fields[0].tag.as_deref(), Some("Int"));
        assert!(fields[0].tag_inherited);
        assert_eq!(fields[1].tag.as_deref(), Some("Float"));
        assert!(!fields[1].tag_inherited);
        assert_eq!(fields[2].args[0].tag.as_deref(), Some("Int"));
        assert!(fields[2].is_callable());
        assert_eq!(fields[2].access, AccessKind::Accessor);
    }

    #[test]
    fn test_rejects_members_without_rust_form() {
        let object = |field: HostField| {
            HostUnit::new("u").with_declaration(HostDeclaration::object("Node").with_field(field))
        };

        let err = extract(&object(HostField::property("self", named("ID")))).unwrap_err();
        assert!(
            matches!(err, SchemaError::Extraction { field: Some(ref f), .. } if f == "self")
        );
        for member in ["super", "crate", "Self", "_", "parent-id"] {
            let field = HostField::property("link", named("ID")).with_member(member);
            assert!(extract(&object(field)).is_err(), "{member} should be rejected");
        }

        let renamed = HostField::property("self", named("ID")).with_member("self_link");
        let model = extract(&object(renamed)).unwrap();
        assert_eq!(model.lookup("Node").unwrap().1.fields()[0].member, "self_link");
    }

    #[test]
    fn test_generic_requires_single_used_parameter() {
        let mut two = HostDeclaration::generic("Pair", "A")
            .with_field(HostField::property("first", named("A")));
        two.type_params.push("B".into());
        let err = extract(&HostUnit::new("u").with_declaration(two)).unwrap_err();
        assert!(matches!(err, SchemaError::Extraction { ref declaration, .. } if declaration == "Pair"));

        let unused = HostDeclaration::generic("Box", "T")
            .with_field(HostField::property("label", named("string")));
        assert!(extract(&HostUnit::new("u").with_declaration(unused)).is_err());

        let used_via_application = HostDeclaration::generic("Connection", "Node").with_field(
            HostField::property(
                "edges",
                HostTypeShape::array(HostTypeShape::generic("Edge", [named("Node")])),
            ),
        );
        assert!(extract(&HostUnit::new("u").with_declaration(used_via_application)).is_ok());
    }

    #[test]
    fn test_shape_errors() {
        let empty = HostDeclaration::object("Empty");
        assert!(extract(&HostUnit::new("u").with_declaration(empty)).is_err());

        let no_values = HostDeclaration::enumeration("Nothing", Vec::<String>::new());
        assert!(extract(&HostUnit::new("u").with_declaration(no_values)).is_err());

        let mut scalar = HostDeclaration::scalar("Blob", "");
        scalar.internal_type = None;
        assert!(extract(&HostUnit::new("u").with_declaration(scalar)).is_err());

        let dup = HostDeclaration::object("User")
            .with_field(HostField::property("id", named("ID")))
            .with_field(HostField::property("id", named("ID")));
        let err = extract(&HostUnit::new("u").with_declaration(dup)).unwrap_err();
        assert!(
            matches!(err, SchemaError::Extraction { field: Some(ref f), .. } if f == "id")
        );

        let bad_arg = HostDeclaration::object("User").with_field(HostField::property(
            "friends",
            HostTypeShape::generic("Connection", [HostTypeShape::array(named("User"))]),
        ));
        assert!(extract(&HostUnit::new("u").with_declaration(bad_arg)).is_err());
    }

    #[test]
    fn test_single_entry_point_per_kind() {
        let query = |name: &str| {
            HostDeclaration::object(name)
                .as_root(RootKind::Query)
                .with_field(HostField::accessor("ping", named("boolean")))
        };
        let unit = HostUnit::new("u")
            .with_declaration(query("Query"))
            .with_declaration(query("OtherQuery"));
        let err = extract(&unit).unwrap_err();
        assert!(matches!(err, SchemaError::Extraction { ref declaration, .. } if declaration == "OtherQuery"));
    }

    #[test]
    fn test_mutation_needs_query() {
        let root = |name: &str, kind: RootKind| {
            HostDeclaration::object(name)
                .as_root(kind)
                .with_field(HostField::accessor("ping", named("boolean")))
        };

        let unit = HostUnit::new("u").with_declaration(root("Mutation", RootKind::Mutation));
        let err = extract(&unit).unwrap_err();
        assert!(matches!(err, SchemaError::Extraction { ref declaration, .. } if declaration == "Mutation"));

        let unit = HostUnit::new("u")
            .with_declaration(root("Mutation", RootKind::Mutation))
            .with_declaration(root("Query", RootKind::Query));
        assert!(extract(&unit).is_ok());
    }

    #[test]
    fn test_duplicate_declaration_names() {
        let unit = HostUnit::new("u")
            .with_declaration(HostDeclaration::enumeration("Role", ["A"]))
            .with_declaration(HostDeclaration::scalar("Role", "RoleName"));
        let err = extract(&unit).unwrap_err();
        assert_eq!(err.declaration(), Some("Role"));
    }
}
