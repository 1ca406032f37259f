//! Emitted bindings must be well-formed Rust for every kind of input.

use gqlforge_schema::model::RootKind;
use gqlforge_schema::model::host::{
    HostArgument, HostDeclaration, HostField, HostTypeShape, HostUnit,
};
use gqlforge_schema::{CompilerConfig, ErrorCategory, SchemaError, compile_unit};

fn named(name: &str) -> HostTypeShape {
    HostTypeShape::named(name)
}

fn nullable(shape: HostTypeShape) -> HostTypeShape {
    HostTypeShape::nullable(shape)
}

fn bindings(unit: &HostUnit) -> String {
    compile_unit(unit, &CompilerConfig::default())
        .unwrap()
        .bindings
        .unwrap()
}

fn assert_parses(unit: &HostUnit) -> String {
    let source = bindings(unit);
    if let Err(err) = syn::parse_file(&source) {
        panic!("bindings of `{}` do not parse: {err}\n{source}", unit.name);
    }
    source
}

fn accounts() -> HostUnit {
    HostUnit::new("accounts")
        .with_declaration(
            HostDeclaration::object("Query").as_root(RootKind::Query).with_field(
                HostField::accessor("user", nullable(named("User")))
                    .with_arg(HostArgument::new("id", named("ID"))),
            ),
        )
        .with_declaration(
            HostDeclaration::object("User")
                .with_description("A registered \"account\".\nSee `groups`.")
                .with_field(HostField::property("firstName", nullable(named("string"))))
                .with_field(HostField::property("lastName", nullable(named("string"))))
                .with_field(HostField::accessor("fullName", nullable(named("string"))))
                .with_field(HostField::accessor("group", named("UserGroup")).deferred()),
        )
        .with_declaration(
            HostDeclaration::object("UserGroup")
                .with_field(HostField::property("name", named("string")))
                .with_field(
                    HostField::property("members", HostTypeShape::array(named("User")))
                        .deprecated("Use `roster` instead."),
                ),
        )
}

fn social() -> HostUnit {
    let connection_of = |argument: &str| HostTypeShape::generic("Connection", [named(argument)]);
    HostUnit::new("social")
        .with_declaration(
            HostDeclaration::object("Query")
                .as_root(RootKind::Query)
                .with_field(HostField::accessor("users", connection_of("User")).deferred())
                .with_field(HostField::accessor("tags", connection_of("string"))),
        )
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
                ))
                .with_field(
                    HostField::accessor("page", HostTypeShape::array(nullable(named("Node"))))
                        .with_arg(HostArgument::new("convert", named("number")).with_tag("Int"))
                        .with_arg(HostArgument::new("argument", nullable(named("string")))),
                ),
        )
        .with_declaration(
            HostDeclaration::object("User")
                .with_field(HostField::property("name", named("string")))
                .with_field(HostField::property("friends", connection_of("User"))),
        )
}

fn arguments() -> HostUnit {
    HostUnit::new("folders")
        .with_declaration(HostDeclaration::enumeration("Sort", ["NAME", "SIZE"]))
        .with_declaration(
            HostDeclaration::scalar("DateTime", "Date").with_description("ISO-8601 timestamp"),
        )
        .with_declaration(
            HostDeclaration::object("Query").as_root(RootKind::Query).with_field(
                HostField::accessor("folder", nullable(named("Folder")))
                    .deferred()
                    .with_arg(HostArgument::new("ctx", named("ID"))),
            ),
        )
        .with_declaration(
            HostDeclaration::object("Folder")
                .with_field(HostField::property("type", named("string")))
                .with_field(HostField::property("self", named("ID")).with_member("self_id"))
                .with_field(
                    HostField::accessor("children", HostTypeShape::array(named("Folder")))
                        .with_arg(HostArgument::new("parent", named("ID")))
                        .with_arg(HostArgument::new("value", nullable(named("Sort"))))
                        .with_arg(HostArgument::new(
                            "since",
                            nullable(HostTypeShape::array(nullable(named("Date")))),
                        ))
                        .with_arg(HostArgument::new("limit", named("number")).with_tag("Int"))
                        .with_arg(HostArgument::new("weight", named("number")).with_tag("Float"))
                        .with_arg(HostArgument::new("hidden", named("boolean"))),
                )
                .with_field(HostField::accessor("modified", nullable(named("Date")))),
        )
}

#[test]
fn test_accounts_bindings_parse() {
    let source = assert_parses(&accounts());
    assert!(source.contains("fn user_fields() -> Vec<Field>"));
}

#[test]
fn test_generic_bindings_parse() {
    let source = assert_parses(&social());
    assert!(source.contains(".register(edge_object::<String>(\"String\", |v: String| FieldValue::value(v)))"));
    assert!(source.contains("let arg_convert = ctx.args.try_get(\"convert\")"));
    assert!(source.contains("let value = parent.page(arg_convert, arg_argument);"));
}

#[test]
fn test_argument_heavy_bindings_parse() {
    let source = assert_parses(&arguments());
    assert!(source.contains("let parent = ctx.data::<Query>()?;"));
    assert!(source.contains("let value = parent.folder(arg_ctx).await;"));
    assert!(source.contains("let value = parent.children(arg_parent, arg_value, arg_since, arg_limit, arg_weight, arg_hidden);"));
    assert!(source.contains("let value = parent.r#type.clone();"));
    assert!(source.contains("let value = parent.self_id.clone();"));
}

#[test]
fn test_unit_name_stays_in_comment() {
    let mut unit = accounts();
    unit.name = "accounts\nfn broken(".to_string();
    let source = assert_parses(&unit);
    assert!(source.contains("// Unit: accounts\\nfn broken(\n"));
}

#[test]
fn test_colliding_function_names_fail_the_pass() {
    let unit = HostUnit::new("groups")
        .with_declaration(
            HostDeclaration::object("UserGroup").with_field(HostField::property("name", named("string"))),
        )
        .with_declaration(
            HostDeclaration::object("User_Group").with_field(HostField::property("name", named("string"))),
        );

    let err = compile_unit(&unit, &CompilerConfig::default()).unwrap_err();
    assert_eq!(err.source.category(), ErrorCategory::Emission);
    assert!(matches!(
        err.source,
        SchemaError::Emit(ref message)
            if message.contains("`UserGroup`") && message.contains("`User_Group`") && message.contains("user_group_object")
    ));

    let sdl_only = CompilerConfig {
        emit_bindings: false,
        ..Default::default()
    };
    assert!(compile_unit(&unit, &sdl_only).is_ok());
}

#[test]
fn test_shadowing_type_names_fail_the_pass() {
    let unit = HostUnit::new("values")
        .with_declaration(HostDeclaration::enumeration("Value", ["LOW", "HIGH"]))
        .with_declaration(
            HostDeclaration::object("Reading").with_field(HostField::property("level", named("Value"))),
        );
    let err = compile_unit(&unit, &CompilerConfig::default()).unwrap_err();
    assert!(matches!(err.source, SchemaError::Emit(ref message) if message.contains("`Value`")));

    let unit = HostUnit::new("boxes").with_declaration(
        HostDeclaration::generic("Crate", "Object")
            .with_field(HostField::property("item", named("Object"))),
    );
    let err = compile_unit(&unit, &CompilerConfig::default()).unwrap_err();
    assert!(matches!(err.source, SchemaError::Emit(ref message) if message.contains("`Object`")));
}
