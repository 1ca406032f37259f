//! Schema Emitter.
//!
//! Serializes a resolved schema plus its resolver bindings into the unit's
//! artifacts:
//!
//! - `sdl` - the GraphQL schema document, parsed back before it is returned
//! - `rust` - `async-graphql` dynamic schema bindings
//!
//! Both artifacts share one [`TypeOrder`], so re-running a pass on the same
//! Source Model yields byte-identical output.

mod order;
mod rust;
mod sdl;

pub use order::{TypeOrder, cyclic_objects};
pub use rust::GENERATED_HEADER;

use tracing::debug;

use crate::config::CompilerConfig;
use crate::error::SchemaError;
use crate::model::SourceModel;
use crate::resolvers::Bindings;
use crate::schema::ResolvedSchema;

/// Artifacts of one unit. A `None` artifact was disabled in the configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmittedSchema {
    pub sdl: Option<String>,
    pub bindings: Option<String>,
}

pub struct Emitter<'a> {
    model: &'a SourceModel,
    schema: &'a ResolvedSchema,
    bindings: &'a Bindings,
    config: &'a CompilerConfig,
}

impl<'a> Emitter<'a> {
    pub fn new(
        model: &'a SourceModel,
        schema: &'a ResolvedSchema,
        bindings: &'a Bindings,
        config: &'a CompilerConfig,
    ) -> Self {
        Self {
            model,
            schema,
            bindings,
            config,
        }
    }

    pub fn emit(&self) -> Result<EmittedSchema, SchemaError> {
        let order = TypeOrder::of(self.schema);

        let sdl = if self.config.emit_sdl {
            Some(sdl::render(self.model, self.schema, &order)?)
        } else {
            None
        };
        let bindings = if self.config.emit_bindings {
            Some(rust::render(
                self.model,
                self.schema,
                self.bindings,
                &order,
                self.config,
            )?)
        } else {
            None
        };

        debug!(
            unit = %self.model.unit(),
            declared = order.declared.len(),
            instantiated = order.instantiated.len(),
            cyclic = order.cyclic.len(),
            "Emitted schema artifacts"
        );
        Ok(EmittedSchema { sdl, bindings })
    }
}
