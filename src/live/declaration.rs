//! Function declarations registered with the live session.
//!
//! A [`FunctionDeclaration`] is the callable contract the model sees: a name
//! (also the key used to match incoming invocations), a description, and a
//! parameter [`Schema`]. The declarations shipped here are built once per
//! process and never mutated.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use super::schema::{Schema, SchemaError};

/// Argument key carrying the serialized chart specification.
pub const CHART_FIELD: &str = "json_graph";

/// A named, schema-described callable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDeclaration {
    name: String,
    description: String,
    parameters: Schema,
}

impl FunctionDeclaration {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Schema) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn parameters(&self) -> &Schema {
        &self.parameters
    }

    /// Validate the parameter schema.
    ///
    /// # Errors
    ///
    /// Returns the schema inconsistency, if any.
    pub fn validate(&self) -> Result<(), SchemaError> {
        self.parameters.validate()
    }
}

static CHECK_PROCEDURE_ALIGNMENT: LazyLock<FunctionDeclaration> = LazyLock::new(|| {
    FunctionDeclaration::new(
        "checkProcedureAlignment",
        "Based on the video procedure and user's stream input, determine if the user is \
         following the correct order based on a given image and conversation context.",
        Schema::object(
            vec![
                (
                    "realityImageDescription",
                    Schema::string()
                        .with_description("A brief description of the current reality image."),
                ),
                (
                    "personNumber",
                    Schema::number().with_description("The number of people in the image."),
                ),
            ],
            ["realityImageDescription", "personNumber"],
        ),
    )
});

static RENDER_ALTAIR: LazyLock<FunctionDeclaration> = LazyLock::new(|| {
    FunctionDeclaration::new(
        "render_altair",
        "Displays an altair graph in json format.",
        Schema::object(
            vec![(
                CHART_FIELD,
                Schema::string().with_description(
                    "JSON STRING representation of the graph to render. \
                     Must be a string, not a json object",
                ),
            )],
            [CHART_FIELD],
        ),
    )
});

/// Procedure-alignment check driven by the live video stream.
pub fn check_procedure_alignment() -> &'static FunctionDeclaration {
    &CHECK_PROCEDURE_ALIGNMENT
}

/// Plain chart rendering callable.
pub fn render_altair() -> &'static FunctionDeclaration {
    &RENDER_ALTAIR
}

/// Which declaration a session registers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartTool {
    #[default]
    CheckProcedureAlignment,
    RenderAltair,
}

impl ChartTool {
    pub fn declaration(self) -> &'static FunctionDeclaration {
        match self {
            Self::CheckProcedureAlignment => check_procedure_alignment(),
            Self::RenderAltair => render_altair(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::live::schema::SchemaType;

    #[test]
    fn procedure_alignment_has_two_required_fields() {
        let decl = check_procedure_alignment();
        assert_eq!(decl.name(), "checkProcedureAlignment");
        assert!(decl.validate().is_ok());

        let params = decl.parameters();
        assert_eq!(params.kind(), SchemaType::Object);
        assert_eq!(
            params.required(),
            ["realityImageDescription", "personNumber"]
        );
        assert_eq!(
            params.property("realityImageDescription").map(Schema::kind),
            Some(SchemaType::String)
        );
        assert_eq!(
            params.property("personNumber").map(Schema::kind),
            Some(SchemaType::Number)
        );
    }

    #[test]
    fn render_altair_declares_chart_field() {
        let decl = render_altair();
        assert!(decl.validate().is_ok());
        assert_eq!(decl.parameters().required(), [CHART_FIELD]);
    }

    #[test]
    fn statics_are_built_once() {
        assert!(std::ptr::eq(
            check_procedure_alignment(),
            check_procedure_alignment()
        ));
    }

    #[test]
    fn chart_tool_selects_declaration() {
        assert_eq!(
            ChartTool::default().declaration().name(),
            "checkProcedureAlignment"
        );
        assert_eq!(ChartTool::RenderAltair.declaration().name(), "render_altair");
    }

    #[test]
    fn serializes_with_parameters_key() {
        let json = serde_json::to_value(render_altair()).unwrap();
        assert_eq!(json["name"], "render_altair");
        assert_eq!(json["parameters"]["type"], "OBJECT");
        assert_eq!(
            json["parameters"]["properties"][CHART_FIELD]["type"],
            "STRING"
        );
    }
}
