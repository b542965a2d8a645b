//! Parameter schemas for function declarations.
//!
//! A [`Schema`] is a closed, recursive description of a value: a primitive
//! [`SchemaType`], an optional description, and for objects an ordered set of
//! named properties plus the subset of names that are required. The
//! serialized form matches what the live session expects inside a
//! `functionDeclarations` entry.

use serde::Serialize;
use serde::ser::SerializeMap;

/// Primitive kind of a schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SchemaType {
    String,
    Number,
    Boolean,
    Object,
    Array,
}

/// Inconsistencies detected by [`Schema::validate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("required property `{0}` is not declared")]
    UnknownRequired(String),

    #[error("property `{0}` is declared more than once")]
    DuplicateProperty(String),

    #[error("{kind:?} schema cannot declare properties or required names")]
    PropertiesOnNonObject { kind: SchemaType },

    #[error("array schema has no item schema")]
    MissingItems,

    #[error("in property `{name}`: {source}")]
    Nested {
        name: String,
        #[source]
        source: Box<SchemaError>,
    },
}

/// A schema node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    #[serde(rename = "type")]
    kind: SchemaType,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "serialize_properties"
    )]
    properties: Vec<(String, Schema)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    items: Option<Box<Schema>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    required: Vec<String>,
}

impl Schema {
    fn leaf(kind: SchemaType) -> Self {
        Self {
            kind,
            description: None,
            properties: Vec::new(),
            items: None,
            required: Vec::new(),
        }
    }

    pub fn string() -> Self {
        Self::leaf(SchemaType::String)
    }

    pub fn number() -> Self {
        Self::leaf(SchemaType::Number)
    }

    pub fn boolean() -> Self {
        Self::leaf(SchemaType::Boolean)
    }

    /// An array whose elements follow `items`.
    pub fn array(items: Schema) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::leaf(SchemaType::Array)
        }
    }

    /// An object with properties in declaration order.
    pub fn object<N, R>(properties: Vec<(N, Schema)>, required: R) -> Self
    where
        N: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            properties: properties
                .into_iter()
                .map(|(name, schema)| (name.into(), schema))
                .collect(),
            required: required.into_iter().map(Into::into).collect(),
            ..Self::leaf(SchemaType::Object)
        }
    }

    /// Attach a human-readable description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn kind(&self) -> SchemaType {
        self.kind
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Look up a property schema by name.
    pub fn property(&self, name: &str) -> Option<&Schema> {
        self.properties
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, schema)| schema)
    }

    /// Property names in declaration order.
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(|(n, _)| n.as_str())
    }

    pub fn required(&self) -> &[String] {
        &self.required
    }

    pub fn items(&self) -> Option<&Schema> {
        self.items.as_deref()
    }

    /// Check structural consistency, recursing into nested schemas.
    ///
    /// # Errors
    ///
    /// Returns the first [`SchemaError`] found.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.kind != SchemaType::Object
            && (!self.properties.is_empty() || !self.required.is_empty())
        {
            return Err(SchemaError::PropertiesOnNonObject { kind: self.kind });
        }

        for (i, (name, _)) in self.properties.iter().enumerate() {
            if self.properties[..i].iter().any(|(n, _)| n == name) {
                return Err(SchemaError::DuplicateProperty(name.clone()));
            }
        }

        if let Some(missing) = self
            .required
            .iter()
            .find(|r| self.property(r.as_str()).is_none())
        {
            return Err(SchemaError::UnknownRequired(missing.clone()));
        }

        match (&self.kind, &self.items) {
            (SchemaType::Array, None) => return Err(SchemaError::MissingItems),
            (_, Some(items)) => items.validate().map_err(|e| SchemaError::Nested {
                name: "[]".to_owned(),
                source: Box::new(e),
            })?,
            _ => {}
        }

        for (name, schema) in &self.properties {
            schema.validate().map_err(|e| SchemaError::Nested {
                name: name.clone(),
                source: Box::new(e),
            })?;
        }
        Ok(())
    }
}

fn serialize_properties<S>(properties: &[(String, Schema)], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let mut map = serializer.serialize_map(Some(properties.len()))?;
    for (name, schema) in properties {
        map.serialize_entry(name, schema)?;
    }
    map.end()
}
