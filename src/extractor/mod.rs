//! Route descriptors and their extraction from a host route table.
//!
//! A [`Route`] is the normalized view of one endpoint that every later stage
//! consumes: the model graph builder walks its [`Route::return_types`] and the
//! handler emitter renders it into a client method.
//!
//! # Example
//!
//! ```no_run
//! use fastroutes::extractor::route_table::RouteTableExtractor;
//! use fastroutes::manifest::ManifestLoader;
//! use fastroutes::type_resolver::TypeResolver;
//! use std::path::Path;
//!
//! let table = ManifestLoader::load(Path::new("routes.yaml")).unwrap();
//! let resolver = TypeResolver::new(&table.models).unwrap();
//! let routes = RouteTableExtractor::extract_routes(&table.routes, &resolver, &table.exclude).unwrap();
//! println!("Found {} routes", routes.len());
//! ```

pub mod route_table;

use crate::type_resolver::{ModelRef, ModelSchema, TypeResolver, TypeShape};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::hash::{Hash, Hasher};

/// HTTP methods a generated handler can dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// HTTP GET method
    Get,
    /// HTTP POST method
    Post,
    /// HTTP PUT method
    Put,
    /// HTTP DELETE method
    Delete,
    /// HTTP PATCH method
    Patch,
    /// HTTP OPTIONS method
    Options,
    /// HTTP HEAD method
    Head,
}

/// Order in which a method is picked when a route accepts several.
pub const METHOD_PRIORITY: [HttpMethod; 7] = [
    HttpMethod::Get,
    HttpMethod::Post,
    HttpMethod::Delete,
    HttpMethod::Put,
    HttpMethod::Patch,
    HttpMethod::Head,
    HttpMethod::Options,
];

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
        }
    }

    /// Picks the highest-priority supported method out of a route's method set.
    ///
    /// Method names are matched case-insensitively. Returns `None` when the set
    /// contains none of the supported methods.
    pub fn select<S: AsRef<str>>(methods: &[S]) -> Option<HttpMethod> {
        METHOD_PRIORITY.iter().copied().find(|candidate| {
            methods
                .iter()
                .any(|m| m.as_ref().eq_ignore_ascii_case(candidate.as_str()))
        })
    }
}

/// Default value of a parameter or field.
///
/// `Undefined` means the host declared no default at all, which is distinct
/// from an explicit `None` default (`Value(Null)`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DefaultValue {
    #[default]
    Undefined,
    Value(serde_json::Value),
}

impl DefaultValue {
    pub fn is_undefined(&self) -> bool {
        matches!(self, DefaultValue::Undefined)
    }

    pub fn is_defined(&self) -> bool {
        !self.is_undefined()
    }
}

impl<'de> Deserialize<'de> for DefaultValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(DefaultValue::Value)
    }
}

impl Serialize for DefaultValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DefaultValue::Undefined => serializer.serialize_unit(),
            DefaultValue::Value(value) => value.serialize(serializer),
        }
    }
}

/// One call argument of a generated handler.
///
/// Equality compares all four fields while hashing skips `default`: two
/// parameters differing only in their default are unequal but share a hash
/// bucket. Equal parameters always hash equally, so hashed collections stay
/// correct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub alias: String,
    pub shape: TypeShape,
    pub required: bool,
    pub default: DefaultValue,
}

impl Hash for Parameter {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.alias.hash(state);
        self.shape.hash(state);
        self.required.hash(state);
    }
}

impl Parameter {
    pub fn new(alias: impl Into<String>, shape: TypeShape, required: bool, default: DefaultValue) -> Self {
        Self {
            alias: alias.into(),
            shape,
            required,
            default,
        }
    }

    /// Python identifier the parameter is bound to in the handler
    pub fn variable(&self) -> String {
        crate::python::identifier(&self.alias)
    }

    /// Signature fragment, `alias: type` or `alias: type = default`
    pub fn render(&self) -> String {
        match &self.default {
            DefaultValue::Undefined => format!("{}: {}", self.variable(), self.shape.render()),
            DefaultValue::Value(value) => format!(
                "{}: {} = {}",
                self.variable(),
                self.shape.render(),
                crate::python::value_literal(value)
            ),
        }
    }
}

/// Normalized description of one endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// Position in the host route table
    pub index: usize,
    pub name: String,
    pub method: HttpMethod,
    pub path: String,
    pub description: String,
    /// Request body model
    pub body: Option<ModelRef>,
    pub path_parameters: Vec<Parameter>,
    pub query_parameters: Vec<Parameter>,
    pub response: TypeShape,
}

impl Route {
    /// Every type this route touches: body, parameters, then response
    pub fn return_types(&self) -> Vec<TypeShape> {
        let mut types = Vec::with_capacity(self.path_parameters.len() + self.query_parameters.len() + 2);
        if let Some(body) = &self.body {
            types.push(TypeShape::Model(body.clone()));
        }
        types.extend(self.path_parameters.iter().map(|p| p.shape.clone()));
        types.extend(self.query_parameters.iter().map(|p| p.shape.clone()));
        types.push(self.response.clone());
        types
    }

    /// Fields of the body model, inherited ones included, as call arguments
    ///
    /// Fields come root-most ancestor first; a redefined field keeps the
    /// position of its first declaration and takes the latest definition.
    pub fn body_parameters(&self, resolver: &TypeResolver) -> Vec<Parameter> {
        let Some(body) = &self.body else {
            return Vec::new();
        };

        let mut chain: Vec<&ModelSchema> = Vec::new();
        let mut current = resolver.schema(body);
        while let Some(schema) = current {
            if chain.iter().any(|s| s.reference == schema.reference) {
                break;
            }
            chain.push(schema);
            current = schema.parent.as_ref().and_then(|p| resolver.schema(p));
        }

        let mut parameters: Vec<Parameter> = Vec::new();
        for schema in chain.into_iter().rev() {
            for field in &schema.fields {
                let parameter = Parameter::new(
                    field.name.clone(),
                    field.shape.clone(),
                    field.default.is_undefined(),
                    field.default.clone(),
                );
                match parameters.iter_mut().find(|p| p.alias == field.name) {
                    Some(existing) => *existing = parameter,
                    None => parameters.push(parameter),
                }
            }
        }
        parameters
    }

    /// Return annotation of the generated handler
    pub fn response_signature(&self) -> String {
        self.response.render()
    }
}
