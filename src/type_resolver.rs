use crate::error::{Error, Result};
use crate::extractor::DefaultValue;
use crate::manifest::ModelEntry;
use crate::naming::resolve_name;
use crate::python;
use log::{debug, warn};
use std::collections::HashMap;
use syn::punctuated::Punctuated;

/// Reference to a model type: its declaring module and simple name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelRef {
    /// Dotted module path (e.g. `app.models`)
    pub module: String,
    /// Simple class name
    pub name: String,
}

impl ModelRef {
    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
        }
    }

    /// Module-qualified name, `app.models.Item`
    pub fn qualified(&self) -> String {
        if self.module.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.module, self.name)
        }
    }

    /// Name used for this model in emitted code
    pub fn resolved_name(&self) -> String {
        resolve_name(self)
    }
}

/// Scalar types understood by the emitter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scalar {
    Int,
    Float,
    Str,
    Bool,
    DateTime,
    Email,
    Any,
}

impl Scalar {
    pub fn python_name(&self) -> &'static str {
        match self {
            Scalar::Int => "int",
            Scalar::Float => "float",
            Scalar::Str => "str",
            Scalar::Bool => "bool",
            Scalar::DateTime => "datetime",
            Scalar::Email => "EmailStr",
            Scalar::Any => "typing.Any",
        }
    }
}

/// One value of a literal enumeration
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LiteralValue {
    Str(String),
    Int(i64),
    Bool(bool),
}

impl LiteralValue {
    fn python_literal(&self) -> String {
        match self {
            LiteralValue::Str(s) => python::string_literal(s),
            LiteralValue::Int(i) => i.to_string(),
            LiteralValue::Bool(true) => "True".to_string(),
            LiteralValue::Bool(false) => "False".to_string(),
        }
    }
}

/// Closed classification of a parameter, field or response type.
///
/// Computed once when the route table is read, then consumed by both
/// signature rendering and response parsing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeShape {
    None,
    Scalar(Scalar),
    Literal(Vec<LiteralValue>),
    Model(ModelRef),
    List(Box<TypeShape>),
    Mapping(Box<TypeShape>, Box<TypeShape>),
    Optional(Box<TypeShape>),
}

impl TypeShape {
    /// Python annotation for this shape, with every model under its resolved name
    pub fn render(&self) -> String {
        self.render_with(&|model: &ModelRef| model.resolved_name())
    }

    /// Python annotation, naming each model through `model_name`
    pub fn render_with(&self, model_name: &dyn Fn(&ModelRef) -> String) -> String {
        match self {
            TypeShape::None => "None".to_string(),
            TypeShape::Scalar(scalar) => scalar.python_name().to_string(),
            TypeShape::Literal(values) => {
                let values: Vec<String> = values.iter().map(LiteralValue::python_literal).collect();
                format!("Literal[{}]", values.join(", "))
            }
            TypeShape::Model(model) => model_name(model),
            TypeShape::List(element) => format!("list[{}]", element.render_with(model_name)),
            TypeShape::Mapping(key, value) => format!(
                "dict[{},{}]",
                key.render_with(model_name),
                value.render_with(model_name)
            ),
            TypeShape::Optional(inner) => {
                let inner = inner.render_with(model_name);
                // A quoted forward reference is a plain string at runtime and has no `|`
                if inner.starts_with(|c: char| c == '\'' || c == '"') {
                    format!("Optional[{}]", inner)
                } else {
                    format!("{} | None", inner)
                }
            }
        }
    }

    /// Every model referenced anywhere in this shape, in first-seen order
    pub fn models(&self) -> Vec<&ModelRef> {
        let mut found = Vec::new();
        self.collect_models(&mut found);
        found
    }

    fn collect_models<'a>(&'a self, found: &mut Vec<&'a ModelRef>) {
        match self {
            TypeShape::Model(model) => {
                if !found.contains(&model) {
                    found.push(model);
                }
            }
            TypeShape::List(inner) | TypeShape::Optional(inner) => inner.collect_models(found),
            TypeShape::Mapping(key, value) => {
                key.collect_models(found);
                value.collect_models(found);
            }
            TypeShape::None | TypeShape::Scalar(_) | TypeShape::Literal(_) => {}
        }
    }

    pub fn is_datetime(&self) -> bool {
        matches!(self, TypeShape::Scalar(Scalar::DateTime))
    }
}

/// A model field with its parsed type
#[derive(Debug, Clone, PartialEq)]
pub struct ModelField {
    pub name: String,
    pub shape: TypeShape,
    pub default: DefaultValue,
}

/// Structured definition of one model type
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSchema {
    pub reference: ModelRef,
    /// Parent model, `None` when the model derives the base model directly
    pub parent: Option<ModelRef>,
    pub description: Option<String>,
    pub fields: Vec<ModelField>,
}

/// Type resolver - parses type expressions and looks up declared models
pub struct TypeResolver {
    /// Declared model references, in declaration order
    refs: Vec<ModelRef>,
    /// Index by module-qualified name
    by_qualified: HashMap<String, usize>,
    /// Index by simple name, possibly several models per name
    by_simple: HashMap<String, Vec<usize>>,
    /// Parsed schemas, parallel to `refs`
    schemas: Vec<ModelSchema>,
}

impl TypeResolver {
    /// Create a new TypeResolver from the route table's model declarations
    ///
    /// # Errors
    ///
    /// Returns an error if a field or parent type expression is invalid or
    /// names an undeclared model.
    pub fn new(entries: &[ModelEntry]) -> Result<Self> {
        debug!("Initializing TypeResolver with {} models", entries.len());

        let mut resolver = Self {
            refs: Vec::new(),
            by_qualified: HashMap::new(),
            by_simple: HashMap::new(),
            schemas: Vec::new(),
        };

        // First pass: register every model so that fields may reference any of them
        let mut declared = Vec::new();
        for entry in entries {
            let reference = ModelRef::new(entry.module.clone(), entry.name.clone());
            let qualified = reference.qualified();
            if resolver.by_qualified.contains_key(&qualified) {
                warn!("Model {} declared more than once, keeping the first", qualified);
                continue;
            }
            let index = resolver.refs.len();
            resolver.by_qualified.insert(qualified, index);
            resolver
                .by_simple
                .entry(reference.name.clone())
                .or_default()
                .push(index);
            resolver.refs.push(reference);
            declared.push(entry);
        }

        // Second pass: parse parents and fields
        let mut schemas = Vec::with_capacity(declared.len());
        for (index, entry) in declared.into_iter().enumerate() {
            schemas.push(resolver.parse_model_entry(&resolver.refs[index], entry)?);
        }
        resolver.schemas = schemas;

        Ok(resolver)
    }

    fn parse_model_entry(&self, reference: &ModelRef, entry: &ModelEntry) -> Result<ModelSchema> {
        debug!("Parsing model definition: {}", reference.qualified());

        let parent = entry
            .parent
            .as_deref()
            .map(|expr| self.resolve_model(expr))
            .transpose()?;

        let fields = entry
            .fields
            .iter()
            .map(|field| {
                Ok(ModelField {
                    name: field.name.clone(),
                    shape: self.resolve_type(&field.type_expr)?,
                    default: field.default.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!("Parsed {} fields", fields.len());

        Ok(ModelSchema {
            reference: reference.clone(),
            parent,
            description: entry.description.clone(),
            fields,
        })
    }

    /// All declared model schemas, in declaration order
    pub fn schemas(&self) -> &[ModelSchema] {
        &self.schemas
    }

    /// Find the schema of a declared model
    pub fn schema(&self, reference: &ModelRef) -> Option<&ModelSchema> {
        self.by_qualified
            .get(&reference.qualified())
            .map(|&index| &self.schemas[index])
    }

    /// Resolve a type expression into its shape
    ///
    /// # Errors
    ///
    /// Returns an error if the expression does not parse as a type or uses a
    /// form outside the supported shapes.
    pub fn resolve_type(&self, expr: &str) -> Result<TypeShape> {
        debug!("Resolving type: {}", expr);

        let ty: syn::Type = syn::parse_str(expr).map_err(|e| Error::InvalidType {
            expr: expr.to_string(),
            message: e.to_string(),
        })?;
        self.shape_from_type(&ty, expr)
    }

    /// Resolve a type expression that must name a declared model
    ///
    /// # Errors
    ///
    /// Returns an error if the expression is not a model reference.
    pub fn resolve_model(&self, expr: &str) -> Result<ModelRef> {
        match self.resolve_type(expr)? {
            TypeShape::Model(model) => Ok(model),
            other => Err(Error::InvalidType {
                expr: expr.to_string(),
                message: format!("expected a model, found {}", other.render()),
            }),
        }
    }

    fn shape_from_type(&self, ty: &syn::Type, expr: &str) -> Result<TypeShape> {
        match ty {
            syn::Type::Path(type_path) if type_path.qself.is_none() => {
                self.shape_from_path(&type_path.path, expr)
            }
            syn::Type::Tuple(tuple) if tuple.elems.is_empty() => Ok(TypeShape::None),
            syn::Type::Paren(paren) => self.shape_from_type(&paren.elem, expr),
            syn::Type::Group(group) => self.shape_from_type(&group.elem, expr),
            syn::Type::Reference(reference) => self.shape_from_type(&reference.elem, expr),
            syn::Type::Slice(slice) => Ok(TypeShape::List(Box::new(
                self.shape_from_type(&slice.elem, expr)?,
            ))),
            syn::Type::Macro(type_macro) if type_macro.mac.path.is_ident("Literal") => {
                Self::literal_from_macro(&type_macro.mac, expr)
            }
            _ => Err(Error::InvalidType {
                expr: expr.to_string(),
                message: "unsupported type form".to_string(),
            }),
        }
    }

    fn shape_from_path(&self, path: &syn::Path, expr: &str) -> Result<TypeShape> {
        let segment = path.segments.last().ok_or_else(|| Error::InvalidType {
            expr: expr.to_string(),
            message: "empty type path".to_string(),
        })?;
        let type_name = segment.ident.to_string();

        if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
            let generic_args: Vec<&syn::Type> = args
                .args
                .iter()
                .filter_map(|arg| match arg {
                    syn::GenericArgument::Type(inner) => Some(inner),
                    _ => None,
                })
                .collect();

            return match (type_name.as_str(), generic_args.as_slice()) {
                ("Option" | "Optional", [inner]) => Ok(TypeShape::Optional(Box::new(
                    self.shape_from_type(inner, expr)?,
                ))),
                ("Vec" | "VecDeque" | "list" | "List" | "HashSet" | "BTreeSet" | "set", [inner]) => {
                    Ok(TypeShape::List(Box::new(self.shape_from_type(inner, expr)?)))
                }
                ("HashMap" | "BTreeMap" | "IndexMap" | "dict" | "Dict", [key, value]) => {
                    Ok(TypeShape::Mapping(
                        Box::new(self.shape_from_type(key, expr)?),
                        Box::new(self.shape_from_type(value, expr)?),
                    ))
                }
                ("Box" | "Arc" | "Rc", [inner]) => self.shape_from_type(inner, expr),
                _ => Err(Error::InvalidType {
                    expr: expr.to_string(),
                    message: format!("unsupported generic type {}", type_name),
                }),
            };
        }

        if path.segments.len() == 1 {
            if type_name == "None" {
                return Ok(TypeShape::None);
            }
            if let Some(scalar) = Self::parse_primitive_type(&type_name) {
                return Ok(TypeShape::Scalar(scalar));
            }
        }

        self.lookup_model(path).map(TypeShape::Model)
    }

    fn lookup_model(&self, path: &syn::Path) -> Result<ModelRef> {
        let segments: Vec<String> = path.segments.iter().map(|s| s.ident.to_string()).collect();
        let qualified = segments.join(".");

        if let Some(&index) = self.by_qualified.get(&qualified) {
            return Ok(self.refs[index].clone());
        }

        if segments.len() == 1 {
            if let Some(candidates) = self.by_simple.get(&qualified) {
                return match candidates.as_slice() {
                    [index] => Ok(self.refs[*index].clone()),
                    _ => Err(Error::AmbiguousModel {
                        name: qualified,
                        candidates: candidates
                            .iter()
                            .map(|&i| self.refs[i].qualified())
                            .collect(),
                    }),
                };
            }
        }

        Err(Error::UnknownModel(qualified))
    }

    fn literal_from_macro(mac: &syn::Macro, expr: &str) -> Result<TypeShape> {
        let invalid = |message: String| Error::InvalidType {
            expr: expr.to_string(),
            message,
        };

        let lits = mac
            .parse_body_with(Punctuated::<syn::Lit, syn::Token![,]>::parse_terminated)
            .map_err(|e| invalid(e.to_string()))?;

        let values = lits
            .iter()
            .map(|lit| match lit {
                syn::Lit::Str(s) => Ok(LiteralValue::Str(s.value())),
                syn::Lit::Int(i) => i
                    .base10_parse::<i64>()
                    .map(LiteralValue::Int)
                    .map_err(|e| invalid(e.to_string())),
                syn::Lit::Bool(b) => Ok(LiteralValue::Bool(b.value)),
                _ => Err(invalid("literal values must be strings, integers or booleans".to_string())),
            })
            .collect::<Result<Vec<_>>>()?;

        if values.is_empty() {
            return Err(invalid("empty literal enumeration".to_string()));
        }
        Ok(TypeShape::Literal(values))
    }

    /// Parse a primitive type name, accepting Rust and Python spellings
    fn parse_primitive_type(type_name: &str) -> Option<Scalar> {
        match type_name {
            "String" | "str" | "char" | "Uuid" | "uuid" => Some(Scalar::Str),
            "i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8" | "u16" | "u32" | "u64"
            | "u128" | "usize" | "int" => Some(Scalar::Int),
            "f32" | "f64" | "float" => Some(Scalar::Float),
            "bool" => Some(Scalar::Bool),
            "DateTime" | "NaiveDateTime" | "datetime" => Some(Scalar::DateTime),
            "EmailStr" => Some(Scalar::Email),
            "Any" | "Value" => Some(Scalar::Any),
            _ => None,
        }
    }
}
