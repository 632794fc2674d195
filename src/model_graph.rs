//! Model Dependency Graph Builder.
//!
//! Finds every model a set of routes touches (through bodies, parameters,
//! responses, nested fields and ancestors) and orders their class definitions
//! so that each one can be evaluated top to bottom.

use crate::extractor::{DefaultValue, Route};
use crate::python;
use crate::type_resolver::{ModelRef, ModelSchema, TypeResolver, TypeShape};
use log::{debug, warn};
use std::collections::{HashMap, HashSet};

/// Class every root model derives from in emitted code
pub const BASE_MODEL: &str = "BaseModel";

/// A synthesized model definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    /// Resolved, globally unique name
    pub name: String,
    /// Complete class definition
    pub code: String,
    /// Resolved name of the parent model, `None` for direct base-model subclasses
    pub parent_name: Option<String>,
}

/// Discovers and orders the models reachable from routes
pub struct ModelGraph<'a> {
    resolver: &'a TypeResolver,
    /// Discovered models by resolved name
    nodes: HashMap<String, &'a ModelSchema>,
    /// Resolved names in discovery order
    discovered: Vec<String>,
}

impl<'a> ModelGraph<'a> {
    pub fn new(resolver: &'a TypeResolver) -> Self {
        debug!("Initializing ModelGraph");
        Self {
            resolver,
            nodes: HashMap::new(),
            discovered: Vec::new(),
        }
    }

    /// Builds the graph for a list of routes
    pub fn from_routes(resolver: &'a TypeResolver, routes: &[Route]) -> Self {
        let mut graph = Self::new(resolver);
        for route in routes {
            graph.add_route(route);
        }
        graph
    }

    /// Adds every model reachable from a route's types
    pub fn add_route(&mut self, route: &Route) {
        debug!("Discovering models for route: {}", route.name);
        for shape in route.return_types() {
            self.add_shape(&shape);
        }
    }

    /// Adds every model referenced by a shape
    pub fn add_shape(&mut self, shape: &TypeShape) {
        for model in shape.models() {
            self.add_model(model);
        }
    }

    /// Adds a model, its ancestors and the models its fields reference
    ///
    /// The first model seen under a resolved name wins; a different model that
    /// resolves to the same name is ignored with a warning.
    pub fn add_model(&mut self, reference: &ModelRef) {
        let name = reference.resolved_name();

        if let Some(existing) = self.nodes.get(&name) {
            if existing.reference != *reference {
                warn!(
                    "Models {} and {} both resolve to {}, keeping {}",
                    existing.reference.qualified(),
                    reference.qualified(),
                    name,
                    existing.reference.qualified()
                );
            }
            return;
        }

        let resolver = self.resolver;
        let Some(schema) = resolver.schema(reference) else {
            warn!("No definition for model {}", reference.qualified());
            return;
        };

        debug!("Discovered model: {}", name);
        self.nodes.insert(name.clone(), schema);

        if let Some(parent) = &schema.parent {
            self.add_model(parent);
        }
        self.discovered.push(name);

        for field in &schema.fields {
            self.add_shape(&field.shape);
        }
    }

    /// Number of distinct models discovered so far
    pub fn len(&self) -> usize {
        self.discovered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.discovered.is_empty()
    }

    /// Emission order of the discovered models, by resolved name.
    ///
    /// Walks the inheritance tree from the base model: at each level the direct
    /// children are emitted before any grandchild. Before a model is emitted its
    /// parent chain and the models its fields use are spliced in ahead of it.
    /// Models the walk never reaches (inheritance cycles) are emitted last in
    /// discovery order.
    pub fn emission_order(&self) -> Vec<String> {
        let mut children: HashMap<Option<String>, Vec<String>> = HashMap::new();
        for name in &self.discovered {
            children
                .entry(self.parent_name(name))
                .or_default()
                .push(name.clone());
        }

        let mut emitter = Emitter {
            graph: self,
            order: Vec::new(),
            emitted: HashSet::new(),
            in_progress: HashSet::new(),
        };
        emitter.walk(&children, &None);

        for name in &self.discovered {
            if !emitter.emitted.contains(name) {
                debug!("Model {} not reached from the base model", name);
                emitter.emit(name);
            }
        }

        emitter.order
    }

    /// Discovered models as ordered class definitions
    pub fn ordered_models(&self) -> Vec<Model> {
        let order = self.emission_order();
        let mut defined: HashSet<String> = HashSet::new();
        let mut models = Vec::with_capacity(order.len());

        for name in order {
            let schema = self.nodes[&name];
            defined.insert(name.clone());
            models.push(Model {
                code: self.render_model(&name, schema, &defined),
                parent_name: self.parent_name(&name),
                name,
            });
        }
        models
    }

    /// Resolved parent name, if the parent is part of the graph
    fn parent_name(&self, name: &str) -> Option<String> {
        self.nodes
            .get(name)
            .and_then(|schema| schema.parent.as_ref())
            .map(ModelRef::resolved_name)
            .filter(|parent| self.nodes.contains_key(parent))
    }

    /// Resolved names of the models a schema's fields reference
    fn field_dependencies(&self, schema: &ModelSchema) -> Vec<String> {
        let mut deps: Vec<String> = Vec::new();
        for field in &schema.fields {
            for model in field.shape.models() {
                let name = model.resolved_name();
                if self.nodes.contains_key(&name) && !deps.contains(&name) {
                    deps.push(name);
                }
            }
        }
        deps
    }

    /// Renders a class definition.
    ///
    /// Field references to models that are not yet defined (the model itself,
    /// or members of a reference cycle) are written as quoted forward
    /// references.
    fn render_model(&self, name: &str, schema: &ModelSchema, defined: &HashSet<String>) -> String {
        let base = self.parent_name(name).unwrap_or_else(|| BASE_MODEL.to_string());
        let mut code = format!("class {}({}):\n", name, base);

        if let Some(description) = schema.description.as_deref().filter(|d| !d.is_empty()) {
            code.push_str(&python::indent(&python::docstring(description), "    "));
            code.push('\n');
        }

        let model_name = |model: &ModelRef| {
            let resolved = model.resolved_name();
            if defined.contains(&resolved) && resolved != name {
                resolved
            } else {
                python::string_literal(&resolved)
            }
        };

        for field in &schema.fields {
            let annotation = field.shape.render_with(&model_name);
            code.push_str(&format!("    {}\n", Self::render_field(&field.name, &annotation, &field.default)));
        }

        if schema.fields.is_empty() && schema.description.as_deref().map_or(true, str::is_empty) {
            code.push_str("    pass\n");
        }

        code
    }
}

impl ModelGraph<'_> {
    /// `name: annotation[ = default]`
    ///
    /// A field whose wire name is not a usable identifier is renamed and keeps
    /// its wire name as the pydantic alias.
    fn render_field(name: &str, annotation: &str, default: &DefaultValue) -> String {
        let identifier = python::identifier(name);
        if identifier == name {
            return match default {
                DefaultValue::Undefined => format!("{}: {}", name, annotation),
                DefaultValue::Value(value) => {
                    format!("{}: {} = {}", name, annotation, python::value_literal(value))
                }
            };
        }

        let alias = python::string_literal(name);
        match default {
            DefaultValue::Undefined => format!("{}: {} = Field(alias={})", identifier, annotation, alias),
            DefaultValue::Value(value) => format!(
                "{}: {} = Field(default={}, alias={})",
                identifier,
                annotation,
                python::value_literal(value),
                alias
            ),
        }
    }
}

/// Depth-first emission state
struct Emitter<'g, 'a> {
    graph: &'g ModelGraph<'a>,
    order: Vec<String>,
    emitted: HashSet<String>,
    in_progress: HashSet<String>,
}

impl Emitter<'_, '_> {
    fn walk(&mut self, children: &HashMap<Option<String>, Vec<String>>, parent: &Option<String>) {
        let Some(kids) = children.get(parent) else {
            return;
        };
        for kid in kids {
            self.emit(kid);
        }
        for kid in kids {
            self.walk(children, &Some(kid.clone()));
        }
    }

    fn emit(&mut self, name: &str) {
        if self.emitted.contains(name) || self.in_progress.contains(name) {
            return;
        }
        let graph = self.graph;
        let Some(&schema) = graph.nodes.get(name) else {
            return;
        };
        self.in_progress.insert(name.to_string());

        if let Some(parent) = graph.parent_name(name) {
            if self.in_progress.contains(&parent) {
                warn!("Inheritance cycle through {} and {}", name, parent);
            }
            self.emit(&parent);
        }
        for dep in graph.field_dependencies(schema) {
            self.emit(&dep);
        }

        self.in_progress.remove(name);
        self.emitted.insert(name.to_string());
        self.order.push(name.to_string());
    }
}

/// Ordered model definitions for a set of routes
pub fn build_models(resolver: &TypeResolver, routes: &[Route]) -> Vec<Model> {
    let graph = ModelGraph::from_routes(resolver, routes);
    debug!("Discovered {} models", graph.len());
    graph.ordered_models()
}
