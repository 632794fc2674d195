use crate::extractor::{Parameter, Route};
use crate::python;
use crate::type_resolver::{Scalar, TypeResolver, TypeShape};
use log::debug;
use std::collections::HashSet;

/// Handler emitter - renders route descriptors into async client methods
pub struct HandlerEmitter<'a> {
    /// Type resolver, needed to expand request bodies into call arguments
    resolver: &'a TypeResolver,
}

impl<'a> HandlerEmitter<'a> {
    pub fn new(resolver: &'a TypeResolver) -> Self {
        Self { resolver }
    }

    /// Renders one route as an unindented `async def` method.
    pub fn render(&self, route: &Route) -> String {
        debug!("Rendering handler: {} {} -> {}", route.method.as_str(), route.path, route.name);

        let body_parameters = route.body_parameters(self.resolver);
        let mut lines = vec![Self::signature(route, &body_parameters)];

        if !route.description.is_empty() {
            lines.push(python::indent(&python::docstring(&route.description), "    "));
        }

        lines.push(format!("    url = {}", Self::url_expression(route)));
        lines.push(format!("    params = {}", Self::mapping_literal(&route.query_parameters, false)));
        lines.push(format!("    payload = {}", Self::mapping_literal(&body_parameters, true)));
        lines.push(format!(
            "    api_response = await self._client.request(\"{}\", url, json=payload, params=params)",
            route.method.as_str()
        ));
        lines.push("    self._raise_for_status(api_response)".to_string());

        if route.response == TypeShape::None {
            lines.push("    return None".to_string());
        } else {
            lines.push("    response_body = api_response.json()".to_string());
            lines.push(format!(
                "    return {}",
                Self::reconstruct(&route.response, "response_body", 0)
            ));
        }

        let mut handler = lines.join("\n");
        handler.push('\n');
        handler
    }

    /// `async def name(self, ...) -> Response:`
    ///
    /// Body fields come first, then path and query parameters; parameters with
    /// a default are moved after those without one, keeping relative order.
    /// A name used by several sources becomes one argument, declared where it
    /// first appears and sent everywhere it is used.
    fn signature(route: &Route, body_parameters: &[Parameter]) -> String {
        let mut seen = HashSet::new();
        let mut parameters: Vec<&Parameter> = Vec::new();
        for param in body_parameters
            .iter()
            .chain(&route.path_parameters)
            .chain(&route.query_parameters)
        {
            if seen.insert(param.variable()) {
                parameters.push(param);
            } else {
                debug!("Route {} shares argument {} between sources", route.name, param.variable());
            }
        }
        parameters.sort_by_key(|p| p.default.is_defined());

        let mut arguments = vec!["self".to_string()];
        arguments.extend(parameters.iter().map(|p| p.render()));

        format!(
            "async def {}({}) -> {}:",
            route.name,
            arguments.join(", "),
            route.response_signature()
        )
    }

    /// Literal path, or an f-string when the path has parameters
    fn url_expression(route: &Route) -> String {
        if route.path_parameters.is_empty() {
            return python::string_literal(&route.path);
        }

        let mut template = route.path.clone();
        for param in &route.path_parameters {
            let variable = param.variable();
            if variable != param.alias {
                template = template.replace(&format!("{{{}}}", param.alias), &format!("{{{}}}", variable));
            }
        }
        format!("f{}", python::string_literal(&template))
    }

    /// `{'alias': variable, ...}` or `None` when there are no parameters
    fn mapping_literal(parameters: &[Parameter], serialize: bool) -> String {
        if parameters.is_empty() {
            return "None".to_string();
        }

        let entries: Vec<String> = parameters
            .iter()
            .map(|p| {
                let variable = p.variable();
                let value = if serialize {
                    Self::serialize_value(&p.shape, &variable, 0)
                } else {
                    variable
                };
                format!("{}: {}", python::string_literal(&p.alias), value)
            })
            .collect();
        format!("{{{}}}", entries.join(", "))
    }

    /// Expression turning a value of `shape` in `expr` into plain JSON data.
    ///
    /// Models are dumped under their wire names, date/time values become
    /// ISO-8601 text and containers are converted element by element. Values
    /// that need no conversion are used as they are.
    fn serialize_value(shape: &TypeShape, expr: &str, depth: usize) -> String {
        let suffix = if depth == 0 { String::new() } else { depth.to_string() };

        match shape {
            TypeShape::Model(_) => format!("{}.model_dump(mode=\"json\", by_alias=True)", expr),
            TypeShape::Scalar(Scalar::DateTime) => format!("{}.isoformat()", expr),
            TypeShape::List(element) => {
                let item = format!("o{}", suffix);
                let converted = Self::serialize_value(element, &item, depth + 1);
                if converted == item {
                    expr.to_string()
                } else {
                    format!("[{} for {} in {}]", converted, item, expr)
                }
            }
            TypeShape::Mapping(_, value) => {
                let key = format!("k{}", suffix);
                let val = format!("v{}", suffix);
                let converted = Self::serialize_value(value, &val, depth + 1);
                if converted == val {
                    expr.to_string()
                } else {
                    format!("{{{}: {} for {},{} in {}.items()}}", key, converted, key, val, expr)
                }
            }
            TypeShape::Optional(inner) => {
                let converted = Self::serialize_value(inner, expr, depth);
                if converted == expr {
                    converted
                } else {
                    format!("{} if {} is not None else None", converted, expr)
                }
            }
            TypeShape::Scalar(_) | TypeShape::Literal(_) | TypeShape::None => expr.to_string(),
        }
    }

    /// Expression rebuilding a value of `shape` from decoded JSON in `expr`.
    ///
    /// Models are rebuilt by keyword expansion; lists and mappings are rebuilt
    /// element by element; scalars and literals pass through unchanged.
    fn reconstruct(shape: &TypeShape, expr: &str, depth: usize) -> String {
        let suffix = if depth == 0 { String::new() } else { depth.to_string() };

        match shape {
            TypeShape::Model(model) => format!("{}(**{})", model.resolved_name(), expr),
            TypeShape::List(element) => {
                let item = format!("o{}", suffix);
                format!(
                    "[{} for {} in {}]",
                    Self::reconstruct(element, &item, depth + 1),
                    item,
                    expr
                )
            }
            TypeShape::Mapping(_, value) => {
                let key = format!("k{}", suffix);
                let val = format!("v{}", suffix);
                format!(
                    "{{{}: {} for {},{} in {}.items()}}",
                    key,
                    Self::reconstruct(value, &val, depth + 1),
                    key,
                    val,
                    expr
                )
            }
            TypeShape::Optional(inner) => {
                let rebuilt = Self::reconstruct(inner, expr, depth);
                if rebuilt == expr {
                    rebuilt
                } else {
                    format!("{} if {} is not None else None", rebuilt, expr)
                }
            }
            TypeShape::Scalar(Scalar::DateTime) => format!("datetime.fromisoformat({})", expr),
            TypeShape::Scalar(_) | TypeShape::Literal(_) | TypeShape::None => expr.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::route_table::RouteTableExtractor;
    use crate::manifest::ManifestLoader;

    const MODELS: &str = r#"
models:
  - name: Item
    fields:
      - name: id
        type: int
      - name: name
        type: str
  - module: app.events
    name: Event
    fields:
      - name: title
        type: str
      - name: starts_at
        type: datetime
      - name: ends_at
        type: Option<datetime>
        default: null
"#;

    fn render_single(routes_yaml: &str) -> String {
        let table = ManifestLoader::from_yaml_str(&format!("{}{}", MODELS, routes_yaml)).unwrap();
        let resolver = TypeResolver::new(&table.models).unwrap();
        let routes = RouteTableExtractor::extract_routes(&table.routes, &resolver, &[]).unwrap();
        HandlerEmitter::new(&resolver).render(&routes[0])
    }

    #[test]
    fn test_get_single_model() {
        let handler = render_single(
            r#"
routes:
  - name: get_item
    path: /items/{id}
    methods: [GET]
    description: Fetch one item.
    path_params:
      - alias: id
        type: int
    response: Item
"#,
        );

        assert_eq!(
            handler,
            "async def get_item(self, id: int) -> Item:\n\
             \x20   \"\"\"Fetch one item.\"\"\"\n\
             \x20   url = f'/items/{id}'\n\
             \x20   params = None\n\
             \x20   payload = None\n\
             \x20   api_response = await self._client.request(\"GET\", url, json=payload, params=params)\n\
             \x20   self._raise_for_status(api_response)\n\
             \x20   response_body = api_response.json()\n\
             \x20   return Item(**response_body)\n"
        );
    }

    #[test]
    fn test_no_parameters_and_no_response() {
        let handler = render_single(
            r#"
routes:
  - name: ping
    path: /ping
    methods: [POST]
"#,
        );

        assert!(handler.starts_with("async def ping(self) -> None:\n"));
        assert!(handler.contains("    url = '/ping'\n"));
        assert!(handler.contains("    params = None\n"));
        assert!(handler.contains("    payload = None\n"));
        assert!(handler.contains("request(\"POST\", url"));
        assert!(!handler.contains("api_response.json()"));
        assert!(handler.ends_with("    return None\n"));
        assert!(!handler.contains("\"\"\""));
    }

    #[test]
    fn test_list_of_models() {
        let handler = render_single(
            r#"
routes:
  - name: list_items
    path: /items
    methods: [GET]
    response: Vec<Item>
"#,
        );

        assert!(handler.starts_with("async def list_items(self) -> list[Item]:\n"));
        assert!(handler.ends_with("    return [Item(**o) for o in response_body]\n"));
    }

    #[test]
    fn test_mapping_of_ints_passes_values_through() {
        let handler = render_single(
            r#"
routes:
  - name: counts
    path: /counts
    methods: [GET]
    response: HashMap<str, int>
"#,
        );

        assert!(handler.starts_with("async def counts(self) -> dict[str,int]:\n"));
        assert!(handler.ends_with("    return {k: v for k,v in response_body.items()}\n"));
    }

    #[test]
    fn test_mapping_of_models() {
        let handler = render_single(
            r#"
routes:
  - name: by_name
    path: /items/by-name
    methods: [GET]
    response: dict<str, Item>
"#,
        );

        assert!(handler.ends_with("    return {k: Item(**v) for k,v in response_body.items()}\n"));
    }

    #[test]
    fn test_list_of_scalars_and_literals() {
        let ints = render_single(
            r#"
routes:
  - name: ids
    path: /ids
    methods: [GET]
    response: Vec<int>
"#,
        );
        assert!(ints.ends_with("    return [o for o in response_body]\n"));

        let literals = render_single(
            r#"
routes:
  - name: states
    path: /states
    methods: [GET]
    response: 'Vec<Literal!["on", "off"]>'
"#,
        );
        assert!(literals.starts_with("async def states(self) -> list[Literal['on', 'off']]:\n"));
        assert!(literals.ends_with("    return [o for o in response_body]\n"));
    }

    #[test]
    fn test_nested_containers() {
        let handler = render_single(
            r#"
routes:
  - name: groups
    path: /groups
    methods: [GET]
    response: HashMap<str, Vec<Option<Item>>>
"#,
        );

        assert!(handler.starts_with("async def groups(self) -> dict[str,list[Item | None]]:\n"));
        assert!(handler.ends_with(
            "    return {k: [Item(**o1) if o1 is not None else None for o1 in v] for k,v in response_body.items()}\n"
        ));
    }

    #[test]
    fn test_scalar_response() {
        let handler = render_single(
            r#"
routes:
  - name: total
    path: /total
    methods: [GET]
    response: int
"#,
        );
        assert!(handler.starts_with("async def total(self) -> int:\n"));
        assert!(handler.ends_with("    return response_body\n"));

        let when = render_single(
            r#"
routes:
  - name: now
    path: /now
    methods: [GET]
    response: datetime
"#,
        );
        assert!(when.ends_with("    return datetime.fromisoformat(response_body)\n"));
    }

    #[test]
    fn test_body_parameters_and_datetime_payload() {
        let handler = render_single(
            r#"
routes:
  - name: create_event
    path: /calendars/{calendar_id}/events
    methods: [POST]
    path_params:
      - alias: calendar_id
        type: int
    query_params:
      - alias: notify
        type: bool
        required: false
        default: true
    body: app::events::Event
    response: app::events::Event
"#,
        );

        assert!(handler.starts_with(
            "async def create_event(self, title: str, starts_at: datetime, calendar_id: int, \
             ends_at: datetime | None = None, notify: bool = True) -> AppEventsEvent:\n"
        ));
        assert!(handler.contains("    url = f'/calendars/{calendar_id}/events'\n"));
        assert!(handler.contains("    params = {'notify': notify}\n"));
        assert!(handler.contains(
            "    payload = {'title': title, 'starts_at': starts_at.isoformat(), \
             'ends_at': ends_at.isoformat() if ends_at is not None else None}\n"
        ));
        assert!(handler.ends_with("    return AppEventsEvent(**response_body)\n"));
    }

    #[test]
    fn test_alias_that_is_not_an_identifier() {
        let handler = render_single(
            r#"
routes:
  - name: get_thing
    path: /things/{thing-id}
    methods: [GET]
    path_params:
      - alias: thing-id
        type: str
    query_params:
      - alias: from
        type: str
"#,
        );

        assert!(handler.starts_with("async def get_thing(self, thing_id: str, from_: str) -> None:\n"));
        assert!(handler.contains("    url = f'/things/{thing_id}'\n"));
        assert!(handler.contains("    params = {'from': from_}\n"));
    }

    #[test]
    fn test_multiline_description() {
        let handler = render_single(
            r#"
routes:
  - name: ping
    path: /ping
    methods: [GET]
    description: "First line.\n\nMore detail."
"#,
        );

        assert!(handler.contains("    \"\"\"First line.\n\n    More detail.\"\"\"\n"));
    }

    #[test]
    fn test_nested_values_are_serialized_for_the_payload() {
        let table = ManifestLoader::from_yaml_str(
            r#"
models:
  - name: Tag
    fields:
      - name: label
        type: str
  - name: Post
    fields:
      - name: tags
        type: Vec<Tag>
      - name: cover
        type: Option<Tag>
      - name: by_lang
        type: HashMap<str, Tag>
      - name: history
        type: Vec<datetime>
      - name: groups
        type: HashMap<str, Vec<Option<datetime>>>
      - name: counts
        type: HashMap<str, int>
routes:
  - name: create_post
    path: /posts
    methods: [POST]
    body: Post
"#,
        )
        .unwrap();
        let resolver = TypeResolver::new(&table.models).unwrap();
        let routes = RouteTableExtractor::extract_routes(&table.routes, &resolver, &[]).unwrap();
        let handler = HandlerEmitter::new(&resolver).render(&routes[0]);

        let payload = handler
            .lines()
            .find(|line| line.starts_with("    payload = "))
            .unwrap();
        assert_eq!(
            payload,
            "    payload = {\
             'tags': [o.model_dump(mode=\"json\", by_alias=True) for o in tags], \
             'cover': cover.model_dump(mode=\"json\", by_alias=True) if cover is not None else None, \
             'by_lang': {k: v.model_dump(mode=\"json\", by_alias=True) for k,v in by_lang.items()}, \
             'history': [o.isoformat() for o in history], \
             'groups': {k: [o1.isoformat() if o1 is not None else None for o1 in v] for k,v in groups.items()}, \
             'counts': counts}"
        );
    }

    #[test]
    fn test_path_parameter_shared_with_body_field() {
        let handler = render_single(
            r#"
routes:
  - name: update_item
    path: /items/{id}
    methods: [PUT]
    path_params:
      - alias: id
        type: int
    body: Item
    response: Item
"#,
        );

        assert!(handler.starts_with("async def update_item(self, id: int, name: str) -> Item:\n"));
        assert!(handler.contains("    url = f'/items/{id}'\n"));
        assert!(handler.contains("    payload = {'id': id, 'name': name}\n"));
    }

    #[test]
    fn test_alias_keys_are_escaped() {
        let handler = render_single(
            r#"
routes:
  - name: search
    path: /search
    methods: [GET]
    query_params:
      - alias: "it's"
        type: str
"#,
        );

        assert!(handler.contains("    params = {\"it's\": it_s}\n"));
        assert!(handler.contains("    self._raise_for_status(api_response)\n"));
    }
}
