use crate::error::{Error, Result};
use crate::extractor::{HttpMethod, Parameter, Route};
use crate::manifest::{ParameterEntry, RouteEntry, RouteKind};
use crate::type_resolver::{TypeResolver, TypeShape};
use log::debug;
use std::collections::HashSet;

/// Route extractor for host route tables
pub struct RouteTableExtractor;

impl RouteTableExtractor {
    /// Converts host route entries into route descriptors.
    ///
    /// Internal entries and entries whose path is excluded are skipped; the
    /// remaining routes keep host table order and their table index.
    ///
    /// # Errors
    ///
    /// Fails on the first route that offers no supported HTTP method, whose
    /// types do not resolve, or whose body is not a model. Nothing is
    /// returned for the other routes in that case.
    pub fn extract_routes(
        entries: &[RouteEntry],
        resolver: &TypeResolver,
        paths_to_exclude: &[String],
    ) -> Result<Vec<Route>> {
        let excluded: HashSet<&str> = paths_to_exclude.iter().map(String::as_str).collect();
        let mut routes = Vec::new();

        for (index, entry) in entries.iter().enumerate() {
            if entry.kind != RouteKind::Endpoint {
                debug!("Skipping internal route: {}", entry.path);
                continue;
            }
            if excluded.contains(entry.path.as_str()) {
                debug!("Skipping excluded route: {}", entry.path);
                continue;
            }

            let route = Self::extract_route(index, entry, resolver)?;
            debug!("Extracted route: {} {} -> {}", route.method.as_str(), route.path, route.name);
            routes.push(route);
        }

        debug!("Extracted {} of {} route table entries", routes.len(), entries.len());
        Ok(routes)
    }

    fn extract_route(index: usize, entry: &RouteEntry, resolver: &TypeResolver) -> Result<Route> {
        let method = HttpMethod::select(&entry.methods).ok_or_else(|| Error::UnsupportedMethod {
            route: entry.name.clone(),
            methods: entry.methods.clone(),
        })?;

        let path_parameters = Self::extract_parameters(&entry.path_params, resolver)?;
        let query_parameters = Self::extract_parameters(&entry.query_params, resolver)?;

        let body = match entry.body.as_deref() {
            Some(expr) => match resolver.resolve_type(expr)? {
                TypeShape::Model(model) => Some(model),
                other => {
                    return Err(Error::InvalidBody {
                        route: entry.name.clone(),
                        message: format!("expected a model, found {}", other.render()),
                    })
                }
            },
            None => None,
        };

        let response = match entry.response.as_deref() {
            Some(expr) => resolver.resolve_type(expr)?,
            None => TypeShape::None,
        };

        Ok(Route {
            index,
            name: entry.name.clone(),
            method,
            path: entry.path.clone(),
            description: entry.description.clone(),
            body,
            path_parameters,
            query_parameters,
            response,
        })
    }

    fn extract_parameters(entries: &[ParameterEntry], resolver: &TypeResolver) -> Result<Vec<Parameter>> {
        entries
            .iter()
            .map(|param| {
                Ok(Parameter::new(
                    param.alias.clone(),
                    resolver.resolve_type(&param.type_expr)?,
                    param.required,
                    param.default.clone(),
                ))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::DefaultValue;
    use crate::manifest::ManifestLoader;
    use crate::type_resolver::{ModelRef, Scalar};

    const TABLE: &str = r#"
models:
  - module: shop.models
    name: Item
    fields:
      - name: id
        type: int
routes:
  - name: docs
    path: /docs
    methods: [GET]
    kind: internal
  - name: list_items
    path: /items
    methods: [HEAD, GET]
    query_params:
      - alias: limit
        type: int
        required: false
        default: 10
    response: Vec<Item>
  - name: create_item
    path: /items
    methods: [POST]
    body: Item
    response: Item
  - name: health
    path: /health
    methods: [GET]
    response: str
"#;

    fn extract(paths_to_exclude: &[String]) -> Result<Vec<Route>> {
        let table = ManifestLoader::from_yaml_str(TABLE).unwrap();
        let resolver = TypeResolver::new(&table.models).unwrap();
        RouteTableExtractor::extract_routes(&table.routes, &resolver, paths_to_exclude)
    }

    #[test]
    fn test_extract_keeps_table_order_and_index() {
        let routes = extract(&[]).unwrap();

        let names: Vec<&str> = routes.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["list_items", "create_item", "health"]);

        let indexes: Vec<usize> = routes.iter().map(|r| r.index).collect();
        assert_eq!(indexes, vec![1, 2, 3]);
    }

    #[test]
    fn test_extract_selects_method_by_priority() {
        let routes = extract(&[]).unwrap();
        assert_eq!(routes[0].method, HttpMethod::Get);
        assert_eq!(routes[1].method, HttpMethod::Post);
    }

    #[test]
    fn test_extract_parameters_and_types() {
        let routes = extract(&[]).unwrap();
        let list_items = &routes[0];

        assert_eq!(list_items.query_parameters.len(), 1);
        let limit = &list_items.query_parameters[0];
        assert_eq!(limit.alias, "limit");
        assert_eq!(limit.shape, TypeShape::Scalar(Scalar::Int));
        assert!(!limit.required);
        assert_eq!(limit.default, DefaultValue::Value(serde_json::json!(10)));

        assert_eq!(
            list_items.response,
            TypeShape::List(Box::new(TypeShape::Model(ModelRef::new("shop.models", "Item"))))
        );
        assert_eq!(routes[1].body, Some(ModelRef::new("shop.models", "Item")));
    }

    #[test]
    fn test_extract_excludes_paths() {
        let routes = extract(&["/items".to_string()]).unwrap();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].name, "health");
    }

    #[test]
    fn test_unsupported_method_is_fatal() {
        let table = ManifestLoader::from_yaml_str(
            r#"
routes:
  - name: ok
    path: /ok
    methods: [GET]
  - name: stream
    path: /stream
    methods: [CONNECT]
"#,
        )
        .unwrap();
        let resolver = TypeResolver::new(&table.models).unwrap();
        let result = RouteTableExtractor::extract_routes(&table.routes, &resolver, &[]);

        match result {
            Err(Error::UnsupportedMethod { route, methods }) => {
                assert_eq!(route, "stream");
                assert_eq!(methods, vec!["CONNECT".to_string()]);
            }
            other => panic!("Expected unsupported method error, got {:?}", other),
        }
    }

    #[test]
    fn test_excluded_route_with_bad_method_is_not_an_error() {
        let table = ManifestLoader::from_yaml_str(
            r#"
routes:
  - name: stream
    path: /stream
    methods: [CONNECT]
"#,
        )
        .unwrap();
        let resolver = TypeResolver::new(&table.models).unwrap();
        let routes = RouteTableExtractor::extract_routes(&table.routes, &resolver, &["/stream".to_string()]).unwrap();
        assert!(routes.is_empty());
    }

    #[test]
    fn test_scalar_body_is_rejected() {
        let table = ManifestLoader::from_yaml_str(
            r#"
routes:
  - name: upload
    path: /upload
    methods: [POST]
    body: Vec<int>
"#,
        )
        .unwrap();
        let resolver = TypeResolver::new(&table.models).unwrap();
        let result = RouteTableExtractor::extract_routes(&table.routes, &resolver, &[]);
        assert!(matches!(result, Err(Error::InvalidBody { .. })));
    }
}
