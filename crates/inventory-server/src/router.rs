//! Request routing and path matching.
//!
//! Maps an incoming method and path to the `operationId` the contract
//! declares for it. Path templates use OpenAPI `{param}` syntax; routes are
//! checked in registration order and the first match wins.
//!
//! # Example
//!
//! ```rust
//! use inventory_server::Router;
//! use http::Method;
//!
//! let mut router = Router::new();
//! router.add_route(Method::GET, "/items/{id}", "findItemById");
//! router.add_route(Method::DELETE, "/items/{id}", "deleteItem");
//!
//! let m = router.match_route(&Method::GET, "/items/1000").unwrap();
//! assert_eq!(m.operation_id(), "findItemById");
//! assert_eq!(m.param("id"), Some("1000"));
//!
//! assert!(router.match_route(&Method::PUT, "/items/1000").is_none());
//! assert_eq!(router.allowed_methods("/items/1000"), vec![Method::GET, Method::DELETE]);
//! ```

use std::collections::HashMap;

use http::Method;
use inventory_core::Contract;

/// A matched route with extracted path parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    operation_id: String,
    params: HashMap<String, String>,
}

impl RouteMatch {
    /// Creates a new route match.
    #[must_use]
    pub fn new(operation_id: impl Into<String>, params: HashMap<String, String>) -> Self {
        Self {
            operation_id: operation_id.into(),
            params,
        }
    }

    /// Returns the operation ID for this route.
    #[must_use]
    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }

    /// Returns the extracted path parameters.
    #[must_use]
    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// Returns a specific path parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Consumes the match, returning the operation ID and parameters.
    #[must_use]
    pub fn into_parts(self) -> (String, HashMap<String, String>) {
        (self.operation_id, self.params)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathSegment {
    Literal(String),
    Param(String),
}

#[derive(Debug, Clone)]
struct Route {
    method: Method,
    segments: Vec<PathSegment>,
    operation_id: String,
}

impl Route {
    fn new(method: Method, pattern: &str, operation_id: impl Into<String>) -> Self {
        Self {
            method,
            segments: Self::parse_segments(pattern),
            operation_id: operation_id.into(),
        }
    }

    fn parse_segments(pattern: &str) -> Vec<PathSegment> {
        pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| match s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(name) => PathSegment::Param(name.to_string()),
                None => PathSegment::Literal(s.to_string()),
            })
            .collect()
    }

    /// Returns extracted parameters if the path fits this route's template.
    fn match_path(&self, path: &str) -> Option<HashMap<String, String>> {
        let path_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        if path_segments.len() != self.segments.len() {
            return None;
        }

        let mut params = HashMap::new();

        for (pattern, actual) in self.segments.iter().zip(path_segments) {
            match pattern {
                PathSegment::Literal(expected) => {
                    if expected != actual {
                        return None;
                    }
                }
                PathSegment::Param(name) => {
                    params.insert(name.clone(), actual.to_string());
                }
            }
        }

        Some(params)
    }
}

/// HTTP request router.
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Creates a new empty router.
    #[must_use]
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Creates a router with one route per contract operation.
    #[must_use]
    pub fn from_contract(contract: &Contract) -> Self {
        let mut router = Self::new();
        for operation in contract.operations() {
            router.add_route(
                operation.method().clone(),
                operation.path(),
                operation.operation_id(),
            );
        }
        router
    }

    /// Adds a route to the router.
    pub fn add_route(
        &mut self,
        method: Method,
        pattern: impl AsRef<str>,
        operation_id: impl Into<String>,
    ) {
        self.routes
            .push(Route::new(method, pattern.as_ref(), operation_id));
    }

    /// Returns the number of registered routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Matches an incoming request to a route.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        self.routes
            .iter()
            .filter(|route| route.method == *method)
            .find_map(|route| {
                route
                    .match_path(path)
                    .map(|params| RouteMatch::new(&route.operation_id, params))
            })
    }

    /// Returns the methods routed for `path`, in registration order.
    ///
    /// Empty when no route's template fits the path.
    #[must_use]
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let mut methods: Vec<Method> = Vec::new();
        for route in &self.routes {
            if route.match_path(path).is_some() && !methods.contains(&route.method) {
                methods.push(route.method.clone());
            }
        }
        methods
    }

    /// Checks if a specific operation ID is registered.
    #[must_use]
    pub fn has_operation(&self, operation_id: &str) -> bool {
        self.routes.iter().any(|r| r.operation_id == operation_id)
    }

    /// Returns all registered operation IDs.
    #[must_use]
    pub fn operation_ids(&self) -> Vec<&str> {
        self.routes.iter().map(|r| r.operation_id.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inventory_core::inventory_contract;

    fn inventory_router() -> Router {
        Router::from_contract(&inventory_contract().unwrap())
    }

    #[test]
    fn test_from_contract_registers_every_operation() {
        let router = inventory_router();
        assert_eq!(router.route_count(), 5);
        for op in ["findItems", "addItem", "findItemById", "updateItem", "deleteItem"] {
            assert!(router.has_operation(op), "{op}");
        }
    }

    #[test]
    fn test_match_collection_routes() {
        let router = inventory_router();

        let m = router.match_route(&Method::GET, "/items").unwrap();
        assert_eq!(m.operation_id(), "findItems");
        assert!(m.params().is_empty());

        let m = router.match_route(&Method::POST, "/items").unwrap();
        assert_eq!(m.operation_id(), "addItem");
    }

    #[test]
    fn test_match_item_routes_extract_id() {
        let router = inventory_router();

        for (method, op) in [
            (Method::GET, "findItemById"),
            (Method::PUT, "updateItem"),
            (Method::DELETE, "deleteItem"),
        ] {
            let m = router.match_route(&method, "/items/1000").unwrap();
            assert_eq!(m.operation_id(), op);
            assert_eq!(m.param("id"), Some("1000"));
        }
    }

    #[test]
    fn test_param_is_not_typed_by_router() {
        let router = inventory_router();
        let m = router.match_route(&Method::GET, "/items/abc").unwrap();
        assert_eq!(m.param("id"), Some("abc"));
    }

    #[test]
    fn test_trailing_slash_matches() {
        let router = inventory_router();
        assert!(router.match_route(&Method::GET, "/items/").is_some());
    }

    #[test]
    fn test_no_match() {
        let router = inventory_router();
        assert!(router.match_route(&Method::GET, "/products").is_none());
        assert!(router.match_route(&Method::GET, "/items/1/extra").is_none());
        assert!(router.match_route(&Method::PATCH, "/items/1").is_none());
    }

    #[test]
    fn test_allowed_methods() {
        let router = inventory_router();
        assert_eq!(
            router.allowed_methods("/items"),
            vec![Method::GET, Method::POST]
        );
        assert_eq!(
            router.allowed_methods("/items/7"),
            vec![Method::GET, Method::PUT, Method::DELETE]
        );
        assert!(router.allowed_methods("/nowhere").is_empty());
    }

    #[test]
    fn test_first_match_wins() {
        let mut router = Router::new();
        router.add_route(Method::GET, "/items/{id}", "first");
        router.add_route(Method::GET, "/items/{other}", "second");

        let m = router.match_route(&Method::GET, "/items/1").unwrap();
        assert_eq!(m.operation_id(), "first");
        assert_eq!(router.operation_ids(), vec!["first", "second"]);
    }
}
