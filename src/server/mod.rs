//! HTTP route construction and middleware attachment

pub mod routes;

pub use routes::{
    MiddlewareRule, RouteConfig, RouteLayer, layer_fn, resource_routes, resource_routes_default,
};
