//! Query construction: request parameters, constraint bundles, the builder

pub mod builder;
pub mod params;
pub mod spec;

pub use builder::{Query, build_query, build_query_with_count};
pub use params::{ListParams, SortOrder};
pub use spec::{Constraints, CountOp, Predicate, QuerySpec, RelationCount, RowPredicate};
