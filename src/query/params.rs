//! Pagination and sort parameters extracted from the request query string

use serde::Deserialize;

/// Sort direction for list results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Pagination parameters recognized on list requests.
///
/// * `skip` - how many resources to skip (e.g. 30)
/// * `limit` - how many resources to retrieve (e.g. 15)
/// * `sort` - field on which to sort returned resources (e.g. `first_name`)
/// * `order` - ordering of returned resources (`asc` or `desc`)
///
/// `skip` and `limit` use `-1` as the "unset" sentinel; zero or negative
/// values mean "no skip"/"no limit", never "zero items". An empty `sort`
/// field disables sorting regardless of `order`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ListParams {
    pub skip: i64,
    pub limit: i64,
    pub sort: String,
    pub order: SortOrder,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            skip: -1,
            limit: -1,
            sort: String::new(),
            order: SortOrder::Asc,
        }
    }
}

impl ListParams {
    /// Skip value, if strictly positive
    pub fn skip(&self) -> Option<u64> {
        (self.skip > 0).then_some(self.skip as u64)
    }

    /// Limit value, if strictly positive
    pub fn limit(&self) -> Option<u64> {
        (self.limit > 0).then_some(self.limit as u64)
    }

    /// Sort field and direction, if a sort field was supplied
    pub fn sort(&self) -> Option<(&str, SortOrder)> {
        (!self.sort.is_empty()).then(|| (self.sort.as_str(), self.order))
    }
}
