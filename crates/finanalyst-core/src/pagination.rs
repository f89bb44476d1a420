//! Pagination, sorting and query-string synchronization for list views
//!
//! List screens keep their state (`page`, `sort`) in the navigational query
//! string so that a reload or a shared URL reproduces the same view. The
//! REST list request uses a 0-based page, the query string a 1-based one.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn toggle(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

impl std::str::FromStr for SortOrder {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(format!("Invalid sort order: {}", s)),
        }
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortOrder::Asc => write!(f, "asc"),
            SortOrder::Desc => write!(f, "desc"),
        }
    }
}

/// Page cursors parsed from a `Link` response header (0-based page numbers)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PageLinks {
    pub first: Option<u32>,
    pub prev: Option<u32>,
    pub next: Option<u32>,
    pub last: Option<u32>,
}

/// Parameters of one list request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// 0-based page index
    pub page: u32,
    pub size: u32,
    /// `<field>,<asc|desc>`
    pub sort: String,
}

/// List view state mirrored in the query string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationState {
    /// 1-based page shown to the user
    pub active_page: u32,
    pub items_per_page: u32,
    pub sort: String,
    pub order: SortOrder,
}

impl PaginationState {
    pub fn new(items_per_page: u32, default_sort: &str) -> Self {
        Self {
            active_page: 1,
            items_per_page,
            sort: default_sort.to_string(),
            order: SortOrder::Asc,
        }
    }

    /// Build the state from a raw query string (with or without leading `?`)
    ///
    /// `page` and `sort` from the query string override the defaults;
    /// malformed values are ignored.
    pub fn from_query(query: &str, items_per_page: u32, default_sort: &str) -> Self {
        Self::from_params(&parse_query(query), items_per_page, default_sort)
    }

    /// Build the state from already decoded query parameters
    pub fn from_params(
        params: &HashMap<String, String>,
        items_per_page: u32,
        default_sort: &str,
    ) -> Self {
        let mut state = Self::new(items_per_page, default_sort);

        if let Some(page) = params.get("page").and_then(|p| p.parse::<u32>().ok()) {
            if page >= 1 {
                state.active_page = page;
            }
        }

        if let Some(sort) = params.get("sort") {
            let mut parts = sort.splitn(2, ',');
            let field = parts.next().unwrap_or("").trim();
            if !field.is_empty() {
                state.sort = field.to_string();
                state.order = parts
                    .next()
                    .and_then(|o| o.trim().parse().ok())
                    .unwrap_or_default();
            }
        }

        state
    }

    /// `<field>,<order>` as sent to the backend
    pub fn sort_param(&self) -> String {
        format!("{},{}", self.sort, self.order)
    }

    /// Query string to push back into the browser location
    pub fn to_query_string(&self) -> String {
        format!(
            "page={}&sort={}",
            self.active_page,
            urlencoding::encode(&self.sort_param())
        )
    }

    pub fn to_list_query(&self) -> ListQuery {
        ListQuery {
            page: self.active_page.saturating_sub(1),
            size: self.items_per_page,
            sort: self.sort_param(),
        }
    }

    /// State after clicking a column header: first page, order toggled
    pub fn sort_by(&self, field: &str) -> Self {
        Self {
            active_page: 1,
            items_per_page: self.items_per_page,
            sort: field.to_string(),
            order: self.order.toggle(),
        }
    }

    /// Whether the server reported a page beyond the active one
    pub fn has_more(&self, links: &PageLinks) -> bool {
        links
            .next
            .map(|next| self.active_page.saturating_sub(1) < next)
            .unwrap_or(false)
    }

    /// Advance to the next page if one is available
    pub fn load_more(&mut self, links: &PageLinks) -> bool {
        if self.has_more(links) {
            self.active_page += 1;
            true
        } else {
            false
        }
    }
}

/// Decode `a=1&b=2` into a map; later duplicates win
pub fn parse_query(query: &str) -> HashMap<String, String> {
    query
        .trim_start_matches('?')
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let mut kv = pair.splitn(2, '=');
            let key = decode_component(kv.next()?);
            let value = decode_component(kv.next().unwrap_or(""));
            Some((key, value))
        })
        .collect()
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|s| s.into_owned())
        .unwrap_or(spaced)
}

/// Path and query of a list request
///
/// With a query the request is paginated; without one every record is
/// requested. The cache-buster is always appended.
pub fn list_path(collection_path: &str, query: Option<&ListQuery>, cache_buster: i64) -> String {
    match query {
        Some(q) => format!(
            "{}?page={}&size={}&sort={}&cacheBuster={}",
            collection_path,
            q.page,
            q.size,
            urlencoding::encode(&q.sort),
            cache_buster
        ),
        None => format!("{}?cacheBuster={}", collection_path, cache_buster),
    }
}

/// Parse the total-count header as a base-10 integer
pub fn parse_total_count(value: Option<&str>) -> Option<u64> {
    value.and_then(|v| v.trim().parse::<u64>().ok())
}

/// Parse `<url?page=N&size=S>; rel="next", ...` into page cursors
pub fn parse_link_header(value: &str) -> PageLinks {
    let mut links = PageLinks::default();

    for part in value.split(',') {
        let mut sections = part.split(';');
        let url = match sections.next() {
            Some(url) => url.trim().trim_start_matches('<').trim_end_matches('>'),
            None => continue,
        };
        let rel = sections
            .filter_map(|s| s.trim().strip_prefix("rel="))
            .map(|r| r.trim_matches('"'))
            .next();
        let page = url
            .split_once('?')
            .map(|(_, q)| parse_query(q))
            .and_then(|params| params.get("page").and_then(|p| p.parse::<u32>().ok()));

        if let (Some(rel), Some(page)) = (rel, page) {
            match rel {
                "first" => links.first = Some(page),
                "prev" => links.prev = Some(page),
                "next" => links.next = Some(page),
                "last" => links.last = Some(page),
                _ => {}
            }
        }
    }

    links
}

/// Render a `Link` header for a page of `total` records
pub fn build_link_header(collection_path: &str, page: u32, size: u32, total: u64) -> String {
    let size = size.max(1);
    let total_pages = ((total + size as u64 - 1) / size as u64) as u32;
    let last = total_pages.saturating_sub(1);
    let link = |p: u32, rel: &str| {
        format!("<{}?page={}&size={}>; rel=\"{}\"", collection_path, p, size, rel)
    };

    let mut parts = Vec::new();
    if page < last {
        parts.push(link(page + 1, "next"));
    }
    if page > 0 {
        parts.push(link(page - 1, "prev"));
    }
    parts.push(link(last, "last"));
    parts.push(link(0, "first"));
    parts.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_query_defaults() {
        let state = PaginationState::from_query("", 20, "id");
        assert_eq!(state, PaginationState::new(20, "id"));
        assert_eq!(state.to_query_string(), "page=1&sort=id%2Casc");
    }

    #[test]
    fn test_from_query_overrides() {
        let state = PaginationState::from_query("?page=3&sort=name,desc", 20, "id");
        assert_eq!(state.active_page, 3);
        assert_eq!(state.sort, "name");
        assert_eq!(state.order, SortOrder::Desc);
        assert_eq!(
            state.to_list_query(),
            ListQuery {
                page: 2,
                size: 20,
                sort: "name,desc".to_string()
            }
        );
    }

    #[test]
    fn test_from_params_matches_from_query() {
        let params: HashMap<String, String> = [
            ("page".to_string(), "2".to_string()),
            ("sort".to_string(), "name,desc".to_string()),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            PaginationState::from_params(&params, 20, "id"),
            PaginationState::from_query("page=2&sort=name%2Cdesc", 20, "id")
        );
    }

    #[test]
    fn test_from_query_ignores_garbage() {
        let state = PaginationState::from_query("page=zero&sort=,desc", 10, "id");
        assert_eq!(state.active_page, 1);
        assert_eq!(state.sort, "id");

        let state = PaginationState::from_query("page=0&sort=name,sideways", 10, "id");
        assert_eq!(state.active_page, 1);
        assert_eq!(state.sort, "name");
        assert_eq!(state.order, SortOrder::Asc);
    }

    #[test]
    fn test_query_string_round_trip() {
        let state = PaginationState {
            active_page: 4,
            items_per_page: 20,
            sort: "transactionDate".to_string(),
            order: SortOrder::Desc,
        };
        let back = PaginationState::from_query(&state.to_query_string(), 20, "id");
        assert_eq!(back, state);
    }

    #[test]
    fn test_sort_by_resets_page_and_toggles() {
        let mut state = PaginationState::new(20, "id");
        state.active_page = 5;
        let sorted = state.sort_by("name");
        assert_eq!(sorted.active_page, 1);
        assert_eq!(sorted.sort, "name");
        assert_eq!(sorted.order, SortOrder::Desc);
        assert_eq!(sorted.sort_by("name").order, SortOrder::Asc);
    }

    #[test]
    fn test_has_more_and_load_more() {
        let mut state = PaginationState::new(2, "id");
        let links = PageLinks {
            next: Some(1),
            last: Some(2),
            first: Some(0),
            prev: None,
        };
        assert!(state.has_more(&links));
        assert!(state.load_more(&links));
        assert_eq!(state.active_page, 2);
        assert!(!state.has_more(&links));
        assert!(!state.load_more(&links));
        assert!(!state.has_more(&PageLinks::default()));
    }

    #[test]
    fn test_list_path() {
        let query = ListQuery {
            page: 0,
            size: 20,
            sort: "name,asc".to_string(),
        };
        assert_eq!(
            list_path("/api/incomes", Some(&query), 1700),
            "/api/incomes?page=0&size=20&sort=name%2Casc&cacheBuster=1700"
        );
        assert_eq!(list_path("/api/incomes", None, 1700), "/api/incomes?cacheBuster=1700");
    }

    #[test]
    fn test_parse_total_count() {
        assert_eq!(parse_total_count(Some("42")), Some(42));
        assert_eq!(parse_total_count(Some(" 7 ")), Some(7));
        assert_eq!(parse_total_count(Some("4x")), None);
        assert_eq!(parse_total_count(None), None);
    }

    #[test]
    fn test_link_header_round_trip() {
        let header = build_link_header("/api/transactions", 1, 10, 35);
        let links = parse_link_header(&header);
        assert_eq!(
            links,
            PageLinks {
                first: Some(0),
                prev: Some(0),
                next: Some(2),
                last: Some(3),
            }
        );

        let last_page = parse_link_header(&build_link_header("/api/transactions", 3, 10, 35));
        assert_eq!(last_page.next, None);
        assert_eq!(last_page.prev, Some(2));
    }

    #[test]
    fn test_parse_query_decodes() {
        let params = parse_query("?sort=name%2Cdesc&q=a+b&flag");
        assert_eq!(params.get("sort").map(String::as_str), Some("name,desc"));
        assert_eq!(params.get("q").map(String::as_str), Some("a b"));
        assert_eq!(params.get("flag").map(String::as_str), Some(""));
    }
}
