use axum::{
    async_trait,
    extract::{FromRequestParts, OriginalUri},
    http::{header, request::Parts, HeaderMap},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::ApiConfig;
use crate::error::ApiError;

/// Query parameters shared by the list endpoints
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub expand: Option<String>,
}

/// Limit/offset window for one page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
}

impl Pagination {
    /// Unparseable or out-of-range values fall back to the defaults rather than erroring
    pub fn from_query(query: &ListQuery, config: &ApiConfig) -> Self {
        let max = i64::from(config.max_page_size.max(1));
        let limit = query
            .limit
            .as_deref()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|v| *v > 0)
            .unwrap_or_else(|| i64::from(config.page_size))
            .min(max);
        let offset = query
            .offset
            .as_deref()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|v| *v >= 0)
            .unwrap_or(0);

        Self { limit, offset }
    }

    /// Link to the following page, if any rows remain
    pub fn next_link(&self, url: &Url, count: i64) -> Option<String> {
        let next_offset = self.offset.checked_add(self.limit)?;
        if next_offset >= count {
            return None;
        }
        let url = replace_query_param(url, "limit", &self.limit.to_string());
        let url = replace_query_param(&url, "offset", &next_offset.to_string());
        Some(url.to_string())
    }

    /// Link to the preceding page; the first page drops `offset` entirely
    pub fn previous_link(&self, url: &Url) -> Option<String> {
        if self.offset <= 0 {
            return None;
        }
        let url = replace_query_param(url, "limit", &self.limit.to_string());
        if self.offset - self.limit <= 0 {
            return Some(remove_query_param(&url, "offset").to_string());
        }
        let url = replace_query_param(&url, "offset", &(self.offset - self.limit).to_string());
        Some(url.to_string())
    }
}

/// List response body: `{count, next, previous, results}`
#[derive(Debug, Serialize)]
pub struct Paginated<T: Serialize> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T: Serialize> Paginated<T> {
    pub fn new(results: Vec<T>, count: i64, pagination: Pagination, url: &Url) -> Self {
        Self {
            count,
            next: pagination.next_link(url, count),
            previous: pagination.previous_link(url),
            results,
        }
    }
}

fn replace_query_param(url: &Url, key: &str, value: &str) -> Url {
    let mut replaced = false;
    let mut pairs: Vec<(String, String)> = Vec::new();
    for (k, v) in url.query_pairs() {
        if k == key {
            if !replaced {
                pairs.push((k.into_owned(), value.to_string()));
                replaced = true;
            }
        } else {
            pairs.push((k.into_owned(), v.into_owned()));
        }
    }
    if !replaced {
        pairs.push((key.to_string(), value.to_string()));
    }

    let mut url = url.clone();
    url.query_pairs_mut().clear().extend_pairs(pairs);
    url
}

fn remove_query_param(url: &Url, key: &str) -> Url {
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != key)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut url = url.clone();
    if pairs.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(pairs);
    }
    url
}

/// Absolute URL of the current request, used to build page links
#[derive(Debug, Clone)]
pub struct RequestUrl(pub Url);

impl RequestUrl {
    fn from_parts(headers: &HeaderMap, uri: &axum::http::Uri) -> Result<Url, ApiError> {
        let scheme = headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .or_else(|| uri.scheme_str())
            .unwrap_or("http");
        let host = headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .or_else(|| uri.authority().map(|a| a.as_str()))
            .unwrap_or("localhost");
        let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");

        Url::parse(&format!("{}://{}{}", scheme, host, path_and_query))
            .map_err(|e| ApiError::bad_request(format!("Invalid request URL: {}", e)))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestUrl
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Nested routers rewrite the URI; links must point at what the client called
        let uri = parts
            .extensions
            .get::<OriginalUri>()
            .map(|OriginalUri(uri)| uri.clone())
            .unwrap_or_else(|| parts.uri.clone());
        Self::from_parts(&parts.headers, &uri).map(RequestUrl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_config() -> ApiConfig {
        ApiConfig {
            page_size: 100,
            max_page_size: 500,
            enable_request_logging: false,
        }
    }

    fn query(limit: Option<&str>, offset: Option<&str>) -> ListQuery {
        ListQuery {
            limit: limit.map(String::from),
            offset: offset.map(String::from),
            expand: None,
        }
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn defaults_and_caps() {
        let config = api_config();
        assert_eq!(
            Pagination::from_query(&query(None, None), &config),
            Pagination { limit: 100, offset: 0 }
        );
        assert_eq!(Pagination::from_query(&query(Some("9999"), None), &config).limit, 500);
        assert_eq!(Pagination::from_query(&query(Some("0"), None), &config).limit, 100);
        assert_eq!(Pagination::from_query(&query(Some("abc"), Some("-3")), &config).offset, 0);
        assert_eq!(Pagination::from_query(&query(Some("5"), Some("10")), &config).offset, 10);
    }

    #[test]
    fn next_link_advances_offset() {
        let page = Pagination { limit: 2, offset: 0 };
        let link = page
            .next_link(&url("http://testserver/classifiers?expand=user"), 5)
            .unwrap();
        assert_eq!(link, "http://testserver/classifiers?expand=user&limit=2&offset=2");

        let last = Pagination { limit: 2, offset: 4 };
        assert!(last.next_link(&url("http://testserver/classifiers"), 5).is_none());
    }

    #[test]
    fn previous_link_drops_offset_on_first_page() {
        let page = Pagination { limit: 2, offset: 2 };
        let link = page
            .previous_link(&url("http://testserver/classifiers?limit=2&offset=2"))
            .unwrap();
        assert_eq!(link, "http://testserver/classifiers?limit=2");

        let page = Pagination { limit: 2, offset: 5 };
        let link = page
            .previous_link(&url("http://testserver/classifiers?limit=2&offset=5"))
            .unwrap();
        assert_eq!(link, "http://testserver/classifiers?limit=2&offset=3");

        let first = Pagination { limit: 2, offset: 0 };
        assert!(first.previous_link(&url("http://testserver/classifiers")).is_none());

        // Offset inside the first page still links back to the start
        let page = Pagination { limit: 2, offset: 1 };
        let link = page
            .previous_link(&url("http://testserver/classifiers?limit=2&offset=1"))
            .unwrap();
        assert_eq!(link, "http://testserver/classifiers?limit=2");
    }

    #[test]
    fn next_link_saturates_at_max_offset() {
        let page = Pagination { limit: 100, offset: i64::MAX };
        assert!(page
            .next_link(&url("http://testserver/classifiers"), i64::MAX)
            .is_none());
    }

    #[test]
    fn request_url_uses_host_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, "api.cognoma.org".parse().unwrap());
        let uri: axum::http::Uri = "/classifiers?limit=1".parse().unwrap();

        let url = RequestUrl::from_parts(&headers, &uri).unwrap();
        assert_eq!(url.as_str(), "http://api.cognoma.org/classifiers?limit=1");
    }
}
