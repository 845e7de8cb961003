use anyhow::Result;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::models::{PageResult, SearchItem};

pub const API_BASE: &str = "https://hn.algolia.com/api/v1";
pub const DEFAULT_QUERY: &str = "redux";
pub const HITS_PER_PAGE: u32 = 100;

/// Wire format of a single Algolia search hit. Comment-type hits come back
/// with null title/url/author, so everything except the id is optional.
#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(rename = "objectID")]
    object_id: String,
    title: Option<String>,
    url: Option<String>,
    author: Option<String>,
    num_comments: Option<i32>,
    points: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: Vec<SearchHit>,
    page: u32,
}

#[derive(Clone)]
pub struct SearchClient {
    client: Client,
    base_url: String,
}

impl SearchClient {
    pub fn new() -> Self {
        Self::with_base_url(API_BASE)
    }

    // Used by tests to point the client at a local server.
    pub fn with_base_url(base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .user_agent(concat!("hacker_news_search/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetches one page of results for `query` and reshapes the response into
    /// a `PageResult` keyed by the query string. Any transport failure,
    /// non-2xx status or undecodable body surfaces as a single opaque error.
    pub fn search(&self, query: &str, page: u32) -> Result<PageResult> {
        let url = format!(
            "{}/search?query={}&page={}&hitsPerPage={}",
            self.base_url,
            urlencoding::encode(query),
            page,
            HITS_PER_PAGE
        );

        let response: SearchResponse = self
            .client
            .get(&url)
            .send()?
            .error_for_status()?
            .json()?;

        let items = response
            .hits
            .into_iter()
            .map(|hit| SearchItem {
                id: hit.object_id,
                title: hit.title.unwrap_or_default(),
                url: hit.url.unwrap_or_default(),
                author: hit.author.unwrap_or_default(),
                num_comments: hit.num_comments.unwrap_or_default(),
                points: hit.points.unwrap_or_default(),
            })
            .collect();

        Ok(PageResult {
            key: query.to_string(),
            page: response.page,
            items,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ResultStore;
    use mockito::Matcher;
    use serde_json::json;

    fn query_matcher(query: &str, page: &str) -> Matcher {
        Matcher::AllOf(vec![
            Matcher::UrlEncoded("query".into(), query.into()),
            Matcher::UrlEncoded("page".into(), page.into()),
            Matcher::UrlEncoded("hitsPerPage".into(), HITS_PER_PAGE.to_string()),
        ])
    }

    #[test]
    fn search_reshapes_algolia_hits() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/search")
            .match_query(query_matcher("redux", "0"))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "hits": [
                        {
                            "objectID": "100",
                            "title": "Redux released",
                            "url": "https://example.com/redux",
                            "author": "dan",
                            "num_comments": 42,
                            "points": 310,
                            "created_at": "2015-06-02T00:00:00Z"
                        },
                        {
                            "objectID": "101",
                            "title": null,
                            "url": null,
                            "author": null,
                            "num_comments": null,
                            "points": null
                        }
                    ],
                    "page": 0,
                    "nbPages": 50
                })
                .to_string(),
            )
            .create();

        let client = SearchClient::with_base_url(&server.url());
        let result = client.search("redux", 0).unwrap();
        mock.assert();

        assert_eq!(result.key, "redux");
        assert_eq!(result.page, 0);
        assert_eq!(result.items.len(), 2);

        assert_eq!(result.items[0].id, "100");
        assert_eq!(result.items[0].title, "Redux released");
        assert_eq!(result.items[0].author, "dan");
        assert_eq!(result.items[0].num_comments, 42);
        assert_eq!(result.items[0].points, 310);

        // Null fields collapse to defaults instead of failing the decode.
        assert_eq!(result.items[1].id, "101");
        assert_eq!(result.items[1].title, "");
        assert_eq!(result.items[1].points, 0);
    }

    #[test]
    fn search_percent_encodes_the_query() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/search")
            .match_query(query_matcher("rust lang", "0"))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "hits": [], "page": 0 }).to_string())
            .create();

        let client = SearchClient::with_base_url(&server.url());
        let result = client.search("rust lang", 0).unwrap();
        mock.assert();
        assert!(result.items.is_empty());
    }

    #[test]
    fn search_fails_on_server_error() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/search")
            .match_query(Matcher::Any)
            .with_status(500)
            .create();

        let client = SearchClient::with_base_url(&server.url());
        assert!(client.search("redux", 0).is_err());
    }

    #[test]
    fn search_fails_on_malformed_body() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("not json")
            .create();

        let client = SearchClient::with_base_url(&server.url());
        assert!(client.search("redux", 0).is_err());
    }

    // The submit-then-more flow from the UI, end to end against a local
    // server: page 0 lands two items, "more" appends page 1 behind them.
    #[test]
    fn submit_then_more_accumulates_pages_in_order() {
        let mut server = mockito::Server::new();
        let page0 = server
            .mock("GET", "/search")
            .match_query(query_matcher("redux", "0"))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "hits": [
                        { "objectID": "1", "title": "first", "url": "https://a", "author": "a", "num_comments": 1, "points": 10 },
                        { "objectID": "2", "title": "second", "url": "https://b", "author": "b", "num_comments": 2, "points": 20 }
                    ],
                    "page": 0
                })
                .to_string(),
            )
            .create();
        let page1 = server
            .mock("GET", "/search")
            .match_query(query_matcher("redux", "1"))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "hits": [
                        { "objectID": "3", "title": "third", "url": "https://c", "author": "c", "num_comments": 3, "points": 30 }
                    ],
                    "page": 1
                })
                .to_string(),
            )
            .create();

        let client = SearchClient::with_base_url(&server.url());
        let mut store = ResultStore::new();

        assert!(store.needs_fetch("redux"));
        store = store.merge(client.search("redux", 0).unwrap());

        let view = store.active_view("redux");
        assert_eq!(view.items.len(), 2);
        assert_eq!(view.page, 0);

        let next_page = store.active_view("redux").page + 1;
        store = store.merge(client.search("redux", next_page).unwrap());

        let view = store.active_view("redux");
        let ids: Vec<&str> = view.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(view.page, 1);
        assert!(!store.needs_fetch("redux"));

        page0.assert();
        page1.assert();
    }
}
