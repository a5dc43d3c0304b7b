use crate::error::GithubError;
use crate::github::rate_limit::{check_response, RateLimit};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, LINK, USER_AGENT};
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Connection settings for the GitHub REST API
#[derive(Clone)]
pub struct GithubConfig {
    /// API root without trailing slash
    pub api_base: String,

    /// Personal access token sent as `Authorization: token ...`
    pub token: String,

    /// Page size for listing endpoints (GitHub caps this at 100)
    pub per_page: u32,

    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for GithubConfig {
    fn default() -> Self {
        GithubConfig {
            api_base: String::from(DEFAULT_API_BASE),
            token: String::new(),
            per_page: 100,
            timeout: Duration::from_secs(30),
        }
    }
}

impl fmt::Debug for GithubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubConfig")
            .field("api_base", &self.api_base)
            .field("has_token", &!self.token.is_empty())
            .field("per_page", &self.per_page)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl GithubConfig {
    /// Default settings with the token taken from `GITHUB_TOKEN`
    pub fn from_env() -> Result<Self, GithubError> {
        let token = std::env::var(TOKEN_ENV)
            .map_err(|_| GithubError::Config(format!("{TOKEN_ENV} is not set")))?;
        Ok(GithubConfig {
            token,
            ..GithubConfig::default()
        })
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base.trim_end_matches('/'), path.trim_start_matches('/'))
    }
}

/// One HTTP response, reduced to what the pagination loop needs
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub url: String,
    pub rate_limit: RateLimit,
    /// Target of the `rel="next"` entry in the `Link` header
    pub next: Option<String>,
    pub body: String,
}

/// Performs a single GET. Implemented over HTTP for real use and by fakes
/// in tests.
pub trait Transport {
    fn get(&self, url: &str, query: &[(&str, String)]) -> Result<Response, GithubError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, url: &str, query: &[(&str, String)]) -> Result<Response, GithubError> {
        (**self).get(url, query)
    }
}

/// Blocking reqwest transport with GitHub's auth and media-type headers
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(config: &GithubConfig) -> Result<Self, GithubError> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("token {}", config.token))
            .map_err(|_| GithubError::Config(String::from("token is not a valid header value")))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github.v3+json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("gha-stats/", env!("CARGO_PKG_VERSION"))),
        );

        let client = reqwest::blocking::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(HttpTransport { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str, query: &[(&str, String)]) -> Result<Response, GithubError> {
        let resp = self.client.get(url).query(query).send()?;

        let status = resp.status().as_u16();
        let url = resp.url().to_string();
        let rate_limit = RateLimit::from_headers(resp.headers());
        let next = resp
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(next_link);
        let body = resp.text()?;

        Ok(Response {
            status,
            url,
            rate_limit,
            next,
            body,
        })
    }
}

/// Extract the `rel="next"` URL from a `Link` header.
///
/// `<https://api.github.com/...&page=2>; rel="next", <...>; rel="last"`
pub fn next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|entry| {
        let mut parts = entry.split(';');
        let target = parts.next()?.trim();
        let is_next = parts.any(|param| {
            let param = param.trim();
            param == "rel=\"next\"" || param == "rel=next"
        });
        if !is_next {
            return None;
        }
        target
            .strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
            .map(str::to_string)
    })
}

/// GitHub REST client: authenticated GETs with `Link` pagination
pub struct GithubClient<T: Transport = HttpTransport> {
    transport: T,
    config: GithubConfig,
}

impl GithubClient<HttpTransport> {
    pub fn new(config: GithubConfig) -> Result<Self, GithubError> {
        let transport = HttpTransport::new(&config)?;
        Ok(GithubClient { transport, config })
    }
}

impl<T: Transport> GithubClient<T> {
    pub fn with_transport(transport: T, config: GithubConfig) -> Self {
        GithubClient { transport, config }
    }

    pub fn config(&self) -> &GithubConfig {
        &self.config
    }

    /// First page query used by every listing endpoint
    pub(crate) fn page_query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("page", String::from("1")),
            ("per_page", self.config.per_page.to_string()),
        ]
    }

    /// GET a single document
    pub fn get_json<D: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        repo: Option<&str>,
    ) -> Result<D, GithubError> {
        let response = self.transport.get(url, query)?;
        check_response(&response, repo)?;
        parse_body(&response)
    }

    /// GET `url` with `query`, then follow `next` links until there are none.
    ///
    /// `on_page` receives each page's decoded body in order. Follow-up pages
    /// are requested by their link URL alone, which already carries the query.
    /// Returns the number of pages fetched.
    pub fn get_pages<D, F>(
        &self,
        url: &str,
        query: &[(&str, String)],
        repo: Option<&str>,
        mut on_page: F,
    ) -> Result<usize, GithubError>
    where
        D: DeserializeOwned,
        F: FnMut(D) -> Result<(), GithubError>,
    {
        let mut response = self.transport.get(url, query)?;
        let mut pages = 0;

        loop {
            check_response(&response, repo)?;
            on_page(parse_body(&response)?)?;
            pages += 1;

            let Some(next) = response.next.take() else {
                break;
            };
            tracing::debug!(url = %next, page = pages + 1, "following next link");
            response = self.transport.get(&next, &[])?;
        }

        Ok(pages)
    }
}

fn parse_body<D: DeserializeOwned>(response: &Response) -> Result<D, GithubError> {
    serde_json::from_str(&response.body).map_err(|e| GithubError::InvalidResponse {
        url: response.url.clone(),
        reason: e.to_string(),
    })
}


#[cfg(test)]
mod tests {
    use super::testing::{client, FakeTransport};
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_next_link() {
        let header = r#"<https://api.github.com/organizations/47359/repos?page=2&per_page=100>; rel="next", <https://api.github.com/organizations/47359/repos?page=19&per_page=100>; rel="last""#;
        assert_eq!(
            next_link(header).as_deref(),
            Some("https://api.github.com/organizations/47359/repos?page=2&per_page=100")
        );
    }

    #[test]
    fn test_next_link_absent() {
        let header = r#"<https://api.github.com/repos?page=1>; rel="prev", <https://api.github.com/repos?page=1>; rel="first""#;
        assert_eq!(next_link(header), None);
        assert_eq!(next_link(""), None);
    }

    #[test]
    fn test_get_pages_follows_links() {
        let transport = FakeTransport::default();
        transport
            .push(json!([1, 2]), Some("https://api.github.com/x?page=2"))
            .push(json!([3]), Some("https://api.github.com/x?page=3"))
            .push(json!([]), None);

        let client = client(&transport);
        let mut seen = Vec::new();
        let pages = client
            .get_pages("https://api.github.com/x", &client.page_query(), None, |page: Vec<u32>| {
                seen.extend(page);
                Ok(())
            })
            .unwrap();

        assert_eq!(pages, 3);
        assert_eq!(seen, vec![1, 2, 3]);

        let requests = transport.requests.borrow();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].1, vec![
            (String::from("page"), String::from("1")),
            (String::from("per_page"), String::from("100")),
        ]);
        assert_eq!(requests[1].0, "https://api.github.com/x?page=2");
        assert!(requests[1].1.is_empty());
    }

    #[test]
    fn test_get_pages_stops_on_quota() {
        let transport = FakeTransport::default();
        transport.push(json!([1]), Some("https://api.github.com/x?page=2"));
        transport.push_response(Response {
            status: 403,
            url: String::from("https://api.github.com/x?page=2"),
            rate_limit: RateLimit::from_header_values(Some("5000"), Some("0"), Some("1614556800")),
            next: None,
            body: String::from(r#"{"message": "API rate limit exceeded"}"#),
        });

        let client = client(&transport);
        let err = client
            .get_pages("https://api.github.com/x", &[], Some("airflow"), |_: Value| Ok(()))
            .unwrap_err();
        assert!(matches!(err, GithubError::QuotaExceeded { .. }));
    }

    #[test]
    fn test_invalid_body() {
        let transport = FakeTransport::default();
        transport.push_response(Response {
            status: 200,
            url: String::from("https://api.github.com/x"),
            rate_limit: RateLimit::default(),
            next: None,
            body: String::from("<html>"),
        });

        let client = client(&transport);
        let err = client
            .get_json::<Value>("https://api.github.com/x", &[], None)
            .unwrap_err();
        assert!(matches!(err, GithubError::InvalidResponse { .. }));
    }

    #[test]
    fn test_config_url_joins_cleanly() {
        let config = GithubConfig {
            api_base: String::from("https://ghe.example.com/api/v3/"),
            ..GithubConfig::default()
        };
        assert_eq!(config.url("/orgs/apache/repos"), "https://ghe.example.com/api/v3/orgs/apache/repos");
    }
}
