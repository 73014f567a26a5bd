//! Construction of outbound catalog requests. Nothing here performs I/O.
use reqwest::Method;
use url::form_urlencoded;

pub const DEFAULT_API_ROOT: &str = "https://api.music.apple.com";
pub const DEFAULT_SEARCH_LIMIT: u32 = 10;
/// Header carrying the per-user token on personalized endpoints.
pub const USER_TOKEN_HEADER: &str = "music-user-token";
const AUTHORIZATION_HEADER: &str = "authorization";
const SEARCH_TYPES: &str = "songs,albums";

/// Everything needed to issue one HTTP request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
}

impl RequestDescriptor {
    fn get(url: String, bearer_token: &str) -> Self {
        Self {
            method: Method::GET,
            url,
            headers: vec![(AUTHORIZATION_HEADER, format!("Bearer {bearer_token}"))],
        }
    }

    #[must_use]
    fn with_header(mut self, name: &'static str, value: &str) -> Self {
        self.headers.push((name, value.to_owned()));
        self
    }

    /// Look up a header value, ignoring ASCII case in the name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// The catalog service root and the search page size.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    root: String,
    search_limit: u32,
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::new(DEFAULT_API_ROOT, DEFAULT_SEARCH_LIMIT)
    }
}

impl Endpoint {
    pub fn new(root: &str, search_limit: u32) -> Self {
        Self {
            root: root.trim_end_matches('/').to_owned(),
            search_limit,
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub const fn search_limit(&self) -> u32 {
        self.search_limit
    }

    /// Catalog search for songs and albums within a storefront.
    pub fn search_request(
        &self,
        term: &str,
        country_code: &str,
        bearer_token: &str,
    ) -> RequestDescriptor {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("term", term)
            .append_pair("limit", &self.search_limit.to_string())
            .append_pair("types", SEARCH_TYPES)
            .finish();
        let url = format!(
            "{}/v1/catalog/{}/search?{query}",
            self.root,
            path_segment(country_code)
        );
        RequestDescriptor::get(url, bearer_token)
    }

    /// Resolve a region code to its storefront.
    pub fn storefront_lookup_request(
        &self,
        region_code: &str,
        bearer_token: &str,
    ) -> RequestDescriptor {
        let url = format!("{}/v1/storefronts/{}", self.root, path_segment(region_code));
        RequestDescriptor::get(url, bearer_token)
    }

    /// Storefront of the account the user token belongs to.
    pub fn user_storefront_request(&self, bearer_token: &str, user_token: &str) -> RequestDescriptor {
        RequestDescriptor::get(format!("{}/v1/me/storefront", self.root), bearer_token)
            .with_header(USER_TOKEN_HEADER, user_token)
    }
}

fn path_segment(raw: &str) -> String {
    // Form encoding writes a space as `+`, which a path reads literally. A
    // literal `+` is already escaped to `%2B`, so every `+` left is a space.
    form_urlencoded::byte_serialize(raw.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

pub fn build_search_request(term: &str, country_code: &str, bearer_token: &str) -> RequestDescriptor {
    Endpoint::default().search_request(term, country_code, bearer_token)
}

pub fn build_storefront_lookup_request(region_code: &str, bearer_token: &str) -> RequestDescriptor {
    Endpoint::default().storefront_lookup_request(region_code, bearer_token)
}

pub fn build_user_storefront_request(bearer_token: &str, user_token: &str) -> RequestDescriptor {
    Endpoint::default().user_storefront_request(bearer_token, user_token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_request_targets_storefront_catalog() {
        let request = build_search_request("daft punk", "us", "dev-token");
        assert_eq!(request.method, Method::GET);
        assert_eq!(
            request.url,
            "https://api.music.apple.com/v1/catalog/us/search?term=daft+punk&limit=10&types=songs%2Calbums"
        );
        assert_eq!(request.header("Authorization"), Some("Bearer dev-token"));
        assert_eq!(request.header(USER_TOKEN_HEADER), None);
    }

    #[test]
    fn search_term_is_encoded() {
        let request = build_search_request("AC/DC & friends?", "gb", "t");
        assert!(
            request
                .url
                .ends_with("search?term=AC%2FDC+%26+friends%3F&limit=10&types=songs%2Calbums"),
            "{}",
            request.url
        );
    }

    #[test]
    fn endpoint_controls_root_and_limit() {
        let endpoint = Endpoint::new("http://localhost:8080/", 25);
        let request = endpoint.search_request("x", "jp", "t");
        assert_eq!(
            request.url,
            "http://localhost:8080/v1/catalog/jp/search?term=x&limit=25&types=songs%2Calbums"
        );
        assert_eq!(endpoint.root(), "http://localhost:8080");
        assert_eq!(endpoint.search_limit(), 25);
    }

    #[test]
    fn storefront_lookup_request() {
        let request = build_storefront_lookup_request("fr", "dev-token");
        assert_eq!(request.url, "https://api.music.apple.com/v1/storefronts/fr");
        assert_eq!(request.headers, [("authorization", "Bearer dev-token".to_owned())]);
    }

    #[test]
    fn path_segments_escape_spaces_and_separators() {
        let request = build_storefront_lookup_request("new zealand", "t");
        assert!(request.url.ends_with("/v1/storefronts/new%20zealand"), "{}", request.url);

        let request = build_storefront_lookup_request("a+b/c", "t");
        assert!(request.url.ends_with("/v1/storefronts/a%2Bb%2Fc"), "{}", request.url);

        let request = build_search_request("x", "n z", "t");
        assert!(request.url.contains("/v1/catalog/n%20z/search?"), "{}", request.url);
    }

    #[test]
    fn user_storefront_request_carries_both_tokens() {
        let request = build_user_storefront_request("dev-token", "user-token");
        assert_eq!(request.url, "https://api.music.apple.com/v1/me/storefront");
        assert_eq!(request.header("authorization"), Some("Bearer dev-token"));
        assert_eq!(request.header("Music-User-Token"), Some("user-token"));
    }

    #[test]
    fn builders_are_deterministic() {
        assert_eq!(
            build_search_request("a", "us", "t"),
            build_search_request("a", "us", "t")
        );
    }
}
