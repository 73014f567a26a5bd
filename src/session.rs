//! Authorization and storefront state shared between the client and its callers.
//!
//! State lives in a [`watch`] channel: callers read it synchronously with
//! [`Session::snapshot`] and observe changes through [`Session::subscribe`].
use crate::{
    client::{CatalogClient, ClientResult, Transport},
    model::StorefrontId,
};
use tokio::sync::watch;
use tracing::info;

/// Region used when none is known.
pub const DEFAULT_REGION: &str = "us";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionState {
    /// Developer token sent as the bearer credential on every request.
    pub developer_token: String,
    /// Token of the signed in user, required by personalized endpoints.
    pub user_token: Option<String>,
    /// Lowercase two letter region code.
    pub region: String,
    pub storefront: Option<StorefrontId>,
}

impl SessionState {
    /// Storefront to search in: the resolved one, else the region.
    pub fn country_code(&self) -> &str {
        self.storefront
            .as_deref()
            .filter(|storefront| !storefront.is_empty())
            .unwrap_or(&self.region)
    }
}

#[derive(Debug)]
pub struct Session {
    state: watch::Sender<SessionState>,
}

fn normalize_region(region: &str) -> String {
    let region = region.trim();
    if region.is_empty() {
        DEFAULT_REGION.to_owned()
    } else {
        region.to_lowercase()
    }
}

impl Session {
    pub fn new(developer_token: impl Into<String>, region: &str) -> Self {
        let (state, _) = watch::channel(SessionState {
            developer_token: developer_token.into(),
            user_token: None,
            region: normalize_region(region),
            storefront: None,
        });
        Self { state }
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receiver notified whenever the state changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn country_code(&self) -> String {
        self.state.borrow().country_code().to_owned()
    }

    /// Returns whether the state changed. Observers are only notified on change.
    pub fn set_user_token(&self, user_token: Option<String>) -> bool {
        let user_token = user_token.filter(|token| !token.is_empty());
        self.state.send_if_modified(|state| {
            if state.user_token == user_token {
                return false;
            }
            state.user_token = user_token;
            true
        })
    }

    pub fn set_region(&self, region: &str) -> bool {
        let region = normalize_region(region);
        self.state.send_if_modified(|state| {
            if state.region == region {
                return false;
            }
            state.region = region;
            true
        })
    }

    pub fn set_storefront(&self, storefront: StorefrontId) -> bool {
        self.state.send_if_modified(|state| {
            if state.storefront.as_ref() == Some(&storefront) {
                return false;
            }
            state.storefront = Some(storefront);
            true
        })
    }

    /// Look up and store the storefront for this session.
    ///
    /// Uses the user's account storefront when a user token is present,
    /// otherwise the storefront of the region. On failure the state is left
    /// untouched.
    pub async fn resolve_storefront<T: Transport>(
        &self,
        client: &CatalogClient<T>,
    ) -> ClientResult<StorefrontId> {
        let snapshot = self.snapshot();
        let storefront = match snapshot.user_token.as_deref() {
            Some(user_token) => {
                client
                    .lookup_user_storefront(&snapshot.developer_token, user_token)
                    .await?
            }
            None => {
                client
                    .lookup_storefront(&snapshot.region, &snapshot.developer_token)
                    .await?
            }
        };
        info!(%storefront, "Resolved storefront");
        self.set_storefront(storefront.clone());
        Ok(storefront)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{client::mock::MockTransport, request::Endpoint};
    use serde_json::json;

    fn client(status: u16, body: &str) -> CatalogClient<MockTransport> {
        CatalogClient::with_transport(Endpoint::default(), MockTransport::replying(status, body))
    }

    #[test]
    fn region_defaults_and_is_lowercased() {
        assert_eq!(Session::new("dev", "").snapshot().region, "us");
        assert_eq!(Session::new("dev", " GB ").snapshot().region, "gb");
    }

    #[test]
    fn country_code_prefers_storefront() {
        let session = Session::new("dev", "fr");
        assert_eq!(session.country_code(), "fr");
        session.set_storefront("ca".to_owned());
        assert_eq!(session.country_code(), "ca");
    }

    #[test]
    fn observers_see_changes_only() {
        let session = Session::new("dev", "us");
        let mut observer = session.subscribe();
        assert!(!observer.has_changed().unwrap());

        assert!(!session.set_region("US"));
        assert!(!observer.has_changed().unwrap());

        assert!(session.set_user_token(Some("user".to_owned())));
        assert!(observer.has_changed().unwrap());
        assert_eq!(
            observer.borrow_and_update().user_token.as_deref(),
            Some("user")
        );

        assert!(!session.set_user_token(Some("user".to_owned())));
        assert!(!observer.has_changed().unwrap());
        assert!(session.set_user_token(Some(String::new())));
        assert_eq!(session.snapshot().user_token, None);
    }

    #[tokio::test]
    async fn resolves_region_storefront_without_user_token() {
        let session = Session::new("dev", "jp");
        let client = client(200, &json!({"data": [{"id": "jp"}]}).to_string());

        assert_eq!(session.resolve_storefront(&client).await.unwrap(), "jp");
        assert_eq!(session.snapshot().storefront.as_deref(), Some("jp"));

        let requests = client.transport().requests();
        let request = &requests[0];
        assert!(request.url.ends_with("/v1/storefronts/jp"));
        assert_eq!(request.header("music-user-token"), None);
    }

    #[tokio::test]
    async fn resolves_user_storefront_with_user_token() {
        let session = Session::new("dev", "us");
        session.set_user_token(Some("user".to_owned()));
        let client = client(200, &json!({"data": [{"id": "se"}]}).to_string());

        assert_eq!(session.resolve_storefront(&client).await.unwrap(), "se");
        assert_eq!(session.country_code(), "se");
        let requests = client.transport().requests();
        let request = &requests[0];
        assert!(request.url.ends_with("/v1/me/storefront"));
        assert_eq!(request.header("music-user-token"), Some("user"));
    }

    #[tokio::test]
    async fn failed_resolution_leaves_state_untouched() {
        let session = Session::new("dev", "us");
        let before = session.snapshot();
        let client = client(500, "");

        assert!(session.resolve_storefront(&client).await.is_err());
        assert_eq!(session.snapshot(), before);
    }
}
