//! HTTP client for the Tapestry social-graph REST API.
//!
//! Wraps `reqwest` with Tapestry-specific error handling, API key management,
//! and typed response deserialization. Tapestry authenticates every call via
//! an `apiKey` query parameter; non-success statuses surface as
//! [`TapestryError::Api`] with the upstream body kept verbatim so proxy
//! routes can forward it.

use std::time::Duration;

use reqwest::{Client, Url};

use crate::error::TapestryError;
use crate::types::{
    Comment, Content, CreateCommentRequest, CreateContentRequest, CreateProfileRequest,
    EdgeRequest, FeedItem, FeedResponse, FollowStateResponse, Profile, ProfileItem,
    ProfilesResponse, UpdateProfileRequest,
};

const DEFAULT_BASE_URL: &str = "https://api.usetapestry.dev/api/v1";

/// How a profile list lookup is keyed.
#[derive(Debug, Clone, Copy)]
pub enum ProfileLookup<'a> {
    WalletAddress(&'a str),
    Username(&'a str),
}

/// Client for the Tapestry REST API.
///
/// Manages the HTTP client, API key, and base URL. Use [`TapestryClient::new`]
/// for production or [`TapestryClient::with_base_url`] to point at a mock
/// server in tests.
pub struct TapestryClient {
    client: Client,
    api_key: String,
    base_url: Url,
}

impl TapestryClient {
    /// Creates a new client pointed at the production Tapestry API.
    ///
    /// # Errors
    ///
    /// Returns [`TapestryError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, TapestryError> {
        Self::with_base_url(api_key, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a new client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`TapestryError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`TapestryError::InvalidBaseUrl`] if
    /// `base_url` does not parse into a URL that can carry path segments.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, TapestryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("tapred/0.1 (social-frontend)")
            .build()?;

        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| TapestryError::InvalidBaseUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(TapestryError::InvalidBaseUrl(base_url.to_string()));
        }

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url,
        })
    }

    // -----------------------------------------------------------------------
    // Profiles
    // -----------------------------------------------------------------------

    /// Looks up profiles by wallet address or username.
    ///
    /// Calls `GET /profiles` and returns the (possibly empty) profile list.
    ///
    /// # Errors
    ///
    /// - [`TapestryError::Api`] on a non-success upstream status.
    /// - [`TapestryError::Http`] on network failure.
    /// - [`TapestryError::Deserialize`] if the response does not match the
    ///   expected shape.
    pub async fn find_profiles(
        &self,
        lookup: ProfileLookup<'_>,
    ) -> Result<Vec<ProfileItem>, TapestryError> {
        let (key, value) = match lookup {
            ProfileLookup::WalletAddress(wallet) => ("walletAddress", wallet),
            ProfileLookup::Username(username) => ("username", username),
        };
        let url = self.endpoint(&["profiles"], &[(key, value)])?;
        let body = self.request_json(self.client.get(url.clone()), &url).await?;
        let parsed: ProfilesResponse = Self::decode(body, "findProfiles")?;
        Ok(parsed.profiles)
    }

    /// Fetches a single profile (with wallet and social counters) by username.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`TapestryClient::find_profiles`].
    pub async fn get_profile(&self, username: &str) -> Result<ProfileItem, TapestryError> {
        let url = self.endpoint(&["profiles", username], &[])?;
        let body = self.request_json(self.client.get(url.clone()), &url).await?;
        Self::decode(body, &format!("getProfile({username})"))
    }

    /// Updates a profile's username, bio, and/or image.
    ///
    /// The `bio` in the request is stored verbatim; callers are responsible
    /// for packing any metadata into it first.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`TapestryClient::find_profiles`].
    pub async fn update_profile(
        &self,
        username: &str,
        request: &UpdateProfileRequest,
    ) -> Result<Profile, TapestryError> {
        let url = self.endpoint(&["profiles", username], &[])?;
        let body = self
            .request_json(self.client.put(url.clone()).json(request), &url)
            .await?;
        Self::decode(body, &format!("updateProfile({username})"))
    }

    /// Creates a profile for a wallet, or returns the existing one.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`TapestryClient::find_profiles`].
    pub async fn create_profile(
        &self,
        request: &CreateProfileRequest,
    ) -> Result<ProfileItem, TapestryError> {
        let url = self.endpoint(&["profiles", "findOrCreate"], &[])?;
        let body = self
            .request_json(self.client.post(url.clone()).json(request), &url)
            .await?;
        Self::decode(body, "createProfile")
    }

    // -----------------------------------------------------------------------
    // Contents
    // -----------------------------------------------------------------------

    /// Fetches the flat global content feed.
    ///
    /// The upstream list carries no ordering contract; callers sort.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`TapestryClient::find_profiles`].
    pub async fn get_feed(&self) -> Result<Vec<FeedItem>, TapestryError> {
        let url = self.endpoint(&["contents", ""], &[])?;
        let body = self.request_json(self.client.get(url.clone()), &url).await?;
        let parsed: FeedResponse = Self::decode(body, "getFeed")?;
        Ok(parsed.contents)
    }

    /// Creates a content record. `content` is stored verbatim; callers pack
    /// any channel tag into it first.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`TapestryClient::find_profiles`].
    pub async fn create_content(
        &self,
        request: &CreateContentRequest,
    ) -> Result<Content, TapestryError> {
        let url = self.endpoint(&["contents", ""], &[])?;
        let body = self
            .request_json(self.client.post(url.clone()).json(request), &url)
            .await?;
        Self::decode(body, "createContent")
    }

    /// Comments on a content record.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`TapestryClient::find_profiles`].
    pub async fn create_comment(
        &self,
        request: &CreateCommentRequest,
    ) -> Result<Comment, TapestryError> {
        let url = self.endpoint(&["comments", ""], &[])?;
        let body = self
            .request_json(self.client.post(url.clone()).json(request), &url)
            .await?;
        Self::decode(body, "createComment")
    }

    /// Likes a content node on behalf of a profile.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`TapestryClient::find_profiles`].
    pub async fn like(&self, node_id: &str, profile_id: &str) -> Result<(), TapestryError> {
        let url = self.endpoint(&["likes", node_id], &[])?;
        let edge = EdgeRequest {
            start_id: profile_id,
            end_id: None,
        };
        self.request_json(self.client.post(url.clone()).json(&edge), &url)
            .await?;
        Ok(())
    }

    /// Removes a like edge.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`TapestryClient::find_profiles`].
    pub async fn unlike(&self, node_id: &str, profile_id: &str) -> Result<(), TapestryError> {
        let url = self.endpoint(&["likes", node_id], &[])?;
        let edge = EdgeRequest {
            start_id: profile_id,
            end_id: None,
        };
        self.request_json(self.client.delete(url.clone()).json(&edge), &url)
            .await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Follows
    // -----------------------------------------------------------------------

    /// Creates a follow edge between two usernames.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`TapestryClient::find_profiles`].
    pub async fn follow(&self, follower: &str, followee: &str) -> Result<(), TapestryError> {
        let url = self.endpoint(&["followers", "add"], &[])?;
        let edge = EdgeRequest {
            start_id: follower,
            end_id: Some(followee),
        };
        self.request_json(self.client.post(url.clone()).json(&edge), &url)
            .await?;
        Ok(())
    }

    /// Removes a follow edge between two usernames.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`TapestryClient::find_profiles`].
    pub async fn unfollow(&self, follower: &str, followee: &str) -> Result<(), TapestryError> {
        let url = self.endpoint(&["followers", "remove"], &[])?;
        let edge = EdgeRequest {
            start_id: follower,
            end_id: Some(followee),
        };
        self.request_json(self.client.post(url.clone()).json(&edge), &url)
            .await?;
        Ok(())
    }

    /// Whether `follower` currently follows `followee`.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`TapestryClient::find_profiles`].
    pub async fn follow_state(&self, follower: &str, followee: &str) -> Result<bool, TapestryError> {
        let url = self.endpoint(
            &["followers", "state"],
            &[("startId", follower), ("endId", followee)],
        )?;
        let body = self.request_json(self.client.get(url.clone()), &url).await?;
        let parsed: FollowStateResponse = Self::decode(body, "followState")?;
        Ok(parsed.is_following)
    }

    // -----------------------------------------------------------------------
    // Plumbing
    // -----------------------------------------------------------------------

    /// Builds a request URL from path segments and query parameters, always
    /// appending the `apiKey` credential. Segments and values are
    /// percent-encoded by the `url` crate.
    fn endpoint(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url, TapestryError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| TapestryError::InvalidBaseUrl(self.base_url.to_string()))?;
            path.pop_if_empty();
            path.extend(segments);
        }
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("apiKey", &self.api_key);
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Sends the request, maps non-success statuses to [`TapestryError::Api`],
    /// and parses the body as JSON.
    async fn request_json(
        &self,
        request: reqwest::RequestBuilder,
        url: &Url,
    ) -> Result<serde_json::Value, TapestryError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), url = %url, "tapestry request failed");
            return Err(TapestryError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        serde_json::from_str(&body).map_err(|e| TapestryError::Deserialize {
            context: url.to_string(),
            source: e,
        })
    }

    /// Deserializes an already-parsed JSON body into the expected type.
    fn decode<T: serde::de::DeserializeOwned>(
        body: serde_json::Value,
        context: &str,
    ) -> Result<T, TapestryError> {
        serde_json::from_value(body).map_err(|e| TapestryError::Deserialize {
            context: context.to_string(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(base_url: &str) -> TapestryClient {
        TapestryClient::with_base_url("test-key", 30, base_url)
            .expect("client construction should not fail")
    }

    #[test]
    fn endpoint_appends_api_key_and_segments() {
        let client = test_client("https://api.usetapestry.dev/api/v1");
        let url = client
            .endpoint(&["profiles", "alice"], &[])
            .expect("endpoint should build");
        assert_eq!(
            url.as_str(),
            "https://api.usetapestry.dev/api/v1/profiles/alice?apiKey=test-key"
        );
    }

    #[test]
    fn endpoint_strips_trailing_slash_from_base() {
        let client = test_client("https://api.usetapestry.dev/api/v1/");
        let url = client
            .endpoint(&["contents", ""], &[])
            .expect("endpoint should build");
        assert_eq!(
            url.as_str(),
            "https://api.usetapestry.dev/api/v1/contents/?apiKey=test-key"
        );
    }

    #[test]
    fn endpoint_encodes_query_values() {
        let client = test_client("https://api.usetapestry.dev/api/v1");
        let url = client
            .endpoint(&["profiles"], &[("username", "a b&c")])
            .expect("endpoint should build");
        assert!(
            url.as_str().contains("username=a+b%26c"),
            "query param should be encoded: {url}"
        );
    }

    #[test]
    fn with_base_url_rejects_garbage() {
        let result = TapestryClient::with_base_url("k", 30, "not a url");
        assert!(matches!(result, Err(TapestryError::InvalidBaseUrl(_))));
    }
}
