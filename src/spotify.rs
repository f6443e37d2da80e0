//! Minimal bearer-authenticated Spotify Web API client.
//!
//! Only the five calls the publish pipeline needs are modelled. Every
//! non-2xx reply becomes [`Error::Status`]; nothing here retries.

use crate::error::{Error, Result};
use log::{debug, trace};
use reqwest::{RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlbumRef {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtistRef {
    pub name: String,
}

/// A track as returned by album listings and search.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteTrack {
    pub name: String,
    pub uri: String,
    /// Absent in album track listings
    pub album: Option<AlbumRef>,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
}

/// One page of results. The service occasionally sends `null` entries.
#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    items: Vec<Option<T>>,
}

impl<T> Page<T> {
    fn into_items(self) -> Vec<T> {
        self.items.into_iter().flatten().collect()
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: Option<Page<RemoteTrack>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExternalUrls {
    pub spotify: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemotePlaylist {
    pub id: String,
    pub name: String,
    pub external_urls: Option<ExternalUrls>,
}

impl RemotePlaylist {
    pub fn web_url(&self) -> Option<&str> {
        self.external_urls.as_ref()?.spotify.as_deref()
    }
}

#[derive(Debug, Serialize)]
struct NewPlaylist<'a> {
    name: &'a str,
    description: &'a str,
    public: bool,
}

#[derive(Debug, Serialize)]
struct AddTracks<'a> {
    uris: &'a [String],
}

#[derive(Debug, Deserialize)]
struct Snapshot {
    snapshot_id: Option<String>,
}

/// Web API client bound to one access token.
#[derive(Debug, Clone)]
pub struct SpotifyClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl SpotifyClient {
    /// `base_url` is the API root, e.g. `https://api.spotify.com/v1`.
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    /// `GET /me`
    pub async fn current_user(&self) -> Result<User> {
        let url = self.url(&["me"])?;
        self.send(self.http.get(url), "/me").await
    }

    /// `GET /albums/{id}/tracks`
    pub async fn album_tracks(&self, album_id: &str) -> Result<Vec<RemoteTrack>> {
        let url = self.url(&["albums", album_id, "tracks"])?;
        let page: Page<RemoteTrack> = self
            .send(self.http.get(url).query(&[("limit", "50")]), "/albums/{id}/tracks")
            .await?;
        Ok(page.into_items())
    }

    /// `GET /search?type=track`
    pub async fn search_tracks(&self, query: &str, limit: u32) -> Result<Vec<RemoteTrack>> {
        let url = self.url(&["search"])?;
        let limit = limit.to_string();
        let response: SearchResponse = self
            .send(
                self.http
                    .get(url)
                    .query(&[("q", query), ("type", "track"), ("limit", limit.as_str())]),
                "/search",
            )
            .await?;
        Ok(response.tracks.map(Page::into_items).unwrap_or_default())
    }

    /// `POST /users/{id}/playlists`
    pub async fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        description: &str,
        public: bool,
    ) -> Result<RemotePlaylist> {
        let url = self.url(&["users", user_id, "playlists"])?;
        let body = NewPlaylist { name, description, public };
        self.send(self.http.post(url).json(&body), "/users/{id}/playlists")
            .await
    }

    /// `POST /playlists/{id}/tracks`, returning the new snapshot id.
    pub async fn add_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<Option<String>> {
        let url = self.url(&["playlists", playlist_id, "tracks"])?;
        let snapshot: Snapshot = self
            .send(self.http.post(url).json(&AddTracks { uris }), "/playlists/{id}/tracks")
            .await?;
        Ok(snapshot.snapshot_id)
    }

    /// Base URL plus percent-encoded path segments.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| Error::Config(format!("invalid API URL '{}': {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|()| Error::Config(format!("API URL '{}' cannot have a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, endpoint: &str) -> Result<T> {
        trace!("Calling {endpoint}");
        let response = request.bearer_auth(&self.token).send().await?;
        let status = response.status();
        if !status.is_success() {
            debug!("{endpoint} answered {status}");
            return Err(Error::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> SpotifyClient {
        SpotifyClient::new(reqwest::Client::new(), format!("{}/v1", server.uri()), "tok")
    }

    #[tokio::test]
    async fn test_current_user_sends_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/me"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "user-1", "display_name": "Listener"
            })))
            .mount(&server)
            .await;

        let user = client(&server).current_user().await.unwrap();
        assert_eq!(user.id, "user-1");
        assert_eq!(user.display_name.as_deref(), Some("Listener"));
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/me"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        match client(&server).current_user().await {
            Err(Error::Status { endpoint, status }) => {
                assert_eq!(endpoint, "/me");
                assert_eq!(status, 401);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_search_skips_null_items() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .and(query_param("type", "track"))
            .and(query_param("limit", "5"))
            .and(query_param("q", "track:\"So What\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "tracks": { "items": [
                    null,
                    { "name": "So What", "uri": "spotify:track:1",
                      "album": { "name": "Kind Of Blue" }, "artists": [{ "name": "Miles Davis" }] }
                ]}
            })))
            .mount(&server)
            .await;

        let tracks = client(&server).search_tracks("track:\"So What\"", 5).await.unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].uri, "spotify:track:1");
        assert_eq!(tracks[0].artists[0].name, "Miles Davis");
    }

    #[tokio::test]
    async fn test_create_playlist_and_add_tracks() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/users/user%201/playlists"))
            .and(body_json(serde_json::json!({
                "name": "Mix", "description": "desc", "public": false
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "id": "pl-1", "name": "Mix",
                "external_urls": { "spotify": "https://open.spotify.com/playlist/pl-1" }
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/playlists/pl-1/tracks"))
            .and(body_json(serde_json::json!({ "uris": ["spotify:track:1"] })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "snapshot_id": "snap"
            })))
            .mount(&server)
            .await;

        let client = client(&server);
        let playlist = client.create_playlist("user 1", "Mix", "desc", false).await.unwrap();
        assert_eq!(playlist.web_url(), Some("https://open.spotify.com/playlist/pl-1"));

        let snapshot = client
            .add_tracks(&playlist.id, &["spotify:track:1".to_string()])
            .await
            .unwrap();
        assert_eq!(snapshot.as_deref(), Some("snap"));
    }

    #[test]
    fn test_url_joins_segments() {
        let client = SpotifyClient::new(reqwest::Client::new(), "https://api.example.com/v1/", "t");
        let url = client.url(&["albums", "abc", "tracks"]).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/albums/abc/tracks");
    }
}
