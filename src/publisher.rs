//! Publishes resolved tracks as a new private playlist.
//!
//! Three calls, in order: who am I, create the playlist, append every
//! resolved URI in one batch. The first failure stops the pipeline and is
//! reported as [`Error::PublishFailed`] naming the stage. A playlist created
//! before a failed append is left in place.

use crate::error::{Error, PublishStage, Result};
use crate::resolver::{Resolution, ResolutionSummary};
use crate::spotify::SpotifyClient;
use log::{debug, info};

pub const DEFAULT_PLAYLIST_NAME: &str = "Curated Soundscape";
pub const DEFAULT_DESCRIPTION: &str = "Curated for you from your favorite genres and moods";

/// What ended up on the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    pub playlist_id: String,
    pub playlist_url: Option<String>,
    pub added: usize,
    pub unresolved: usize,
}

impl PublishOutcome {
    /// Some curated tracks could not be found and were left out.
    pub fn is_partial(&self) -> bool {
        self.unresolved > 0
    }
}

/// Create a playlist named `name` holding every resolved track, in order.
///
/// Nothing is sent when no track resolved.
pub async fn publish(
    client: &SpotifyClient,
    name: &str,
    description: &str,
    resolutions: &[Resolution],
) -> Result<PublishOutcome> {
    let uris: Vec<String> = resolutions
        .iter()
        .filter_map(|r| r.uri().map(str::to_string))
        .collect();
    let summary = ResolutionSummary::of(resolutions);

    if uris.is_empty() {
        return Err(Error::NoResolvableTracks);
    }

    let user = client
        .current_user()
        .await
        .map_err(|e| e.at_stage(PublishStage::FetchUser))?;
    debug!("Publishing as user {}", user.id);

    let playlist = client
        .create_playlist(&user.id, name, description, false)
        .await
        .map_err(|e| e.at_stage(PublishStage::CreatePlaylist))?;
    info!("Created playlist '{}' ({})", playlist.name, playlist.id);

    let snapshot = client
        .add_tracks(&playlist.id, &uris)
        .await
        .map_err(|e| e.at_stage(PublishStage::AddTracks))?;
    debug!("Tracks appended, snapshot {snapshot:?}");

    info!(
        "Published {} tracks to '{}' ({} unresolved)",
        uris.len(),
        playlist.name,
        summary.unresolved
    );

    Ok(PublishOutcome {
        playlist_url: playlist.web_url().map(str::to_string),
        playlist_id: playlist.id,
        added: uris.len(),
        unresolved: summary.unresolved,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> SpotifyClient {
        SpotifyClient::new(reqwest::Client::new(), format!("{}/v1", server.uri()), "tok")
    }

    async fn mount_user(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/v1/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "u1" })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_zero_resolved_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let resolutions = vec![Resolution::Unresolved, Resolution::Unresolved];
        let result = publish(&client(&server), DEFAULT_PLAYLIST_NAME, DEFAULT_DESCRIPTION, &resolutions).await;
        assert!(matches!(result, Err(Error::NoResolvableTracks)));
    }

    #[tokio::test]
    async fn test_partial_publish_keeps_order() {
        let server = MockServer::start().await;
        mount_user(&server).await;
        Mock::given(method("POST"))
            .and(path("/v1/users/u1/playlists"))
            .and(body_json(serde_json::json!({
                "name": "Late Night", "description": DEFAULT_DESCRIPTION, "public": false
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "id": "pl9", "name": "Late Night",
                "external_urls": { "spotify": "https://open.spotify.com/playlist/pl9" }
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/playlists/pl9/tracks"))
            .and(body_json(serde_json::json!({ "uris": ["spotify:track:a", "spotify:track:c"] })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({ "snapshot_id": "s" })))
            .expect(1)
            .mount(&server)
            .await;

        let resolutions = vec![
            Resolution::Resolved("spotify:track:a".to_string()),
            Resolution::Unresolved,
            Resolution::Resolved("spotify:track:c".to_string()),
        ];
        let outcome = publish(&client(&server), "Late Night", DEFAULT_DESCRIPTION, &resolutions)
            .await
            .unwrap();

        assert_eq!(outcome.playlist_id, "pl9");
        assert_eq!(outcome.playlist_url.as_deref(), Some("https://open.spotify.com/playlist/pl9"));
        assert_eq!(outcome.added, 2);
        assert_eq!(outcome.unresolved, 1);
        assert!(outcome.is_partial());
    }

    #[tokio::test]
    async fn test_failure_names_the_stage() {
        let server = MockServer::start().await;
        mount_user(&server).await;
        Mock::given(method("POST"))
            .and(path("/v1/users/u1/playlists"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let resolutions = vec![Resolution::Resolved("spotify:track:a".to_string())];
        match publish(&client(&server), "x", "y", &resolutions).await {
            Err(Error::PublishFailed { stage, status, reason }) => {
                assert_eq!(stage, PublishStage::CreatePlaylist);
                assert_eq!(status, Some(403));
                assert!(reason.contains("403"));
            }
            other => panic!("expected PublishFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unauthorized_user_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/me"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let resolutions = vec![Resolution::Resolved("spotify:track:a".to_string())];
        let err = publish(&client(&server), "x", "y", &resolutions).await.unwrap_err();
        assert!(matches!(
            err,
            Error::PublishFailed { stage: PublishStage::FetchUser, status: Some(401), .. }
        ));
    }

    #[tokio::test]
    async fn test_add_tracks_failure_names_stage() {
        let server = MockServer::start().await;
        mount_user(&server).await;
        Mock::given(method("POST"))
            .and(path("/v1/users/u1/playlists"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "id": "p", "name": "x"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/playlists/p/tracks"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;
        // The created playlist is never deleted
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let resolutions = vec![Resolution::Resolved("spotify:track:a".to_string())];
        match publish(&client(&server), "x", "y", &resolutions).await {
            Err(Error::PublishFailed { stage, status, reason }) => {
                assert_eq!(stage, PublishStage::AddTracks);
                assert_eq!(status, Some(500));
                assert!(reason.contains("/playlists/{id}/tracks"));
            }
            other => panic!("expected PublishFailed, got {other:?}"),
        }
    }
}
