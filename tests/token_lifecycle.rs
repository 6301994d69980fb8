use assertr::prelude::*;
use leptos_spotify_auth::{AuthError, AuthEvent};
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

#[tokio::test]
async fn fresh_token_is_returned_without_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let fixture = common::fixture(common::options(&server.uri()));
    common::seed_tokens(&fixture, "access-1", Some("refresh-1"), 3600);

    let token = fixture.session.access_token().await.unwrap();

    assert_that(token).is_equal_to(Some("access-1".to_owned()));
}

#[tokio::test]
async fn no_stored_token_yields_none() {
    let fixture = common::fixture(common::options("http://localhost:1"));

    assert_that(fixture.session.access_token().await.unwrap()).is_equal_to(None);
    assert_that(fixture.session.is_authenticated()).is_false();
    assert_that(fixture.session.token_time_remaining()).is_equal_to("00:00".to_owned());
}

#[tokio::test]
async fn token_within_skew_is_refreshed_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=refresh-1"))
        .and(body_string_contains("client_id=test-client"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-2",
            "token_type": "Bearer",
            "expires_in": 3600,
            "refresh_token": "refresh-2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let fixture = common::fixture(common::options(&server.uri()));
    // Four minutes left, inside the five minute refresh window.
    common::seed_tokens(&fixture, "access-1", Some("refresh-1"), 4 * 60);

    let token = fixture.session.access_token().await.unwrap();

    assert_that(token).is_equal_to(Some("access-2".to_owned()));
    assert_that(fixture.stored("spotify_access_token")).is_equal_to(Some("access-2".to_owned()));
    assert_that(fixture.stored("spotify_refresh_token"))
        .is_equal_to(Some("refresh-2".to_owned()));
    assert_that(fixture.session.token_time_remaining().starts_with("59:")).is_true();
    assert_that(fixture.events())
        .is_equal_to(vec![AuthEvent::TokenRefreshed { expires_in: 3600 }]);
}

#[tokio::test]
async fn expired_token_is_refreshed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-2",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    let fixture = common::fixture(common::options(&server.uri()));
    common::seed_tokens(&fixture, "access-1", Some("refresh-1"), -60);
    assert_that(fixture.session.is_authenticated()).is_false();

    let token = fixture.session.access_token().await.unwrap();

    assert_that(token).is_equal_to(Some("access-2".to_owned()));
    assert_that(fixture.session.is_authenticated()).is_true();
}

#[tokio::test]
async fn refresh_keeps_refresh_token_when_not_rotated() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-2",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    let fixture = common::fixture(common::options(&server.uri()));
    common::seed_tokens(&fixture, "access-1", Some("refresh-1"), 3600);

    let payload = fixture.session.refresh_token().await.unwrap();

    assert_that(payload.refresh_token).is_equal_to(None);
    assert_that(fixture.stored("spotify_access_token")).is_equal_to(Some("access-2".to_owned()));
    assert_that(fixture.stored("spotify_refresh_token"))
        .is_equal_to(Some("refresh-1".to_owned()));
}

#[tokio::test]
async fn failed_refresh_yields_none_and_keeps_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Refresh token revoked"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let fixture = common::fixture(common::options(&server.uri()));
    common::seed_tokens(&fixture, "access-1", Some("refresh-1"), 60);

    let token = fixture.session.access_token().await.unwrap();

    assert_that(token).is_equal_to(None);
    assert_that(fixture.stored("spotify_access_token")).is_equal_to(Some("access-1".to_owned()));
    assert_that(fixture.events()).is_equal_to(vec![AuthEvent::RefreshFailed {
        message: "AuthError: Token request failed: Refresh token revoked".to_owned(),
    }]);
}

#[tokio::test]
async fn refresh_failure_is_surfaced_by_explicit_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let fixture = common::fixture(common::options(&server.uri()));
    common::seed_tokens(&fixture, "access-1", Some("refresh-1"), 3600);

    let err = fixture.session.refresh_token().await.unwrap_err();

    let AuthError::TokenExchangeFailed { description } = err else {
        panic!("expected TokenExchangeFailed, got {err:?}");
    };
    assert_that(description.as_str()).is_equal_to("Failed to refresh token");
}

#[tokio::test]
async fn refresh_without_refresh_token_fails() {
    let fixture = common::fixture(common::options("http://localhost:1"));
    common::seed_tokens(&fixture, "access-1", None, 60);

    let err = fixture.session.refresh_token().await.unwrap_err();
    assert!(matches!(err, AuthError::NoRefreshToken), "{err:?}");

    // Through `access_token`, this is just "log in again".
    assert_that(fixture.session.access_token().await.unwrap()).is_equal_to(None);
}

#[tokio::test]
async fn unreadable_expiry_counts_as_expired() {
    let fixture = common::fixture(common::options("http://localhost:1"));
    fixture.put("spotify_access_token", "access-1");
    fixture.put("spotify_expires_at", "not-a-number");

    assert_that(fixture.session.is_authenticated()).is_false();
    assert_that(fixture.session.token_time_remaining()).is_equal_to("00:00".to_owned());
}

#[tokio::test]
async fn expiry_at_minimum_date_is_treated_as_expired() {
    let fixture = common::fixture(common::options("http://localhost:1"));
    fixture.put("spotify_access_token", "access-1");
    fixture.put("spotify_expires_at", "-377705116800000");

    assert_that(fixture.session.access_token().await.unwrap()).is_equal_to(None);
    assert_that(fixture.session.is_authenticated()).is_false();
    assert_that(fixture.session.token_time_remaining()).is_equal_to("00:00".to_owned());
}

#[tokio::test]
async fn absurd_refreshed_lifetime_fails_the_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-2",
            "expires_in": 9_000_000_000_000_000_i64
        })))
        .expect(1)
        .mount(&server)
        .await;

    let fixture = common::fixture(common::options(&server.uri()));
    common::seed_tokens(&fixture, "access-1", Some("refresh-1"), 60);

    assert_that(fixture.session.access_token().await.unwrap()).is_equal_to(None);
    assert_that(fixture.stored("spotify_access_token")).is_equal_to(Some("access-1".to_owned()));
}

#[tokio::test]
async fn logout_is_idempotent() {
    let fixture = common::fixture(common::options("http://localhost:1"));
    common::seed_tokens(&fixture, "access-1", Some("refresh-1"), 3600);
    assert_that(fixture.session.is_authenticated()).is_true();

    fixture.session.logout();
    fixture.session.logout();

    assert_that(fixture.session.is_authenticated()).is_false();
    assert_that(fixture.stored("spotify_access_token")).is_equal_to(None);
    assert_that(fixture.stored("spotify_refresh_token")).is_equal_to(None);
    assert_that(fixture.stored("spotify_expires_at")).is_equal_to(None);
    assert_that(fixture.session.access_token().await.unwrap()).is_equal_to(None);
    assert_that(fixture.events())
        .is_equal_to(vec![AuthEvent::LoggedOut, AuthEvent::LoggedOut]);
}
