use axum::http::{header, HeaderValue, StatusCode};
use axum_test::TestServer;

use super::{build_router, AppState};
use crate::config::AuthConfig;
use crate::db::{create_test_pool, migrations};
use crate::forms::FormData;
use crate::models::{NewRedactor, Redactor};
use crate::services::hash_password;
use crate::view::TemplateEngine;

const PASSWORD: &str = "s3cure-pass";

async fn setup() -> (TestServer, AppState) {
    let pool = create_test_pool().await.unwrap();
    migrations::run_migrations(&pool).await.unwrap();
    let state = AppState::new(pool, TemplateEngine::new().unwrap(), &AuthConfig::default());
    let server = TestServer::new(build_router(state.clone())).unwrap();
    (server, state)
}

async fn create_redactor(state: &AppState, username: &str, is_staff: bool) -> Redactor {
    let mut new = NewRedactor::new(username, hash_password(PASSWORD).unwrap());
    new.is_staff = is_staff;
    state.redactors.insert(&new).await.unwrap()
}

/// Log in through the form and return the `Cookie` header for later requests
async fn login(server: &TestServer, username: &str) -> HeaderValue {
    let response = server
        .post("/accounts/login/")
        .form(&[("username", username), ("password", PASSWORD)])
        .await;
    assert_eq!(response.status_code(), StatusCode::FOUND);

    let pair = response.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();
    assert!(pair.starts_with("session="));
    HeaderValue::from_str(&pair).unwrap()
}

fn location(response: &axum_test::TestResponse) -> String {
    response.headers()[header::LOCATION]
        .to_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_dashboard_is_public_and_shows_counts() {
    let (server, state) = setup().await;
    state
        .topics
        .create(&FormData::from_pairs([("name", "Economy")]))
        .await
        .unwrap();

    let response = server.get("/").await;
    response.assert_status_ok();
    let html = response.text();
    assert!(html.contains("Topics</a>: <strong>1</strong>"));
    assert!(html.contains("Newspapers</a>: <strong>0</strong>"));
}

#[tokio::test]
async fn test_anonymous_crud_requests_redirect_to_login() {
    let (server, _) = setup().await;

    for path in [
        "/topics/",
        "/topics/create/",
        "/topics/1/update/",
        "/topics/1/delete/",
        "/redactors/",
        "/redactors/1/",
        "/redactors/create/",
        "/redactors/1/update/",
        "/redactors/1/delete/",
        "/newspapers/",
        "/newspapers/1/",
        "/newspapers/create/",
        "/newspapers/1/update/",
        "/newspapers/1/delete/",
    ] {
        let response = server.get(path).await;
        assert_eq!(response.status_code(), StatusCode::FOUND, "{}", path);
        assert_eq!(
            location(&response),
            format!("/accounts/login/?next={}", urlencoding::encode(path))
        );
    }

    let response = server
        .post("/topics/create/")
        .form(&[("name", "Sneaky")])
        .await;
    assert_eq!(response.status_code(), StatusCode::FOUND);
    assert!(location(&response).starts_with("/accounts/login/"));
}

#[tokio::test]
async fn test_login_with_bad_password_rerenders_form() {
    let (server, state) = setup().await;
    create_redactor(&state, "jane", false).await;

    let response = server
        .post("/accounts/login/")
        .form(&[("username", "jane"), ("password", "wrong-password")])
        .await;

    response.assert_status_ok();
    let html = response.text();
    assert!(html.contains("Please enter a correct username and password."));
    assert!(html.contains(r#"value="jane""#));
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_login_follows_safe_next_only() {
    let (server, state) = setup().await;
    create_redactor(&state, "jane", false).await;

    let response = server
        .post("/accounts/login/")
        .form(&[("username", "jane"), ("password", PASSWORD), ("next", "/newspapers/")])
        .await;
    assert_eq!(location(&response), "/newspapers/");

    let response = server
        .post("/accounts/login/")
        .form(&[
            ("username", "jane"),
            ("password", PASSWORD),
            ("next", "//evil.example.com/"),
        ])
        .await;
    assert_eq!(location(&response), "/");

    for next in ["/\t/evil.example.com/", "/\n/evil.example.com/"] {
        let response = server
            .post("/accounts/login/")
            .form(&[("username", "jane"), ("password", PASSWORD), ("next", next)])
            .await;
        assert_eq!(location(&response), "/", "{:?}", next);
    }
}

#[tokio::test]
async fn test_logout_ends_session() {
    let (server, state) = setup().await;
    create_redactor(&state, "jane", false).await;
    let cookie = login(&server, "jane").await;

    server
        .get("/topics/")
        .add_header(header::COOKIE, cookie.clone())
        .await
        .assert_status_ok();

    let response = server
        .post("/accounts/logout/")
        .add_header(header::COOKIE, cookie.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::FOUND);
    assert!(response.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .contains("Max-Age=0"));

    let response = server
        .get("/topics/")
        .add_header(header::COOKIE, cookie)
        .await;
    assert_eq!(response.status_code(), StatusCode::FOUND);
}

#[tokio::test]
async fn test_topic_list_paginates_by_five() {
    let (server, state) = setup().await;
    create_redactor(&state, "jane", false).await;
    for i in 0..15 {
        state
            .topics
            .create(&FormData::from_pairs([("name", format!("Topic {:02}", i).as_str())]))
            .await
            .unwrap();
    }
    let cookie = login(&server, "jane").await;

    let response = server
        .get("/topics/")
        .add_header(header::COOKIE, cookie.clone())
        .await;
    response.assert_status_ok();
    let html = response.text();
    assert_eq!(html.matches("/update/\">Update</a>").count(), 5);
    assert!(html.contains("Page 1 of 3"));
    assert!(html.contains("Topic 00"));
    assert!(!html.contains("Topic 05"));

    let response = server
        .get("/topics/?page=3")
        .add_header(header::COOKIE, cookie.clone())
        .await;
    assert!(response.text().contains("Topic 14"));

    let response = server
        .get("/topics/?page=4")
        .add_header(header::COOKIE, cookie)
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_post_to_list_is_method_not_allowed() {
    let (server, state) = setup().await;
    create_redactor(&state, "jane", false).await;
    let cookie = login(&server, "jane").await;

    for path in ["/topics/", "/redactors/", "/newspapers/"] {
        let response = server
            .post(path)
            .add_header(header::COOKIE, cookie.clone())
            .await;
        assert_eq!(
            response.status_code(),
            StatusCode::METHOD_NOT_ALLOWED,
            "{}",
            path
        );
    }
}

#[tokio::test]
async fn test_topic_create_and_duplicate() {
    let (server, state) = setup().await;
    create_redactor(&state, "jane", false).await;
    let cookie = login(&server, "jane").await;

    let response = server
        .post("/topics/create/")
        .add_header(header::COOKIE, cookie.clone())
        .form(&[("name", "Culture")])
        .await;
    assert_eq!(response.status_code(), StatusCode::FOUND);
    assert_eq!(location(&response), "/topics/");
    assert!(state.topics.get_by_name("Culture").await.unwrap().is_some());

    let response = server
        .post("/topics/create/")
        .add_header(header::COOKIE, cookie)
        .form(&[("name", "Culture")])
        .await;
    response.assert_status_ok();
    assert!(response
        .text()
        .contains("Topic with this name already exists."));
}

#[tokio::test]
async fn test_unknown_id_renders_not_found_page() {
    let (server, state) = setup().await;
    create_redactor(&state, "jane", false).await;
    let cookie = login(&server, "jane").await;

    let response = server
        .get("/newspapers/999/")
        .add_header(header::COOKIE, cookie)
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert!(response.text().contains("<h1>Not found</h1>"));
    assert!(response.text().contains("Back to the dashboard"));
}

#[tokio::test]
async fn test_non_numeric_id_is_not_found() {
    let (server, state) = setup().await;
    create_redactor(&state, "chief", true).await;
    let cookie = login(&server, "chief").await;

    for path in [
        "/topics/abc/update/",
        "/newspapers/abc/",
        "/redactors/1x/delete/",
        "/admin/topic/abc/change/",
    ] {
        let response = server
            .get(path)
            .add_header(header::COOKIE, cookie.clone())
            .await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND, "{}", path);
        assert!(response.text().contains("<h1>Not found</h1>"), "{}", path);
    }
}

#[tokio::test]
async fn test_newspaper_title_filter() {
    let (server, state) = setup().await;
    create_redactor(&state, "jane", false).await;
    for title in ["Election vote counted", "Harvest report"] {
        state
            .newspapers
            .create(&FormData::from_pairs([
                ("title", title),
                ("content", "Body"),
                ("published_date", "2024-02-01"),
            ]))
            .await
            .unwrap();
    }
    let cookie = login(&server, "jane").await;

    let response = server
        .get("/newspapers/?title=VOTE")
        .add_header(header::COOKIE, cookie)
        .await;
    response.assert_status_ok();
    let html = response.text();
    assert!(html.contains("Election vote counted"));
    assert!(!html.contains("Harvest report"));
    assert!(html.contains(r#"value="VOTE""#));
}

#[tokio::test]
async fn test_redactor_update_keeps_password_when_blank() {
    let (server, state) = setup().await;
    let jane = create_redactor(&state, "jane", false).await;
    let cookie = login(&server, "jane").await;

    let years = "12";
    let response = server
        .post(&format!("/redactors/{}/update/", jane.id))
        .add_header(header::COOKIE, cookie)
        .form(&[
            ("username", "jane"),
            ("years_of_experience", years),
            ("password1", ""),
            ("password2", ""),
        ])
        .await;
    assert_eq!(response.status_code(), StatusCode::FOUND);

    let updated = state.redactors.get(jane.id).await.unwrap();
    assert_eq!(updated.years_of_experience, 12);
    assert_eq!(updated.password_hash, jane.password_hash);
}

#[tokio::test]
async fn test_admin_requires_staff() {
    let (server, state) = setup().await;
    create_redactor(&state, "writer", false).await;
    create_redactor(&state, "chief", true).await;

    let response = server.get("/admin/").await;
    assert_eq!(response.status_code(), StatusCode::FOUND);

    let writer = login(&server, "writer").await;
    let response = server
        .get("/admin/")
        .add_header(header::COOKIE, writer)
        .await;
    assert_eq!(response.status_code(), StatusCode::FOUND);
    assert_eq!(location(&response), "/accounts/login/?next=%2Fadmin%2F");

    let chief = login(&server, "chief").await;
    let response = server
        .get("/admin/")
        .add_header(header::COOKIE, chief)
        .await;
    response.assert_status_ok();
    assert!(response.text().contains("/admin/newspaper/"));
}

#[tokio::test]
async fn test_admin_changelist_order_search_and_filters() {
    let (server, state) = setup().await;
    create_redactor(&state, "chief", true).await;
    let sport = state
        .topics
        .create(&FormData::from_pairs([("name", "Sport")]))
        .await
        .unwrap();
    let sport_id = sport.id.to_string();
    for (title, date, topic) in [
        ("First final", "2022-05-01", Some(sport_id.as_str())),
        ("Second final", "2023-05-01", Some(sport_id.as_str())),
        ("Budget talks", "2023-07-01", None),
    ] {
        let mut data = FormData::from_pairs([
            ("title", title),
            ("content", "Body"),
            ("published_date", date),
        ]);
        if let Some(topic) = topic {
            data.append("topic", topic);
        }
        state.newspapers.create(&data).await.unwrap();
    }
    let cookie = login(&server, "chief").await;

    let html = server
        .get("/admin/newspaper/")
        .add_header(header::COOKIE, cookie.clone())
        .await
        .text();
    let budget = html.find("Budget talks").unwrap();
    let second = html.find("Second final").unwrap();
    let first = html.find("First final").unwrap();
    assert!(budget < second && second < first);

    let html = server
        .get("/admin/newspaper/?published_date__year=2023")
        .add_header(header::COOKIE, cookie.clone())
        .await
        .text();
    assert!(html.contains("Second final"));
    assert!(!html.contains("First final"));

    let html = server
        .get(&format!("/admin/newspaper/?topic={}&q=second", sport.id))
        .add_header(header::COOKIE, cookie.clone())
        .await
        .text();
    assert!(html.contains("Second final"));
    assert!(!html.contains("First final"));
    assert!(!html.contains("Budget talks"));

    let response = server
        .get("/admin/unknown/")
        .add_header(header::COOKIE, cookie)
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_redactor_add_form_and_save() {
    let (server, state) = setup().await;
    create_redactor(&state, "chief", true).await;
    let cookie = login(&server, "chief").await;

    let response = server
        .get("/admin/redactor/add/")
        .add_header(header::COOKIE, cookie.clone())
        .await;
    response.assert_status_ok();
    let html = response.text();
    assert!(html.contains("Years of experience"));
    assert!(html.contains("Additional info"));
    assert!(html.contains("password2"));

    let response = server
        .post("/admin/redactor/add/")
        .add_header(header::COOKIE, cookie.clone())
        .form(&[
            ("username", "rookie"),
            ("password1", PASSWORD),
            ("password2", "different-pass"),
            ("years_of_experience", "1"),
        ])
        .await;
    response.assert_status_ok();
    assert!(response.text().contains("The two password fields didn"));

    let response = server
        .post("/admin/redactor/add/")
        .add_header(header::COOKIE, cookie)
        .form(&[
            ("username", "rookie"),
            ("password1", PASSWORD),
            ("password2", PASSWORD),
            ("years_of_experience", "1"),
        ])
        .await;
    assert_eq!(response.status_code(), StatusCode::FOUND);
    assert_eq!(location(&response), "/admin/redactor/");
}

#[tokio::test]
async fn test_static_stylesheet_served() {
    let (server, _) = setup().await;

    let response = server.get("/static/style.css").await;
    response.assert_status_ok();
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/css");

    let response = server.get("/static/missing.css").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}
