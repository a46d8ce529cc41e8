use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

mod admin;
mod api;
mod auth;
mod config;
mod consent;
mod content;
mod cookies;
mod error;
mod guard;
mod persist;
mod site;
mod state;

use admin::session::SessionStore;
use auth::accounts::AccountStore;
use config::Config;
use content::events::EventStore;
use content::news::NewsStore;
use content::partners::PartnerStore;
use content::team::TeamStore;
use content::testimonials::TestimonialStore;
use guard::store::{JsonFileStore, KeyValueStore, MemoryStore};
use guard::LoginGuard;
use state::AppState;

const CLEANUP_INTERVAL: Duration = Duration::from_secs(5 * 60);

fn app(state: Arc<AppState>) -> Router {
    Router::new()
        // Public site
        .route("/", get(site::routes::home))
        .route("/aktuality", get(site::routes::news_list))
        .route("/aktuality/{slug}", get(site::routes::news_detail))
        .route("/udalosti", get(site::events::events_list))
        .route("/udalosti/{slug}", get(site::events::event_detail))
        .route(
            "/udalosti/{slug}/registrace",
            post(site::events::event_register),
        )
        .route("/partneri", get(site::pages::partners))
        .route("/reference", get(site::pages::testimonials))
        .route("/o-nas", get(site::pages::about))
        .route("/kontakt", get(site::pages::contact))
        .route(
            "/sprava-cookies",
            get(site::routes::cookie_settings).post(site::routes::cookie_settings_submit),
        )
        // Consent API
        .route(
            "/api/consent",
            get(api::consent::get_consent)
                .post(api::consent::set_consent)
                .delete(api::consent::clear_consent),
        )
        .route("/api/consent/accept-all", post(api::consent::accept_all))
        .route("/api/consent/reject-all", post(api::consent::reject_all))
        // Admin routes
        .route("/admin", get(admin::routes::admin_dashboard))
        .route(
            "/admin/login",
            get(admin::routes::admin_login_page).post(admin::routes::admin_login_submit),
        )
        .route("/admin/login/status", get(admin::routes::admin_login_status))
        .route("/admin/logout", post(admin::routes::admin_logout))
        .route("/admin/aktuality", post(admin::routes::admin_news_create))
        .route("/admin/aktuality/new", get(admin::routes::admin_news_new))
        .route("/admin/aktuality/{id}", post(admin::routes::admin_news_update))
        .route("/admin/aktuality/{id}/edit", get(admin::routes::admin_news_edit))
        .route(
            "/admin/aktuality/{id}/delete",
            post(admin::routes::admin_news_delete),
        )
        .route(
            "/admin/aktuality/{id}/featured",
            post(admin::routes::admin_news_toggle_featured),
        )
        .route(
            "/admin/udalosti",
            get(admin::events::admin_events).post(admin::events::admin_event_create),
        )
        .route("/admin/udalosti/new", get(admin::events::admin_event_new))
        .route("/admin/udalosti/{id}", post(admin::events::admin_event_update))
        .route("/admin/udalosti/{id}/edit", get(admin::events::admin_event_edit))
        .route(
            "/admin/udalosti/{id}/delete",
            post(admin::events::admin_event_delete),
        )
        .route(
            "/admin/udalosti/{id}/registrace",
            get(admin::events::admin_event_registrations),
        )
        .route(
            "/admin/partneri",
            get(admin::partners::admin_partners).post(admin::partners::admin_partner_create),
        )
        .route("/admin/partneri/{id}", post(admin::partners::admin_partner_update))
        .route("/admin/partneri/{id}/edit", get(admin::partners::admin_partner_edit))
        .route(
            "/admin/partneri/{id}/delete",
            post(admin::partners::admin_partner_delete),
        )
        .route(
            "/admin/partneri/{id}/toggle",
            post(admin::partners::admin_partner_toggle),
        )
        .route(
            "/admin/reference",
            get(admin::testimonials::admin_testimonials)
                .post(admin::testimonials::admin_testimonial_create),
        )
        .route(
            "/admin/reference/{id}",
            post(admin::testimonials::admin_testimonial_update),
        )
        .route(
            "/admin/reference/{id}/edit",
            get(admin::testimonials::admin_testimonial_edit),
        )
        .route(
            "/admin/reference/{id}/delete",
            post(admin::testimonials::admin_testimonial_delete),
        )
        .route(
            "/admin/reference/{id}/toggle",
            post(admin::testimonials::admin_testimonial_toggle),
        )
        .route("/admin/o-nas", get(admin::team::admin_team))
        .route("/admin/o-nas/obsah", post(admin::team::admin_about_update))
        .route("/admin/o-nas/clenove", post(admin::team::admin_member_create))
        .route("/admin/o-nas/clenove/{id}", post(admin::team::admin_member_update))
        .route(
            "/admin/o-nas/clenove/{id}/edit",
            get(admin::team::admin_member_edit),
        )
        .route(
            "/admin/o-nas/clenove/{id}/delete",
            post(admin::team::admin_member_delete),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;

    let accounts = AccountStore::load(&config.admin, config.accounts_path.as_deref())?;
    let news = NewsStore::load_or_create(&config.news_path)?;
    let events = EventStore::load_or_create(&config.events_path)?;
    let partners = PartnerStore::load_or_create(&config.partners_path)?;
    let testimonials = TestimonialStore::load_or_create(&config.testimonials_path)?;
    let team = TeamStore::load_or_create(&config.team_path)?;
    let guard_store: Box<dyn KeyValueStore> = match &config.guard_state_path {
        Some(path) => Box::new(JsonFileStore::load_or_create(path)?),
        None => Box::new(MemoryStore::new()),
    };

    let state = Arc::new(AppState {
        news: tokio::sync::RwLock::new(news),
        events: tokio::sync::RwLock::new(events),
        partners: tokio::sync::RwLock::new(partners),
        testimonials: tokio::sync::RwLock::new(testimonials),
        team: tokio::sync::RwLock::new(team),
        accounts,
        login_guard: tokio::sync::Mutex::new(LoginGuard::new(guard_store)),
        sessions: tokio::sync::Mutex::new(SessionStore::new()),
        secure_cookies: config.secure_cookies,
    });

    {
        let state = state.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
            loop {
                interval.tick().await;
                let removed = state.sessions.lock().await.cleanup_expired();
                if removed > 0 {
                    tracing::debug!("Removed {} expired admin sessions", removed);
                }
                let purged = state.login_guard.lock().await.purge_expired(chrono::Utc::now());
                if purged > 0 {
                    tracing::debug!("Purged {} stale login attempt records", purged);
                }
            }
        });
    }

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);
    axum::serve(
        listener,
        app(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::connect_info::MockConnectInfo;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    use crate::config::AdminConfig;

    fn test_setup() -> (Router, Arc<AppState>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let admin = AdminConfig {
            email: "admin@example.org".to_string(),
            password: "correct".to_string(),
        };
        let state = Arc::new(AppState {
            news: tokio::sync::RwLock::new(
                NewsStore::load_or_create(&dir.path().join("news.json")).unwrap(),
            ),
            events: tokio::sync::RwLock::new(
                EventStore::load_or_create(&dir.path().join("events.json")).unwrap(),
            ),
            partners: tokio::sync::RwLock::new(
                PartnerStore::load_or_create(&dir.path().join("partners.json")).unwrap(),
            ),
            testimonials: tokio::sync::RwLock::new(
                TestimonialStore::load_or_create(&dir.path().join("testimonials.json")).unwrap(),
            ),
            team: tokio::sync::RwLock::new(
                TeamStore::load_or_create(&dir.path().join("team.json")).unwrap(),
            ),
            accounts: AccountStore::load(&admin, None).unwrap(),
            login_guard: tokio::sync::Mutex::new(LoginGuard::new(Box::new(MemoryStore::new()))),
            sessions: tokio::sync::Mutex::new(SessionStore::new()),
            secure_cookies: false,
        });
        let router = app(state.clone())
            .layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))));
        (router, state, dir)
    }

    fn test_app() -> (Router, tempfile::TempDir) {
        let (router, _state, dir) = test_setup();
        (router, dir)
    }

    fn login_request(password: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/admin/login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(format!(
                "email=admin%40example.org&password={}",
                password
            )))
            .unwrap()
    }

    fn session_cookie(response: &axum::response::Response) -> String {
        response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string()
    }

    fn form_post(uri: &str, cookie: Option<&str>, body: &'static str) -> Request<Body> {
        let mut builder = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(body)).unwrap()
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_dashboard_requires_session() {
        let (app, _dir) = test_app();
        let response = app
            .oneshot(Request::get("/admin").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/admin/login"
        );
    }

    #[tokio::test]
    async fn test_login_sets_session_and_opens_dashboard() {
        let (app, _dir) = test_app();
        let response = app.clone().oneshot(login_request("correct")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let cookie = session_cookie(&response);

        let response = app
            .oneshot(
                Request::get("/admin")
                    .header(header::COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.contains("admin@example.org"));
    }

    #[tokio::test]
    async fn test_lockout_over_http() {
        let (app, _dir) = test_app();

        for _ in 0..4 {
            let response = app.clone().oneshot(login_request("wrong")).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
        let response = app.clone().oneshot(login_request("wrong")).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

        let response = app.clone().oneshot(login_request("correct")).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

        let response = app
            .oneshot(
                Request::get("/admin/login/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(status["allowed"], false);
        let remaining = status["remainingBlockSeconds"].as_i64().unwrap();
        assert!(remaining > 890 && remaining <= 900);
    }

    #[tokio::test]
    async fn test_consent_api() {
        let (app, _dir) = test_app();
        let response = app
            .clone()
            .oneshot(
                Request::post("/api/consent/reject-all")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string();

        let response = app
            .clone()
            .oneshot(
                Request::get("/api/consent")
                    .header(header::COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["hasConsent"], true);
        assert_eq!(body["preferences"]["analytics"], false);

        let response = app
            .oneshot(
                Request::get("/api/consent")
                    .header(header::COOKIE, "cookie_consent=garbage")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .contains("Max-Age=0"));
        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["hasConsent"], false);
    }

    #[tokio::test]
    async fn test_public_pages() {
        let (app, _dir) = test_app();
        let response = app
            .clone()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.contains("cookie-banner"));

        let response = app
            .oneshot(Request::get("/aktuality/neexistuje").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    async fn get_page(app: &Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        (status, body_string(response).await)
    }

    fn clears_consent(response: &axum::response::Response) -> bool {
        response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("cookie_consent=") && v.contains("Max-Age=0"))
    }

    #[tokio::test]
    async fn test_not_found_clears_invalid_consent() {
        let (app, _dir) = test_app();
        for uri in ["/aktuality/neexistuje", "/udalosti/neexistuje"] {
            let response = app
                .clone()
                .oneshot(
                    Request::get(uri)
                        .header(header::COOKIE, "cookie_consent=garbage")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
            assert!(clears_consent(&response), "{}", uri);
        }

        let response = app
            .oneshot(Request::get("/aktuality/neexistuje").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn test_event_registration_over_http() {
        let (app, state, _dir) = test_setup();
        let date = (chrono::Utc::now() + chrono::TimeDelta::days(30)).date_naive();
        let event = state
            .events
            .write()
            .await
            .create(
                content::events::EventForm {
                    title: "Keramická dílna".to_string(),
                    description: "Odpoledne s hlínou a hrnčířským kruhem.".to_string(),
                    date: date.format("%Y-%m-%d").to_string(),
                    location: "Praha 1".to_string(),
                    capacity: "1".to_string(),
                    category: "workshop".to_string(),
                    ..Default::default()
                }
                .validate()
                .unwrap(),
                chrono::Utc::now(),
            )
            .unwrap();
        let uri = format!("/udalosti/{}/registrace", event.slug);

        let (status, body) = get_page(&app, "/udalosti").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Keramická dílna"));

        let response = app
            .clone()
            .oneshot(form_post(&uri, None, "full_name=&email=jana"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body_string(response).await.contains("Neplatný email"));

        let signup = "full_name=Jana+Nov%C3%A1kov%C3%A1&email=jana%40example.org";
        let response = app.clone().oneshot(form_post(&uri, None, signup)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.contains("Děkujeme, registrace byla přijata."));

        let response = app.clone().oneshot(form_post(&uri, None, signup)).await.unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = app
            .oneshot(form_post("/udalosti/neexistuje/registrace", None, signup))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let events = state.events.read().await;
        assert_eq!(events.get(&event.id).unwrap().registered, 1);
        assert_eq!(events.registrations_for(&event.id)[0].full_name, "Jana Nováková");
    }

    #[tokio::test]
    async fn test_content_pages() {
        let (app, state, _dir) = test_setup();
        let now = chrono::Utc::now();
        state
            .testimonials
            .write()
            .await
            .create(
                content::testimonials::TestimonialForm {
                    name: "Petra".to_string(),
                    position: "Maminka".to_string(),
                    text: "Syn se těší na další tábor.".to_string(),
                    ..Default::default()
                }
                .validate()
                .unwrap(),
                now,
            )
            .unwrap();

        let (status, body) = get_page(&app, "/reference").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Syn se těší na další tábor."));

        let (status, body) = get_page(&app, "/o-nas").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("O nás"));

        let (status, body) = get_page(&app, "/kontakt").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("03856151"));

        let (status, body) = get_page(&app, "/partneri").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Seznam partnerů se připravuje."));
    }

    #[tokio::test]
    async fn test_admin_sections_require_session() {
        let (app, _dir) = test_app();
        for uri in ["/admin/udalosti", "/admin/partneri", "/admin/reference", "/admin/o-nas"] {
            let response = app
                .clone()
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::SEE_OTHER, "{}", uri);
            assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/admin/login");
        }
    }

    #[tokio::test]
    async fn test_admin_manages_partners() {
        let (app, _dir) = test_app();
        let response = app.clone().oneshot(login_request("correct")).await.unwrap();
        let cookie = session_cookie(&response);

        let response = app
            .clone()
            .oneshot(form_post("/admin/partneri", Some(&cookie), "name=&category=sponsor"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body_string(response).await.contains("Neplatná kategorie"));

        let response = app
            .clone()
            .oneshot(form_post(
                "/admin/partneri",
                Some(&cookie),
                "name=M%C4%9Bsto+Praha&category=municipal&is_active=on",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/admin/partneri");

        let (_, body) = get_page(&app, "/partneri").await;
        assert!(body.contains("Město Praha"));
        assert!(body.contains("Města a obce"));
    }
}
