use std::net::SocketAddr;
use std::sync::Arc;

use askama::Template;
use axum::extract::{ConnectInfo, Path, State};
use axum::http::{header, HeaderMap};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::{Form, Json};
use chrono::Utc;
use serde::Serialize;

use crate::admin::login::{attempt_login, LoginForm};
use crate::admin::session::{clear_session_cookie, set_session_cookie, SESSION_COOKIE_NAME};
use crate::auth::extract::AdminUser;
use crate::content::news::{NewsArticle, NewsForm};
use crate::content::validation::FieldErrors;
use crate::cookies::cookie_value;
use crate::error::AppError;
use crate::guard::policy::format_countdown;
use crate::state::AppState;

// Templates

#[derive(Template)]
#[template(path = "admin/login.html")]
struct LoginTemplate {
    error: Option<String>,
    email: String,
    remaining_seconds: i64,
    countdown: String,
}

impl LoginTemplate {
    fn new(error: Option<String>, email: String, remaining_seconds: i64) -> Self {
        LoginTemplate {
            error,
            email,
            remaining_seconds,
            countdown: format_countdown(remaining_seconds),
        }
    }
}

#[derive(Template)]
#[template(path = "admin/dashboard.html")]
struct DashboardTemplate {
    email: String,
    articles: Vec<NewsArticle>,
    message: Option<String>,
}

#[derive(Template)]
#[template(path = "admin/news_form.html")]
struct NewsFormTemplate {
    heading: String,
    action: String,
    form: NewsForm,
    errors: Vec<String>,
}

impl NewsFormTemplate {
    fn create(form: NewsForm, errors: Option<FieldErrors>) -> Self {
        NewsFormTemplate {
            heading: "Nový článek".to_string(),
            action: "/admin/aktuality".to_string(),
            form,
            errors: error_messages(errors),
        }
    }

    fn edit(id: &str, form: NewsForm, errors: Option<FieldErrors>) -> Self {
        NewsFormTemplate {
            heading: "Upravit článek".to_string(),
            action: format!("/admin/aktuality/{}", id),
            form,
            errors: error_messages(errors),
        }
    }
}

pub(crate) fn error_messages(errors: Option<FieldErrors>) -> Vec<String> {
    errors.map(FieldErrors::messages).unwrap_or_default()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginStatus {
    allowed: bool,
    remaining_block_seconds: i64,
}

fn client_key(addr: &SocketAddr) -> String {
    addr.ip().to_string()
}

// Login

pub async fn admin_login_page(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Result<Html<String>, AppError> {
    let check = state
        .login_guard
        .lock()
        .await
        .check_allowed(&client_key(&addr), Utc::now());
    let html = LoginTemplate::new(None, String::new(), check.remaining_block_seconds).render()?;
    Ok(Html(html))
}

pub async fn admin_login_status(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Json<LoginStatus> {
    let check = state
        .login_guard
        .lock()
        .await
        .check_allowed(&client_key(&addr), Utc::now());
    Json(LoginStatus {
        allowed: check.allowed,
        remaining_block_seconds: check.remaining_block_seconds,
    })
}

pub async fn admin_login_submit(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let client = client_key(&addr);

    let result = {
        let mut guard = state.login_guard.lock().await;
        attempt_login(&mut guard, &state.accounts, &client, &form, Utc::now())
    };

    match result {
        Ok(account) => {
            let session = state.sessions.lock().await.create(account.email);
            let cookie = set_session_cookie(&session.token);
            Ok(([(header::SET_COOKIE, cookie)], Redirect::to("/admin")).into_response())
        }
        Err(err) => {
            let html = LoginTemplate::new(
                Some(err.message()),
                form.email,
                err.remaining_seconds().unwrap_or(0),
            )
            .render()?;
            Ok((err.status(), Html(html)).into_response())
        }
    }
}

pub async fn admin_logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if let Some(token) = cookie_value(&headers, SESSION_COOKIE_NAME) {
        state.sessions.lock().await.remove(token);
    }
    let cookie = clear_session_cookie();
    (
        [(header::SET_COOKIE, cookie)],
        Redirect::to("/admin/login"),
    )
        .into_response()
}

// News

async fn render_dashboard(
    state: &AppState,
    admin: &AdminUser,
    message: Option<String>,
) -> Result<Html<String>, AppError> {
    let articles = state.news.read().await.list().to_vec();
    let html = DashboardTemplate {
        email: admin.email.clone(),
        articles,
        message,
    }
    .render()?;
    Ok(Html(html))
}

pub async fn admin_dashboard(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
) -> Result<Html<String>, AppError> {
    render_dashboard(&state, &admin, None).await
}

pub async fn admin_news_new(_admin: AdminUser) -> Result<Html<String>, AppError> {
    let html = NewsFormTemplate::create(NewsForm::default(), None).render()?;
    Ok(Html(html))
}

pub async fn admin_news_create(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Form(form): Form<NewsForm>,
) -> Result<Response, AppError> {
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            let html = NewsFormTemplate::create(form, Some(errors)).render()?;
            return Ok((axum::http::StatusCode::UNPROCESSABLE_ENTITY, Html(html)).into_response());
        }
    };

    let article = state.news.write().await.create(input, Utc::now())?;
    tracing::info!("{} created article {}", admin.email, article.slug);
    let message = format!("Článek byl vytvořen: {}", article.title);
    Ok(render_dashboard(&state, &admin, Some(message))
        .await?
        .into_response())
}

pub async fn admin_news_edit(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let news = state.news.read().await;
    let article = news
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("Článek {} nebyl nalezen", id)))?;
    let html = NewsFormTemplate::edit(&id, NewsForm::from_article(article), None).render()?;
    Ok(Html(html))
}

pub async fn admin_news_update(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Path(id): Path<String>,
    Form(form): Form<NewsForm>,
) -> Result<Response, AppError> {
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            let html = NewsFormTemplate::edit(&id, form, Some(errors)).render()?;
            return Ok((axum::http::StatusCode::UNPROCESSABLE_ENTITY, Html(html)).into_response());
        }
    };

    let updated = state.news.write().await.update(&id, input, Utc::now())?;
    match updated {
        Some(article) => {
            tracing::info!("{} updated article {}", admin.email, article.slug);
            Ok(Redirect::to("/admin").into_response())
        }
        None => Err(AppError::NotFound(format!("Článek {} nebyl nalezen", id))),
    }
}

pub async fn admin_news_delete(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    if state.news.write().await.delete(&id)? {
        tracing::info!("{} deleted article {}", admin.email, id);
    }
    Ok(Redirect::to("/admin"))
}

pub async fn admin_news_toggle_featured(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    state
        .news
        .write()
        .await
        .toggle_featured(&id, Utc::now())?
        .ok_or_else(|| AppError::NotFound(format!("Článek {} nebyl nalezen", id)))?;
    Ok(Redirect::to("/admin"))
}
