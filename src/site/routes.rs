use std::sync::Arc;

use askama::Template;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap};
use axum::response::{Html, IntoResponse, Response};
use axum::Form;
use chrono::Utc;
use serde::Deserialize;

use super::{not_found, with_consent_cleanup};
use crate::consent::{self, ConsentPreferences};
use crate::content::events::Event;
use crate::content::news::NewsArticle;
use crate::error::AppError;
use crate::state::AppState;

const LATEST_LIMIT: usize = 6;
const UPCOMING_EVENTS_LIMIT: usize = 3;

#[derive(Template)]
#[template(path = "site/home.html")]
struct HomeTemplate {
    show_consent_banner: bool,
    featured: Vec<NewsArticle>,
    latest: Vec<NewsArticle>,
    events: Vec<Event>,
}

#[derive(Template)]
#[template(path = "site/news_list.html")]
struct NewsListTemplate {
    show_consent_banner: bool,
    categories: Vec<String>,
    articles: Vec<NewsArticle>,
}

#[derive(Template)]
#[template(path = "site/news_detail.html")]
struct NewsDetailTemplate {
    show_consent_banner: bool,
    article: NewsArticle,
}

#[derive(Template)]
#[template(path = "site/cookies.html")]
struct CookiesTemplate {
    show_consent_banner: bool,
    preferences: ConsentPreferences,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewsQuery {
    category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CookieChoiceForm {
    choice: String,
    analytics: Option<String>,
    marketing: Option<String>,
}

pub async fn home(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let consent = consent::read(&headers);
    let events = state
        .events
        .read()
        .await
        .upcoming(Utc::now().date_naive(), UPCOMING_EVENTS_LIMIT);
    let news = state.news.read().await;
    let html = HomeTemplate {
        show_consent_banner: !consent.has_consent(),
        featured: news.featured(),
        latest: news.latest(LATEST_LIMIT),
        events,
    }
    .render()?;
    Ok(with_consent_cleanup(consent, Html(html)))
}

pub async fn news_list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NewsQuery>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let consent = consent::read(&headers);
    let news = state.news.read().await;
    let articles = match query.category.as_deref().filter(|c| !c.is_empty()) {
        Some(category) => news.by_category(category),
        None => news.list().to_vec(),
    };
    let html = NewsListTemplate {
        show_consent_banner: !consent.has_consent(),
        categories: news.categories(),
        articles,
    }
    .render()?;
    Ok(with_consent_cleanup(consent, Html(html)))
}

pub async fn news_detail(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let consent = consent::read(&headers);
    let show_consent_banner = !consent.has_consent();
    let article = state.news.read().await.get_by_slug(&slug).cloned();

    let Some(article) = article else {
        return not_found(consent, "Článek nebyl nalezen.");
    };

    let html = NewsDetailTemplate {
        show_consent_banner,
        article,
    }
    .render()?;
    Ok(with_consent_cleanup(consent, Html(html)))
}

pub async fn cookie_settings(headers: HeaderMap) -> Result<Response, AppError> {
    let consent = consent::read(&headers);
    let html = CookiesTemplate {
        show_consent_banner: false,
        preferences: consent
            .preferences()
            .unwrap_or_else(ConsentPreferences::necessary_only),
        message: None,
    }
    .render()?;
    Ok(with_consent_cleanup(consent, Html(html)))
}

pub async fn cookie_settings_submit(
    State(state): State<Arc<AppState>>,
    Form(form): Form<CookieChoiceForm>,
) -> Result<Response, AppError> {
    let preferences = match form.choice.as_str() {
        "accept-all" => ConsentPreferences::accept_all(),
        "reject-all" => ConsentPreferences::necessary_only(),
        "custom" => ConsentPreferences {
            necessary: true,
            analytics: form.analytics.as_deref() == Some("on"),
            marketing: form.marketing.as_deref() == Some("on"),
        },
        "clear" => {
            let html = CookiesTemplate {
                show_consent_banner: false,
                preferences: ConsentPreferences::necessary_only(),
                message: Some("Souhlas byl odvolán.".to_string()),
            }
            .render()?;
            return Ok(([(header::SET_COOKIE, consent::clear_cookie())], Html(html)).into_response());
        }
        other => {
            return Err(AppError::BadRequest(format!("Neznámá volba souhlasu: {}", other)));
        }
    };

    let cookie = consent::set_cookie(preferences, Utc::now(), state.secure_cookies)?;
    let html = CookiesTemplate {
        show_consent_banner: false,
        preferences,
        message: Some("Nastavení cookies bylo uloženo.".to_string()),
    }
    .render()?;
    Ok(([(header::SET_COOKIE, cookie)], Html(html)).into_response())
}
