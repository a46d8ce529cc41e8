use std::sync::Arc;

use askama::Template;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, Response};
use axum::Form;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use super::{not_found, with_consent_cleanup};
use crate::consent::{self, ConsentCookie};
use crate::content::events::{Event, Signup, EVENT_CATEGORIES};
use crate::content::registrations::RegistrationForm;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "site/events.html")]
struct EventsTemplate {
    show_consent_banner: bool,
    categories: Vec<&'static str>,
    featured: Vec<Event>,
    upcoming: Vec<Event>,
    past: Vec<Event>,
}

#[derive(Template)]
#[template(path = "site/event_detail.html")]
struct EventDetailTemplate {
    show_consent_banner: bool,
    event: Event,
    open: bool,
    form: RegistrationForm,
    errors: Vec<String>,
    message: Option<String>,
}

impl EventDetailTemplate {
    fn new(consent: ConsentCookie, event: Event, today: NaiveDate) -> Self {
        EventDetailTemplate {
            show_consent_banner: !consent.has_consent(),
            open: event.is_upcoming(today) && !event.is_full(),
            event,
            form: RegistrationForm::default(),
            errors: Vec::new(),
            message: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    category: Option<String>,
}

pub async fn events_list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EventsQuery>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let consent = consent::read(&headers);
    let today = Utc::now().date_naive();
    let events = state.events.read().await;
    let category = query.category.filter(|c| !c.is_empty());
    let in_category = |e: &Event| category.as_deref().is_none_or(|c| e.category == c);

    let html = EventsTemplate {
        show_consent_banner: !consent.has_consent(),
        categories: EVENT_CATEGORIES.to_vec(),
        featured: if category.is_none() {
            events.featured(today)
        } else {
            Vec::new()
        },
        upcoming: events
            .upcoming(today, usize::MAX)
            .into_iter()
            .filter(|e| in_category(e))
            .collect(),
        past: events.past(today).into_iter().filter(|e| in_category(e)).collect(),
    }
    .render()?;
    Ok(with_consent_cleanup(consent, Html(html)))
}

pub async fn event_detail(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let consent = consent::read(&headers);
    let event = state.events.read().await.get_by_slug(&slug).cloned();
    let Some(event) = event else {
        return not_found(consent, "Událost nebyla nalezena.");
    };

    let html = EventDetailTemplate::new(consent, event, Utc::now().date_naive()).render()?;
    Ok(with_consent_cleanup(consent, Html(html)))
}

pub async fn event_register(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    headers: HeaderMap,
    Form(form): Form<RegistrationForm>,
) -> Result<Response, AppError> {
    let consent = consent::read(&headers);
    let now = Utc::now();
    let mut events = state.events.write().await;
    let Some(event) = events.get_by_slug(&slug).cloned() else {
        return not_found(consent, "Událost nebyla nalezena.");
    };

    let input = match form.validate(event.form_type) {
        Ok(input) => input,
        Err(errors) => {
            let mut page = EventDetailTemplate::new(consent, event, now.date_naive());
            page.form = form;
            page.errors = errors.messages();
            let html = page.render()?;
            return Ok(with_consent_cleanup(
                consent,
                (StatusCode::UNPROCESSABLE_ENTITY, Html(html)),
            ));
        }
    };

    let (status, message) = match events.register(&event.id, input, now)? {
        Signup::Registered(registration) => {
            tracing::info!(
                "New {} registration for {}",
                registration.kind().as_str(),
                event.slug
            );
            (StatusCode::OK, "Děkujeme, registrace byla přijata.")
        }
        Signup::Full => (StatusCode::CONFLICT, "Kapacita události je již naplněna."),
        Signup::Closed => (StatusCode::CONFLICT, "Registrace na tuto událost je uzavřena."),
        Signup::NotFound => return not_found(consent, "Událost nebyla nalezena."),
    };

    let event = events.get(&event.id).cloned().unwrap_or(event);
    let mut page = EventDetailTemplate::new(consent, event, now.date_naive());
    page.message = Some(message.to_string());
    if status != StatusCode::OK {
        page.form = form;
    }
    let html = page.render()?;
    Ok(with_consent_cleanup(consent, (status, Html(html))))
}
