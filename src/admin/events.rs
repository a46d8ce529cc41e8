use std::sync::Arc;

use askama::Template;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use chrono::Utc;

use super::routes::error_messages;
use crate::auth::extract::AdminUser;
use crate::content::events::{Event, EventForm, EVENT_CATEGORIES};
use crate::content::registrations::Registration;
use crate::content::validation::FieldErrors;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "admin/events.html")]
struct EventsTemplate {
    email: String,
    events: Vec<Event>,
}

#[derive(Template)]
#[template(path = "admin/event_form.html")]
struct EventFormTemplate {
    heading: String,
    action: String,
    categories: Vec<&'static str>,
    form: EventForm,
    errors: Vec<String>,
}

impl EventFormTemplate {
    fn create(form: EventForm, errors: Option<FieldErrors>) -> Self {
        EventFormTemplate {
            heading: "Nová událost".to_string(),
            action: "/admin/udalosti".to_string(),
            categories: EVENT_CATEGORIES.to_vec(),
            form,
            errors: error_messages(errors),
        }
    }

    fn edit(id: &str, form: EventForm, errors: Option<FieldErrors>) -> Self {
        EventFormTemplate {
            heading: "Upravit událost".to_string(),
            action: format!("/admin/udalosti/{}", id),
            categories: EVENT_CATEGORIES.to_vec(),
            form,
            errors: error_messages(errors),
        }
    }
}

#[derive(Template)]
#[template(path = "admin/registrations.html")]
struct RegistrationsTemplate {
    event: Event,
    registrations: Vec<Registration>,
}

fn event_not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Událost {} nebyla nalezena", id))
}

pub async fn admin_events(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
) -> Result<Html<String>, AppError> {
    let html = EventsTemplate {
        email: admin.email,
        events: state.events.read().await.list().to_vec(),
    }
    .render()?;
    Ok(Html(html))
}

pub async fn admin_event_new(_admin: AdminUser) -> Result<Html<String>, AppError> {
    let html = EventFormTemplate::create(EventForm::default(), None).render()?;
    Ok(Html(html))
}

pub async fn admin_event_create(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Form(form): Form<EventForm>,
) -> Result<Response, AppError> {
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            let html = EventFormTemplate::create(form, Some(errors)).render()?;
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(html)).into_response());
        }
    };

    let event = state.events.write().await.create(input, Utc::now())?;
    tracing::info!("{} created event {}", admin.email, event.slug);
    Ok(Redirect::to("/admin/udalosti").into_response())
}

pub async fn admin_event_edit(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let events = state.events.read().await;
    let event = events.get(&id).ok_or_else(|| event_not_found(&id))?;
    let html = EventFormTemplate::edit(&id, EventForm::from_event(event), None).render()?;
    Ok(Html(html))
}

pub async fn admin_event_update(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Path(id): Path<String>,
    Form(form): Form<EventForm>,
) -> Result<Response, AppError> {
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            let html = EventFormTemplate::edit(&id, form, Some(errors)).render()?;
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(html)).into_response());
        }
    };

    let event = state
        .events
        .write()
        .await
        .update(&id, input, Utc::now())?
        .ok_or_else(|| event_not_found(&id))?;
    tracing::info!("{} updated event {}", admin.email, event.slug);
    Ok(Redirect::to("/admin/udalosti").into_response())
}

pub async fn admin_event_delete(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    if state.events.write().await.delete(&id)? {
        tracing::info!("{} deleted event {}", admin.email, id);
    }
    Ok(Redirect::to("/admin/udalosti"))
}

pub async fn admin_event_registrations(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let events = state.events.read().await;
    let event = events.get(&id).cloned().ok_or_else(|| event_not_found(&id))?;
    let html = RegistrationsTemplate {
        registrations: events.registrations_for(&id),
        event,
    }
    .render()?;
    Ok(Html(html))
}
