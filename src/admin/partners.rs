use std::sync::Arc;

use askama::Template;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use chrono::Utc;

use super::routes::error_messages;
use crate::auth::extract::AdminUser;
use crate::content::partners::{Partner, PartnerCategory, PartnerForm};
use crate::content::validation::FieldErrors;
use crate::error::AppError;
use crate::state::AppState;

/// Partner list with the create or edit form underneath.
#[derive(Template)]
#[template(path = "admin/partners.html")]
struct PartnersTemplate {
    partners: Vec<Partner>,
    categories: Vec<PartnerCategory>,
    heading: String,
    action: String,
    form: PartnerForm,
    errors: Vec<String>,
}

impl PartnersTemplate {
    fn new(partners: Vec<Partner>, form: PartnerForm, errors: Option<FieldErrors>) -> Self {
        PartnersTemplate {
            partners,
            categories: PartnerCategory::ALL.to_vec(),
            heading: "Nový partner".to_string(),
            action: "/admin/partneri".to_string(),
            form,
            errors: error_messages(errors),
        }
    }

    fn editing(mut self, id: &str) -> Self {
        self.heading = "Upravit partnera".to_string();
        self.action = format!("/admin/partneri/{}", id);
        self
    }
}

fn partner_not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Partner {} nebyl nalezen", id))
}

pub async fn admin_partners(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Result<Html<String>, AppError> {
    let partners = state.partners.read().await.list().to_vec();
    let html = PartnersTemplate::new(partners, PartnerForm::blank(), None).render()?;
    Ok(Html(html))
}

pub async fn admin_partner_create(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Form(form): Form<PartnerForm>,
) -> Result<Response, AppError> {
    let mut partners = state.partners.write().await;
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            let html = PartnersTemplate::new(partners.list().to_vec(), form, Some(errors)).render()?;
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(html)).into_response());
        }
    };

    let partner = partners.create(input, Utc::now())?;
    tracing::info!("{} added partner {}", admin.email, partner.name);
    Ok(Redirect::to("/admin/partneri").into_response())
}

pub async fn admin_partner_edit(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let partners = state.partners.read().await;
    let partner = partners.get(&id).ok_or_else(|| partner_not_found(&id))?;
    let html = PartnersTemplate::new(
        partners.list().to_vec(),
        PartnerForm::from_partner(partner),
        None,
    )
    .editing(&id)
    .render()?;
    Ok(Html(html))
}

pub async fn admin_partner_update(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Path(id): Path<String>,
    Form(form): Form<PartnerForm>,
) -> Result<Response, AppError> {
    let mut partners = state.partners.write().await;
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            let html = PartnersTemplate::new(partners.list().to_vec(), form, Some(errors))
                .editing(&id)
                .render()?;
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(html)).into_response());
        }
    };

    let partner = partners
        .update(&id, input, Utc::now())?
        .ok_or_else(|| partner_not_found(&id))?;
    tracing::info!("{} updated partner {}", admin.email, partner.name);
    Ok(Redirect::to("/admin/partneri").into_response())
}

pub async fn admin_partner_delete(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    if state.partners.write().await.delete(&id)? {
        tracing::info!("{} deleted partner {}", admin.email, id);
    }
    Ok(Redirect::to("/admin/partneri"))
}

pub async fn admin_partner_toggle(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    state
        .partners
        .write()
        .await
        .toggle_active(&id, Utc::now())?
        .ok_or_else(|| partner_not_found(&id))?;
    Ok(Redirect::to("/admin/partneri"))
}
