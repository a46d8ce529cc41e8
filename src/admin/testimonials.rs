use std::sync::Arc;

use askama::Template;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use chrono::Utc;

use super::routes::error_messages;
use crate::auth::extract::AdminUser;
use crate::content::testimonials::{Testimonial, TestimonialForm};
use crate::content::validation::FieldErrors;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "admin/testimonials.html")]
struct TestimonialsTemplate {
    testimonials: Vec<Testimonial>,
    heading: String,
    action: String,
    form: TestimonialForm,
    errors: Vec<String>,
}

impl TestimonialsTemplate {
    fn new(testimonials: Vec<Testimonial>, form: TestimonialForm, errors: Option<FieldErrors>) -> Self {
        TestimonialsTemplate {
            testimonials,
            heading: "Nová reference".to_string(),
            action: "/admin/reference".to_string(),
            form,
            errors: error_messages(errors),
        }
    }

    fn editing(mut self, id: &str) -> Self {
        self.heading = "Upravit referenci".to_string();
        self.action = format!("/admin/reference/{}", id);
        self
    }
}

fn testimonial_not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Reference {} nebyla nalezena", id))
}

pub async fn admin_testimonials(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Result<Html<String>, AppError> {
    let testimonials = state.testimonials.read().await.list().to_vec();
    let html = TestimonialsTemplate::new(testimonials, TestimonialForm::default(), None).render()?;
    Ok(Html(html))
}

pub async fn admin_testimonial_create(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Form(form): Form<TestimonialForm>,
) -> Result<Response, AppError> {
    let mut testimonials = state.testimonials.write().await;
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            let html = TestimonialsTemplate::new(testimonials.list().to_vec(), form, Some(errors))
                .render()?;
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(html)).into_response());
        }
    };

    let testimonial = testimonials.create(input, Utc::now())?;
    tracing::info!("{} added testimonial from {}", admin.email, testimonial.name);
    Ok(Redirect::to("/admin/reference").into_response())
}

pub async fn admin_testimonial_edit(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let testimonials = state.testimonials.read().await;
    let testimonial = testimonials.get(&id).ok_or_else(|| testimonial_not_found(&id))?;
    let html = TestimonialsTemplate::new(
        testimonials.list().to_vec(),
        TestimonialForm::from_testimonial(testimonial),
        None,
    )
    .editing(&id)
    .render()?;
    Ok(Html(html))
}

pub async fn admin_testimonial_update(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Path(id): Path<String>,
    Form(form): Form<TestimonialForm>,
) -> Result<Response, AppError> {
    let mut testimonials = state.testimonials.write().await;
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            let html = TestimonialsTemplate::new(testimonials.list().to_vec(), form, Some(errors))
                .editing(&id)
                .render()?;
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(html)).into_response());
        }
    };

    let testimonial = testimonials
        .update(&id, input, Utc::now())?
        .ok_or_else(|| testimonial_not_found(&id))?;
    tracing::info!("{} updated testimonial from {}", admin.email, testimonial.name);
    Ok(Redirect::to("/admin/reference").into_response())
}

pub async fn admin_testimonial_delete(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    if state.testimonials.write().await.delete(&id)? {
        tracing::info!("{} deleted testimonial {}", admin.email, id);
    }
    Ok(Redirect::to("/admin/reference"))
}

pub async fn admin_testimonial_toggle(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    state
        .testimonials
        .write()
        .await
        .toggle_active(&id, Utc::now())?
        .ok_or_else(|| testimonial_not_found(&id))?;
    Ok(Redirect::to("/admin/reference"))
}
