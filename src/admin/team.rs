use std::sync::Arc;

use askama::Template;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use chrono::Utc;

use super::routes::error_messages;
use crate::auth::extract::AdminUser;
use crate::content::team::{AboutForm, MemberForm, TeamMember, TeamStore};
use crate::content::validation::FieldErrors;
use crate::error::AppError;
use crate::state::AppState;

/// About text editor, member list and member form on one page.
#[derive(Template)]
#[template(path = "admin/team.html")]
struct TeamTemplate {
    about: AboutForm,
    about_errors: Vec<String>,
    members: Vec<TeamMember>,
    heading: String,
    action: String,
    form: MemberForm,
    errors: Vec<String>,
}

impl TeamTemplate {
    fn new(team: &TeamStore) -> Self {
        TeamTemplate {
            about: AboutForm::from_content(team.about()),
            about_errors: Vec::new(),
            members: team.members().to_vec(),
            heading: "Nový člen týmu".to_string(),
            action: "/admin/o-nas/clenove".to_string(),
            form: MemberForm::default(),
            errors: Vec::new(),
        }
    }

    fn member_form(mut self, form: MemberForm, errors: Option<FieldErrors>) -> Self {
        self.form = form;
        self.errors = error_messages(errors);
        self
    }

    fn editing(mut self, id: &str) -> Self {
        self.heading = "Upravit člena týmu".to_string();
        self.action = format!("/admin/o-nas/clenove/{}", id);
        self
    }
}

fn member_not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Člen týmu {} nebyl nalezen", id))
}

fn unprocessable(html: String) -> Response {
    (StatusCode::UNPROCESSABLE_ENTITY, Html(html)).into_response()
}

pub async fn admin_team(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Result<Html<String>, AppError> {
    let html = TeamTemplate::new(&*state.team.read().await).render()?;
    Ok(Html(html))
}

pub async fn admin_about_update(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Form(form): Form<AboutForm>,
) -> Result<Response, AppError> {
    let mut team = state.team.write().await;
    let (title, content) = match form.validate() {
        Ok(values) => values,
        Err(errors) => {
            let mut page = TeamTemplate::new(&team);
            page.about = form;
            page.about_errors = error_messages(Some(errors));
            return Ok(unprocessable(page.render()?));
        }
    };

    team.update_about(title, content, Utc::now())?;
    tracing::info!("{} updated the about page", admin.email);
    Ok(Redirect::to("/admin/o-nas").into_response())
}

pub async fn admin_member_create(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Form(form): Form<MemberForm>,
) -> Result<Response, AppError> {
    let mut team = state.team.write().await;
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            let html = TeamTemplate::new(&team).member_form(form, Some(errors)).render()?;
            return Ok(unprocessable(html));
        }
    };

    let member = team.add(input, Utc::now())?;
    tracing::info!("{} added team member {}", admin.email, member.name);
    Ok(Redirect::to("/admin/o-nas").into_response())
}

pub async fn admin_member_edit(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let team = state.team.read().await;
    let member = team.get(&id).ok_or_else(|| member_not_found(&id))?;
    let html = TeamTemplate::new(&team)
        .member_form(MemberForm::from_member(member), None)
        .editing(&id)
        .render()?;
    Ok(Html(html))
}

pub async fn admin_member_update(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Path(id): Path<String>,
    Form(form): Form<MemberForm>,
) -> Result<Response, AppError> {
    let mut team = state.team.write().await;
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            let html = TeamTemplate::new(&team)
                .member_form(form, Some(errors))
                .editing(&id)
                .render()?;
            return Ok(unprocessable(html));
        }
    };

    let member = team
        .update(&id, input, Utc::now())?
        .ok_or_else(|| member_not_found(&id))?;
    tracing::info!("{} updated team member {}", admin.email, member.name);
    Ok(Redirect::to("/admin/o-nas").into_response())
}

pub async fn admin_member_delete(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    if state.team.write().await.delete(&id)? {
        tracing::info!("{} removed team member {}", admin.email, id);
    }
    Ok(Redirect::to("/admin/o-nas"))
}
