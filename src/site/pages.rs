use std::sync::Arc;

use askama::Template;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{Html, Response};

use super::with_consent_cleanup;
use crate::consent;
use crate::content::partners::{Partner, PartnerCategory};
use crate::content::team::{AboutContent, TeamMember};
use crate::content::testimonials::Testimonial;
use crate::error::AppError;
use crate::state::AppState;

/// Organization details shown on the contact page.
struct Organization {
    name: &'static str,
    street: &'static str,
    city: &'static str,
    company_id: &'static str,
    email: &'static str,
    phone: &'static str,
    bank_account: &'static str,
    office_hours: &'static str,
}

static ORGANIZATION: Organization = Organization {
    name: "DĚLEJ CO TĚ BAVÍ z.ú.",
    street: "Újezd 450/40",
    city: "118 01 Praha 1",
    company_id: "03856151",
    email: "info@delejcotebavi.com",
    phone: "+420 776 369 685",
    bank_account: "269122967/0300",
    office_hours: "Po–Pá 9:00–17:00",
};

#[derive(Template)]
#[template(path = "site/partners.html")]
struct PartnersTemplate {
    show_consent_banner: bool,
    groups: Vec<(PartnerCategory, Vec<Partner>)>,
}

#[derive(Template)]
#[template(path = "site/testimonials.html")]
struct TestimonialsTemplate {
    show_consent_banner: bool,
    testimonials: Vec<Testimonial>,
}

#[derive(Template)]
#[template(path = "site/about.html")]
struct AboutTemplate {
    show_consent_banner: bool,
    about: AboutContent,
    members: Vec<TeamMember>,
}

#[derive(Template)]
#[template(path = "site/contact.html")]
struct ContactTemplate {
    show_consent_banner: bool,
    org: &'static Organization,
}

pub async fn partners(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let consent = consent::read(&headers);
    let html = PartnersTemplate {
        show_consent_banner: !consent.has_consent(),
        groups: state.partners.read().await.active_by_category(),
    }
    .render()?;
    Ok(with_consent_cleanup(consent, Html(html)))
}

pub async fn testimonials(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let consent = consent::read(&headers);
    let html = TestimonialsTemplate {
        show_consent_banner: !consent.has_consent(),
        testimonials: state.testimonials.read().await.active(),
    }
    .render()?;
    Ok(with_consent_cleanup(consent, Html(html)))
}

pub async fn about(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let consent = consent::read(&headers);
    let team = state.team.read().await;
    let html = AboutTemplate {
        show_consent_banner: !consent.has_consent(),
        about: team.about().clone(),
        members: team.members().to_vec(),
    }
    .render()?;
    Ok(with_consent_cleanup(consent, Html(html)))
}

pub async fn contact(headers: HeaderMap) -> Result<Response, AppError> {
    let consent = consent::read(&headers);
    let html = ContactTemplate {
        show_consent_banner: !consent.has_consent(),
        org: &ORGANIZATION,
    }
    .render()?;
    Ok(with_consent_cleanup(consent, Html(html)))
}
