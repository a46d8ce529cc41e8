pub mod events;
pub mod login;
pub mod partners;
pub mod routes;
pub mod session;
pub mod team;
pub mod testimonials;
