pub mod events;
pub mod news;
pub mod partners;
pub mod registrations;
pub mod slug;
pub mod team;
pub mod testimonials;
pub mod validation;
