use tokio::sync::{Mutex, RwLock};

use crate::admin::session::SessionStore;
use crate::auth::accounts::AccountStore;
use crate::content::events::EventStore;
use crate::content::news::NewsStore;
use crate::content::partners::PartnerStore;
use crate::content::team::TeamStore;
use crate::content::testimonials::TestimonialStore;
use crate::guard::LoginGuard;

pub struct AppState {
    pub news: RwLock<NewsStore>,
    pub events: RwLock<EventStore>,
    pub partners: RwLock<PartnerStore>,
    pub testimonials: RwLock<TestimonialStore>,
    pub team: RwLock<TeamStore>,
    pub accounts: AccountStore,
    pub login_guard: Mutex<LoginGuard>,
    pub sessions: Mutex<SessionStore>,
    pub secure_cookies: bool,
}
