use std::collections::HashMap;
use std::time::{Duration, Instant};

use rand::Rng;

const SESSION_DURATION: Duration = Duration::from_secs(3600);
pub const SESSION_COOKIE_NAME: &str = "session";

#[derive(Debug, Clone)]
pub struct AdminSession {
    pub token: String,
    pub email: String,
    pub created_at: Instant,
}

impl AdminSession {
    pub fn new(email: String) -> Self {
        AdminSession {
            token: generate_session_token(),
            email,
            created_at: Instant::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() > SESSION_DURATION
    }
}

#[derive(Default)]
pub struct SessionStore {
    sessions: HashMap<String, AdminSession>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, email: String) -> AdminSession {
        let session = AdminSession::new(email);
        self.sessions.insert(session.token.clone(), session.clone());
        session
    }

    pub fn get(&self, token: &str) -> Option<&AdminSession> {
        self.sessions.get(token).filter(|s| !s.is_expired())
    }

    pub fn remove(&mut self, token: &str) {
        self.sessions.remove(token);
    }

    pub fn cleanup_expired(&mut self) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, s| !s.is_expired());
        before - self.sessions.len()
    }
}

pub fn set_session_cookie(token: &str) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/admin",
        SESSION_COOKIE_NAME, token
    )
}

pub fn clear_session_cookie() -> String {
    format!(
        "{}=; HttpOnly; SameSite=Strict; Path=/admin; Max-Age=0",
        SESSION_COOKIE_NAME
    )
}

fn generate_session_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: Vec<u8> = (0..32).map(|_| rng.r#gen()).collect();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
