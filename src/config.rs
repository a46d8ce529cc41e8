use std::path::PathBuf;

#[derive(Clone)]
pub struct Config {
    pub bind_addr: String,
    pub news_path: PathBuf,
    pub events_path: PathBuf,
    pub partners_path: PathBuf,
    pub testimonials_path: PathBuf,
    pub team_path: PathBuf,
    pub accounts_path: Option<PathBuf>,
    pub guard_state_path: Option<PathBuf>,
    pub secure_cookies: bool,
    pub admin: AdminConfig,
}

#[derive(Clone)]
pub struct AdminConfig {
    pub email: String,
    pub password: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let admin_email = std::env::var("DCTB_ADMIN_EMAIL")
            .map_err(|_| anyhow::anyhow!("DCTB_ADMIN_EMAIL environment variable is required"))?;
        let admin_password = std::env::var("DCTB_ADMIN_PASSWORD")
            .map_err(|_| anyhow::anyhow!("DCTB_ADMIN_PASSWORD environment variable is required"))?;

        Ok(Config {
            bind_addr: {
                let port = std::env::var("DCTB_PORT").unwrap_or_else(|_| "8080".to_string());
                std::env::var("DCTB_BIND_ADDR").unwrap_or_else(|_| format!("0.0.0.0:{}", port))
            },
            news_path: path_var("DCTB_NEWS_PATH", "./news.json"),
            events_path: path_var("DCTB_EVENTS_PATH", "./events.json"),
            partners_path: path_var("DCTB_PARTNERS_PATH", "./partners.json"),
            testimonials_path: path_var("DCTB_TESTIMONIALS_PATH", "./testimonials.json"),
            team_path: path_var("DCTB_TEAM_PATH", "./team.json"),
            accounts_path: std::env::var("DCTB_ACCOUNTS_PATH").ok().map(PathBuf::from),
            guard_state_path: std::env::var("DCTB_GUARD_STATE_PATH").ok().map(PathBuf::from),
            secure_cookies: std::env::var("DCTB_SECURE_COOKIES")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
            admin: AdminConfig {
                email: admin_email,
                password: admin_password,
            },
        })
    }
}

fn path_var(name: &str, default: &str) -> PathBuf {
    PathBuf::from(std::env::var(name).unwrap_or_else(|_| default.to_string()))
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes")
}
