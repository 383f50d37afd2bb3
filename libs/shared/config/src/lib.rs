use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub redis_url: String,
    pub business_open_hour: u32,
    pub business_close_hour: u32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_service_key: env::var("SUPABASE_SERVICE_ROLE_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_SERVICE_ROLE_KEY not set, using empty value");
                    String::new()
                }),
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| {
                    warn!("REDIS_URL not set, using default");
                    "redis://localhost:6379".to_string()
                }),
            business_open_hour: hour_from_env("BUSINESS_OPEN_HOUR", 8),
            business_close_hour: hour_from_env("BUSINESS_CLOSE_HOUR", 18),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_service_key.is_empty()
    }
}

fn hour_from_env(var: &str, default: u32) -> u32 {
    match env::var(var) {
        Ok(raw) => match raw.parse::<u32>() {
            Ok(hour) if hour <= 23 => hour,
            _ => {
                warn!("{} is not a valid hour, using {}", var, default);
                default
            }
        },
        Err(_) => default,
    }
}
