use std::env;

/// Environment configuration
/// Loads and validates environment variables
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub smtp: Option<SmtpConfig>,
}

/// Mail transport settings. Absent when SMTP_HOST is not configured,
/// in which case the email notification channel is not mounted.
#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| "DATABASE_URL must be set".to_string())?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| "JWT_SECRET must be set".to_string())?;

        let smtp = match env::var("SMTP_HOST") {
            Ok(host) => {
                let port = env::var("SMTP_PORT")
                    .unwrap_or_else(|_| "587".to_string())
                    .parse::<u16>()
                    .map_err(|_| "SMTP_PORT must be a port number".to_string())?;

                let username = env::var("SMTP_USERNAME")
                    .map_err(|_| "SMTP_USERNAME must be set when SMTP_HOST is".to_string())?;

                let password = env::var("SMTP_PASSWORD")
                    .map_err(|_| "SMTP_PASSWORD must be set when SMTP_HOST is".to_string())?;

                let from_address = env::var("SMTP_FROM")
                    .unwrap_or_else(|_| username.clone());

                Some(SmtpConfig {
                    host,
                    port,
                    username,
                    password,
                    from_address,
                })
            }
            Err(_) => None,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            smtp,
        })
    }
}
