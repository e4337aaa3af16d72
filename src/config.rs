use anyhow::{anyhow, Result};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub telegram_bot_token: String,
    /// Telegram user id of the teacher account.
    pub admin_id: i64,
    pub database_url: String,
    pub http_port: u16,
    /// Where homework task files and student answer files are stored.
    pub homework_dir: PathBuf,
    /// Where question attachments are stored.
    pub question_dir: PathBuf,
    /// Where option images for choice questions are stored.
    pub test_media_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let token = env::var("TELEGRAM_BOT_TOKEN")
            .map_err(|_| anyhow!("TELEGRAM_BOT_TOKEN must be set"))?;

        if token.trim().is_empty() {
            return Err(anyhow!("TELEGRAM_BOT_TOKEN must be set"));
        }

        let admin_id = env::var("ADMIN_ID")
            .map_err(|_| anyhow!("ADMIN_ID must be set"))?
            .trim()
            .parse()
            .map_err(|_| anyhow!("ADMIN_ID must be a Telegram user id"))?;

        let database_url = env::var("DATABASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "sqlite:./data/classwork.db".to_string());

        let port_str = env::var("HTTP_PORT").unwrap_or_else(|_| "3000".to_string());
        let http_port = port_str
            .trim()
            .parse()
            .map_err(|_| anyhow!("Invalid HTTP_PORT"))?;

        let homework_dir =
            PathBuf::from(env::var("HOMEWORK_DIR").unwrap_or_else(|_| "homeworks".to_string()));
        let question_dir =
            PathBuf::from(env::var("QUESTION_DIR").unwrap_or_else(|_| "questions".to_string()));
        let test_media_dir =
            PathBuf::from(env::var("TEST_MEDIA_DIR").unwrap_or_else(|_| "test_media".to_string()));

        Ok(Config {
            telegram_bot_token: token,
            admin_id,
            database_url,
            http_port,
            homework_dir,
            question_dir,
            test_media_dir,
        })
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        user_id == self.admin_id
    }
}
