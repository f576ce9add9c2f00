//! Bot instance creation and command menu

use reqwest::ClientBuilder;
use secrecy::ExposeSecret;
use teloxide::prelude::*;
use teloxide::types::BotCommand;
use unic_langid::LanguageIdentifier;

use crate::core::config::{self, Config};
use crate::core::error::{AppError, AppResult};
use crate::i18n;

/// Creates a Bot instance with custom or default API URL
pub fn create_bot(config: &Config) -> AppResult<Bot> {
    let token = config.require_bot_token()?;
    let client = ClientBuilder::new().timeout(config::network::timeout()).build()?;
    let bot = Bot::with_client(token.expose_secret(), client);

    // Check if local Bot API server is configured
    let bot = match &config.bot_api_url {
        Some(api_url) => {
            log::info!("Using custom Bot API URL: {}", api_url);
            let url =
                url::Url::parse(api_url).map_err(|e| AppError::Config(format!("Invalid BOT_API_URL: {}", e)))?;
            bot.set_api_url(url)
        }
        None => bot,
    };

    Ok(bot)
}

/// Commands shown in the Telegram menu.
pub fn bot_commands(lang: &LanguageIdentifier) -> Vec<BotCommand> {
    vec![
        BotCommand::new("start", i18n::t(lang, "command-start")),
        BotCommand::new("stats", i18n::t(lang, "command-stats")),
    ]
}

/// Sets up bot commands in Telegram UI
pub async fn setup_bot_commands(bot: &Bot, lang: &LanguageIdentifier) -> Result<(), teloxide::RequestError> {
    bot.set_my_commands(bot_commands(lang)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(vars: &[(&str, &str)]) -> Config {
        let vars: Vec<(String, String)> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| vars.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())).unwrap()
    }

    #[test]
    fn test_create_bot_requires_token() {
        let err = create_bot(&config_with(&[])).unwrap_err();
        assert!(err.to_string().contains("TELEGRAM_BOT_TOKEN"));
    }

    #[test]
    fn test_create_bot_rejects_invalid_api_url() {
        let config = config_with(&[("TELEGRAM_BOT_TOKEN", "123:abc"), ("BOT_API_URL", "not a url")]);
        assert!(matches!(create_bot(&config), Err(AppError::Config(_))));
    }

    #[test]
    fn test_bot_commands_cover_start_and_stats() {
        let names: Vec<String> = bot_commands(&i18n::default_lang())
            .into_iter()
            .map(|c| c.command)
            .collect();
        assert_eq!(names, vec!["start".to_string(), "stats".to_string()]);
    }
}
