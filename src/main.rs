use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Result};
use dotenvy::dotenv;

use tubedrop::cli::{Cli, Commands};
use tubedrop::core::logging::{install_panic_hook, log_tools_configuration};
use tubedrop::core::utils::format_approx_size;
use tubedrop::core::{init_logger, Config};
use tubedrop::download::{VideoSource, YtDlpSource};
use tubedrop::i18n;
use tubedrop::storage::{create_pool, UsageStore};
use tubedrop::telegram::handlers::{extract_video_id, format_summary};
use tubedrop::telegram::{
    create_bot, default_handlers, notify_admin_startup, setup_bot_commands, Dispatcher, HandlerDeps,
    TeloxideTransport, Transport,
};

/// Main entry point for the Telegram bot
///
/// Parses CLI arguments and dispatches to appropriate subcommand.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Load environment variables from .env if present
    let _ = dotenv();

    let config = Config::from_env()?;
    init_logger(&config.log_file_path)?;
    install_panic_hook();

    match cli.command {
        Some(Commands::Run) | None => run_bot(config).await,
        Some(Commands::Stats { top }) => run_cli_stats(&config, top),
        Some(Commands::Formats { target }) => run_cli_formats(&config, &target).await,
    }
}

/// Prints aggregate usage from the database
fn run_cli_stats(config: &Config, top: usize) -> Result<()> {
    let pool = create_pool(&config.database_path)?;
    let store = UsageStore::new(Arc::new(pool));
    let summary = store.summary(None, top)?;
    println!("{}", format_summary(&i18n::default_lang(), &summary));
    Ok(())
}

/// Prints the quality options offered for a link or bare video id
async fn run_cli_formats(config: &Config, target: &str) -> Result<()> {
    let video_id = match extract_video_id(target) {
        Some(id) => id,
        None if is_bare_video_id(target) => target.to_string(),
        None => bail!("Not a YouTube link or video id: {}", target),
    };

    let source = YtDlpSource::from_config(config);
    let options = source.list_formats(&video_id).await?;
    println!("Quality options for {}:", video_id);
    for option in options {
        let size = option
            .size_bytes
            .map(format_approx_size)
            .unwrap_or_else(|| "size unknown".to_string());
        println!(
            "  {:<8} {:<12} audio: {:<5} ({})",
            option.label,
            size,
            option.has_audio,
            option.description
        );
    }
    Ok(())
}

fn is_bare_video_id(target: &str) -> bool {
    target.len() == 11 && target.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

async fn run_bot(config: Config) -> Result<()> {
    let bot_init_start = Instant::now();
    log::info!("Starting bot (version {}, host {})", config.app_version, config.host_name);

    log_tools_configuration(&config.tools, config.limits.transcode_enabled).await;

    let pool = Arc::new(create_pool(&config.database_path)?);
    log::info!("Database ready at {}", config.database_path);
    let store = UsageStore::new(pool);

    let bot = create_bot(&config)?;
    if let Err(e) = setup_bot_commands(&bot, &i18n::default_lang()).await {
        log::warn!("Failed to set bot commands: {}", e);
    }

    let transport: Arc<dyn Transport> = Arc::new(TeloxideTransport::new(bot.clone()));
    let source: Arc<dyn VideoSource> = Arc::new(YtDlpSource::from_config(&config));
    let deps = HandlerDeps::new(
        transport.clone(),
        store,
        source,
        config.limits,
        config.send_as_document,
    );
    let dispatcher = Dispatcher::new(default_handlers(&deps));
    log::info!("Registered handlers: {:?}", dispatcher.handler_names());

    notify_admin_startup(transport.as_ref(), config.admin_chat_id, &config).await;

    log::info!("================================================");
    log::info!("🎉 Bot initialization complete in {:.2}s", bot_init_start.elapsed().as_secs_f64());
    log::info!("================================================");

    dispatcher.run(bot).await;
    log::info!("Bot stopped");
    Ok(())
}
