//! Minimal host wiring: a Telegram bot with /ping and /greet, status updates,
//! and a text echo. Config from env (BOT_TOKEN required).

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crossbot::{Command, CommandField, Crossbot};
use crossbot_telegram::TelegramConfig;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = TelegramConfig::from_env()?;
    crossbot::init_tracing(config.log_file.as_deref())?;

    let bot = Arc::new(Crossbot::new());
    bot.add_command(Command::new("ping", "check that the bot is alive", false)?);
    bot.add_command(
        Command::new("greet", "say hello to someone", false)?
            .with_field(CommandField::new("name", "name", true)),
    );

    bot.register_command_handler(|interaction| async move {
        let Some(command) = interaction.command() else {
            return Ok(());
        };
        match command.name() {
            "ping" => interaction.reply("pong").await?,
            "greet" => {
                let fields = interaction.fields();
                let name = fields.get("name").map(String::as_str).unwrap_or("stranger");
                interaction.reply(&format!("Hello {name}!")).await?;
            }
            _ => {}
        }
        interaction.end().await?;
        Ok(())
    });

    bot.register_text_handler(|interaction| async move {
        info!(text = interaction.text(), "text received");
        interaction.reply("I only speak slash commands, try /ping").await?;
        interaction.end().await?;
        Ok(())
    });

    let ready_bot = Arc::clone(&bot);
    bot.register_ready_handler(move || {
        let bot = Arc::clone(&ready_bot);
        async move {
            bot.send_status_update("crossbot demo is up").await?;
            Ok(())
        }
    });

    let (adapter, telegram_bot) = crossbot_telegram::build(&config, bot.registry(), bot.event_sender())?;
    bot.add_messenger(adapter.clone());

    tokio::spawn(async move {
        if let Err(err) = crossbot_telegram::run_polling(adapter, telegram_bot).await {
            tracing::error!(error = %err, "telegram polling stopped");
        }
    });

    bot.run().await?;
    Ok(())
}
