//! Telegram front end.

use std::sync::Arc;
use teloxide::dispatching::UpdateHandler;
use teloxide::error_handlers::LoggingErrorHandler;
use teloxide::prelude::*;
use teloxide::update_listeners::Polling;
use teloxide::utils::command::BotCommands;

use crate::context::AppContext;

mod callback;
mod handlers;
pub mod replies;

pub use callback::CallbackAction;

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "These commands are supported:")]
pub enum Command {
    #[command(description = "start the bot")]
    Start,
    #[command(description = "show this text")]
    Help,
    #[command(description = "list tracked albums")]
    Analyze,
    #[command(description = "replay the test links (test mode 1)")]
    Test,
}

/// Routing of updates: commands, then any text as a link, then button presses.
pub fn schema() -> UpdateHandler<teloxide::RequestError> {
    let commands = dptree::entry()
        .filter_command::<Command>()
        .endpoint(handlers::command);

    let messages = Update::filter_message()
        .branch(commands)
        .branch(dptree::endpoint(handlers::link));

    let callbacks = Update::filter_callback_query().endpoint(handlers::callback);

    dptree::entry().branch(messages).branch(callbacks)
}

/// Register the command menu and dispatch updates until Ctrl-C.
///
/// Updates that queued up while the bot was offline are dropped.
pub async fn run(bot: Bot, ctx: Arc<AppContext>) {
    match bot.set_my_commands(Command::bot_commands()).await {
        Ok(_) => log::info!("Registered bot commands"),
        Err(e) => log::warn!("Failed to register bot commands: {e}"),
    }

    let listener = Polling::builder(bot.clone()).drop_pending_updates().build();

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![ctx])
        .default_handler(|update| async move {
            log::debug!("Unhandled update: {:?}", update.kind);
        })
        .error_handler(LoggingErrorHandler::with_custom_text(
            "An error occurred while handling an update",
        ))
        .enable_ctrlc_handler()
        .build()
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("An error from the update listener"),
        )
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("/start", "vk_stats_bot").unwrap(), Command::Start);
        assert_eq!(Command::parse("/analyze", "vk_stats_bot").unwrap(), Command::Analyze);
        assert_eq!(Command::parse("/test@vk_stats_bot", "vk_stats_bot").unwrap(), Command::Test);
        assert!(Command::parse("/stats", "vk_stats_bot").is_err());
    }

    #[test]
    fn test_command_menu() {
        let names: Vec<String> = Command::bot_commands()
            .into_iter()
            .map(|c| c.command.trim_start_matches('/').to_string())
            .collect();
        assert_eq!(names, vec!["start", "help", "analyze", "test"]);
    }
}
