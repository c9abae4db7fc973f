use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::{ChatId, InputFile, ParseMode};
use teloxide::utils::command::BotCommands;

use super::callback::CallbackAction;
use super::replies;
use super::Command;
use crate::config::TestMode;
use crate::context::AppContext;
use crate::demo::FIXTURE_URLS;
use crate::VkStatsError;

const FIXTURE_PAUSE: Duration = Duration::from_secs(2);

pub async fn command(bot: Bot, msg: Message, cmd: Command, ctx: Arc<AppContext>) -> ResponseResult<()> {
    let chat_id = msg.chat.id;
    match cmd {
        Command::Start => {
            bot.send_message(chat_id, replies::greeting()).await?;
        }
        Command::Help => {
            bot.send_message(chat_id, Command::descriptions().to_string())
                .await?;
        }
        Command::Analyze => send_album_list(&bot, chat_id, &ctx).await?,
        Command::Test => {
            if ctx.config.test_mode != TestMode::Manual {
                bot.send_message(chat_id, replies::TEST_MODE_DISABLED).await?;
                return Ok(());
            }
            if let Err(e) = ctx.reset() {
                log::error!("Failed to clear the database: {e}");
                bot.send_message(chat_id, replies::INTERNAL_ERROR).await?;
                return Ok(());
            }
            for url in FIXTURE_URLS {
                log::info!("Replaying fixture link {url}");
                add_album(&bot, chat_id, url, &ctx).await?;
                tokio::time::sleep(FIXTURE_PAUSE).await;
            }
        }
    }
    Ok(())
}

/// Any other text message is taken as an album link.
pub async fn link(bot: Bot, msg: Message, ctx: Arc<AppContext>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    add_album(&bot, msg.chat.id, text, &ctx).await
}

async fn add_album(bot: &Bot, chat_id: ChatId, url: &str, ctx: &AppContext) -> ResponseResult<()> {
    let waiting = bot.send_message(chat_id, replies::THINKING).await?;
    if let Some(status) = replies::scrape_status(url) {
        if let Err(e) = bot.edit_message_text(chat_id, waiting.id, status).await {
            log::debug!("Could not update the waiting message: {e}");
        }
    }
    let result = ctx.add_album(url).await;
    if let Err(e) = bot.delete_message(chat_id, waiting.id).await {
        log::debug!("Could not delete the waiting message: {e}");
    }
    if let Err(e) = &result {
        if !e.is_user_facing() {
            log::error!("Failed to add album {url}: {e}");
        }
    }

    match result {
        Ok(album) => {
            bot.send_message(chat_id, replies::album_added(&album))
                .parse_mode(ParseMode::Html)
                .await?;
        }
        Err(VkStatsError::InvalidLink(_)) => {
            bot.send_message(chat_id, replies::invalid_link()).await?;
        }
        Err(VkStatsError::DuplicateAlbum(_)) => {
            bot.send_message(chat_id, replies::DUPLICATE_ALBUM).await?;
        }
        Err(VkStatsError::NotFound(_)) => {
            bot.send_message(chat_id, replies::ALBUM_NOT_FOUND).await?;
        }
        Err(_) => {
            bot.send_message(chat_id, replies::SCRAPE_FAILED).await?;
        }
    }
    Ok(())
}

async fn send_album_list(bot: &Bot, chat_id: ChatId, ctx: &AppContext) -> ResponseResult<()> {
    let albums = match ctx.albums() {
        Ok(albums) => albums,
        Err(e) => {
            log::error!("Failed to list albums: {e}");
            bot.send_message(chat_id, replies::INTERNAL_ERROR).await?;
            return Ok(());
        }
    };

    if albums.is_empty() {
        bot.send_message(chat_id, replies::NO_ALBUMS).await?;
        return Ok(());
    }

    bot.send_message(chat_id, replies::CHOOSE_ALBUM)
        .reply_markup(replies::album_list_keyboard(&albums))
        .await?;
    Ok(())
}

pub async fn callback(bot: Bot, q: CallbackQuery, ctx: Arc<AppContext>) -> ResponseResult<()> {
    bot.answer_callback_query(q.id.clone()).await?;

    let Some((chat_id, message_id)) = q.message.as_ref().map(|m| (m.chat().id, m.id())) else {
        log::debug!("Callback query without a message, ignoring");
        return Ok(());
    };
    let Some(action) = q.data.as_deref().and_then(CallbackAction::parse) else {
        log::warn!("Unknown callback data {:?}", q.data);
        return Ok(());
    };
    log::debug!("Callback {action} in chat {chat_id}");

    match action {
        CallbackAction::ShowAlbum(id) => {
            let _ = bot.delete_message(chat_id, message_id).await;
            match ctx.album(id) {
                Ok(album) => {
                    bot.send_message(chat_id, replies::album_details(&album))
                        .parse_mode(ParseMode::Html)
                        .reply_markup(replies::album_details_keyboard(album.id))
                        .await?;
                }
                Err(VkStatsError::NotFound(_)) => {
                    bot.send_message(chat_id, replies::ALBUM_INFO_MISSING).await?;
                }
                Err(e) => {
                    log::error!("Failed to load album {id}: {e}");
                    bot.send_message(chat_id, replies::INTERNAL_ERROR).await?;
                }
            }
        }
        CallbackAction::ShowStats(id) => match ctx.album_charts(id).await {
            Ok(charts) => {
                // Each file is removed as its handle drops, sent or not.
                for chart in charts {
                    bot.send_photo(chat_id, InputFile::file(chart.path().to_path_buf()))
                        .await?;
                }
            }
            Err(VkStatsError::InsufficientData { .. }) => {
                bot.send_message(chat_id, replies::INSUFFICIENT_DATA).await?;
            }
            Err(e) => {
                log::error!("Failed to chart album {id}: {e}");
                bot.send_message(chat_id, replies::INTERNAL_ERROR).await?;
            }
        },
        CallbackAction::BackToList => {
            let _ = bot.delete_message(chat_id, message_id).await;
            send_album_list(&bot, chat_id, &ctx).await?;
        }
    }
    Ok(())
}
