use crate::core::misc::{choose_reply, purge_limit, raw_message_block};
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

/// Send the raw text of your message.
#[poise::command(prefix_command)]
pub async fn raw(ctx: Context<'_>) -> Result<(), Error> {
    let poise::Context::Prefix(prefix_ctx) = ctx else {
        return Ok(());
    };

    ctx.say(raw_message_block(&prefix_ctx.msg.content)).await?;
    Ok(())
}

/// Randomly choose one of the given options.
#[poise::command(prefix_command)]
pub async fn choose(
    ctx: Context<'_>,
    #[description = "Options to pick from"] options: Vec<String>,
) -> Result<(), Error> {
    let reply = choose_reply(&options, &mut rand::thread_rng());

    if let Some(reply) = reply {
        ctx.say(reply).await?;
    }
    Ok(())
}

/// Delete this bot's messages among the most recent ones in this channel.
#[poise::command(prefix_command, owners_only, guild_only)]
pub async fn clean(
    ctx: Context<'_>,
    #[description = "How many recent messages to look through (default 100)"] limit: Option<u64>,
) -> Result<(), Error> {
    let limit = purge_limit(limit);
    let http = &ctx.serenity_context().http;
    let channel_id = ctx.channel_id();
    let bot_id = ctx.framework().bot_id;

    let mut inspected = 0u64;
    let mut deleted = 0u64;
    let mut before: Option<serenity::MessageId> = None;

    while inspected < limit {
        let page_size = (limit - inspected).min(100) as u8;
        let mut request = serenity::GetMessages::new().limit(page_size);
        if let Some(before) = before {
            request = request.before(before);
        }

        let page = channel_id.messages(http, request).await?;
        if page.is_empty() {
            break;
        }
        inspected += page.len() as u64;
        before = page.last().map(|message| message.id);

        for message in page.iter().filter(|message| message.author.id == bot_id) {
            match channel_id.delete_message(http, message.id).await {
                Ok(()) => deleted += 1,
                Err(e) => tracing::warn!(message_id = %message.id, "Failed to delete message: {}", e),
            }
        }
    }

    tracing::info!(
        channel_id = %channel_id,
        inspected,
        deleted,
        "Cleaned up own messages"
    );
    Ok(())
}

/// Shut the bot down.
#[poise::command(prefix_command, owners_only)]
pub async fn bye(ctx: Context<'_>) -> Result<(), Error> {
    tracing::info!(user = %ctx.author().name, "Shutdown requested");
    ctx.framework().shard_manager().shutdown_all().await;
    Ok(())
}
