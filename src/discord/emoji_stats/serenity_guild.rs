// Serenity implementations of the emoji stats ports.
//
// `SerenityGuild` answers "which emojis, which channels, what history" from the
// cache and the HTTP API. `ChannelSink` posts report lines into a channel.

use crate::core::emoji_stats::{
    ChannelHistorySource, ChannelInfo, EmojiCatalog, EmojiStatsError, GuildDirectory,
    HistoryMessage, MessageSink,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use poise::serenity_prelude as serenity;
use std::sync::Arc;

/// Largest page the messages endpoint hands out.
const PAGE_SIZE: u8 = 100;
/// Milliseconds between the Unix epoch and the first second of 2015.
const DISCORD_EPOCH_MS: i64 = 1_420_070_400_000;

pub struct SerenityGuild {
    http: Arc<serenity::Http>,
    cache: Arc<serenity::Cache>,
    guild_id: serenity::GuildId,
    bot_id: serenity::UserId,
    name: String,
}

impl SerenityGuild {
    pub fn new(
        http: Arc<serenity::Http>,
        cache: Arc<serenity::Cache>,
        guild_id: serenity::GuildId,
        bot_id: serenity::UserId,
        name: String,
    ) -> Self {
        Self {
            http,
            cache,
            guild_id,
            bot_id,
            name,
        }
    }

    async fn bot_member(&self) -> Result<serenity::Member, EmojiStatsError> {
        let cached = self
            .cache
            .guild(self.guild_id)
            .and_then(|guild| guild.members.get(&self.bot_id).cloned());
        if let Some(member) = cached {
            return Ok(member);
        }

        self.guild_id
            .member(self.http.as_ref(), self.bot_id)
            .await
            .map_err(|e| EmojiStatsError::ChannelsUnavailable(e.to_string()))
    }
}

/// Smallest message id that can exist at `time`; `after` is exclusive.
pub fn snowflake_at(time: DateTime<Utc>) -> u64 {
    let since_epoch = (time.timestamp_millis() - DISCORD_EPOCH_MS).max(0) as u64;
    since_epoch << 22
}

/// Where the next page starts, given this page's ids in ascending order.
/// A short page is the last one.
fn next_cursor(page: &[serenity::MessageId]) -> Option<serenity::MessageId> {
    if page.len() < PAGE_SIZE as usize {
        return None;
    }
    page.last().copied()
}

fn to_history_message(message: &serenity::Message) -> HistoryMessage {
    HistoryMessage {
        author_id: message.author.id.get(),
        content: message.content.clone(),
        reactions: message
            .reactions
            .iter()
            .map(|reaction| reaction.reaction_type.to_string())
            .collect(),
    }
}

impl ChannelHistorySource for SerenityGuild {
    fn history(
        &self,
        channel_id: u64,
        after: DateTime<Utc>,
    ) -> BoxStream<'_, Result<HistoryMessage, EmojiStatsError>> {
        let http = Arc::clone(&self.http);
        let channel = serenity::ChannelId::new(channel_id);
        // Snowflakes start at 1; 0 would be rejected by the API.
        let start = serenity::MessageId::new(snowflake_at(after).max(1));

        // One request per page; the next page starts after the newest message
        // of this one. Discord returns each page newest first.
        stream::try_unfold(Some(start), move |cursor| {
            let http = Arc::clone(&http);
            async move {
                let Some(cursor) = cursor else {
                    return Ok::<_, EmojiStatsError>(None);
                };

                let mut page = channel
                    .messages(
                        http.as_ref(),
                        serenity::GetMessages::new().after(cursor).limit(PAGE_SIZE),
                    )
                    .await
                    .map_err(|e| EmojiStatsError::History {
                        channel_id,
                        reason: e.to_string(),
                    })?;
                page.sort_by_key(|message| message.id);

                let ids: Vec<serenity::MessageId> = page.iter().map(|message| message.id).collect();
                let next = next_cursor(&ids);
                let messages: Vec<Result<HistoryMessage, EmojiStatsError>> =
                    page.iter().map(|message| Ok(to_history_message(message))).collect();

                Ok(Some((stream::iter(messages), next)))
            }
        })
        .try_flatten()
        .boxed()
    }
}

#[async_trait]
impl GuildDirectory for SerenityGuild {
    fn guild_name(&self) -> &str {
        &self.name
    }

    fn self_id(&self) -> u64 {
        self.bot_id.get()
    }

    async fn emoji_catalog(&self) -> Result<EmojiCatalog, EmojiStatsError> {
        let cached: Option<Vec<serenity::Emoji>> = self
            .cache
            .guild(self.guild_id)
            .map(|guild| guild.emojis.values().cloned().collect());

        let mut emojis = match cached {
            Some(emojis) => emojis,
            None => self
                .guild_id
                .emojis(self.http.as_ref())
                .await
                .map_err(|e| EmojiStatsError::CatalogUnavailable(e.to_string()))?,
        };
        // Creation order, so ties in the report are stable between runs.
        emojis.sort_by_key(|emoji| emoji.id);

        Ok(emojis.iter().map(|emoji| emoji.to_string()).collect())
    }

    async fn channels(&self) -> Result<Vec<ChannelInfo>, EmojiStatsError> {
        let member = self.bot_member().await?;

        let guild = self.cache.guild(self.guild_id).ok_or_else(|| {
            EmojiStatsError::ChannelsUnavailable(format!("guild {} is not cached", self.guild_id))
        })?;

        let mut text_channels: Vec<&serenity::GuildChannel> = guild
            .channels
            .values()
            .filter(|channel| {
                matches!(
                    channel.kind,
                    serenity::ChannelType::Text | serenity::ChannelType::News
                )
            })
            .collect();
        text_channels.sort_by_key(|channel| (channel.position, channel.id));

        Ok(text_channels
            .into_iter()
            .map(|channel| ChannelInfo {
                id: channel.id.get(),
                name: channel.name.clone(),
                can_read_history: guild
                    .user_permissions_in(channel, &member)
                    .read_message_history(),
            })
            .collect())
    }
}

/// Posts each report line as its own message.
pub struct ChannelSink {
    http: Arc<serenity::Http>,
    channel_id: serenity::ChannelId,
}

impl ChannelSink {
    pub fn new(http: Arc<serenity::Http>, channel_id: serenity::ChannelId) -> Self {
        Self { http, channel_id }
    }
}

#[async_trait]
impl MessageSink for ChannelSink {
    async fn send(&self, text: String) -> Result<(), EmojiStatsError> {
        self.channel_id
            .say(self.http.as_ref(), text)
            .await
            .map(|_| ())
            .map_err(|e| EmojiStatsError::Send(e.to_string()))
    }
}
