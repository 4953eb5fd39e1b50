// The emoji count command. Thin: build the serenity adapters, hand them to the
// core service, keep one scan per guild.

use crate::discord::emoji_stats::{ChannelSink, SerenityGuild};
use crate::discord::{Context, Error};
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// Count the emojis used in this server over the last weeks.
#[poise::command(prefix_command, guild_only, aliases("emojis"))]
pub async fn emoji(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?;

    let _scan = match ScanGuard::acquire(&ctx.data().active_scans, guild_id.get()) {
        Ok(scan) => scan,
        Err(started) => {
            let running_secs = (Utc::now() - started).num_seconds().max(0);
            tracing::info!(guild_id = %guild_id, running_secs, "Emoji count already running");
            ctx.say(format!(
                "Already counting emojis in this server (started {running_secs}s ago), hang on..."
            ))
            .await?;
            return Ok(());
        }
    };

    let guild_name = ctx
        .guild()
        .map(|guild| guild.name.clone())
        .unwrap_or_else(|| guild_id.to_string());
    tracing::info!(guild = %guild_name, user = %ctx.author().name, "Emoji count requested");

    let serenity_ctx = ctx.serenity_context();
    let guild = Arc::new(SerenityGuild::new(
        Arc::clone(&serenity_ctx.http),
        Arc::clone(&serenity_ctx.cache),
        guild_id,
        ctx.framework().bot_id,
        guild_name,
    ));
    let sink = ChannelSink::new(Arc::clone(&serenity_ctx.http), ctx.channel_id());

    // Typing stops when this is dropped.
    let _typing = ctx.channel_id().start_typing(&serenity_ctx.http);
    ctx.data().emoji_stats.run_report(guild, &sink).await;

    Ok(())
}

/// Marks a guild as busy for as long as it lives.
struct ScanGuard<'a> {
    scans: &'a DashMap<u64, DateTime<Utc>>,
    guild_id: u64,
}

impl<'a> ScanGuard<'a> {
    /// Fails with the start time of the scan already running in this guild.
    fn acquire(
        scans: &'a DashMap<u64, DateTime<Utc>>,
        guild_id: u64,
    ) -> Result<Self, DateTime<Utc>> {
        match scans.entry(guild_id) {
            Entry::Occupied(running) => Err(*running.get()),
            Entry::Vacant(slot) => {
                slot.insert(Utc::now());
                Ok(Self { scans, guild_id })
            }
        }
    }
}

impl Drop for ScanGuard<'_> {
    fn drop(&mut self) {
        self.scans.remove(&self.guild_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_scan_in_same_guild_is_refused() {
        let scans = DashMap::new();

        let first = ScanGuard::acquire(&scans, 1);
        assert!(first.is_ok());
        assert!(ScanGuard::acquire(&scans, 1).is_err());
        assert!(ScanGuard::acquire(&scans, 2).is_ok());
    }

    #[test]
    fn refusal_reports_when_the_running_scan_started() {
        let scans = DashMap::new();
        let started = Utc::now() - chrono::Duration::seconds(30);
        scans.insert(7, started);

        assert_eq!(ScanGuard::acquire(&scans, 7).err(), Some(started));
    }

    #[test]
    fn guard_releases_on_drop() {
        let scans = DashMap::new();

        drop(ScanGuard::acquire(&scans, 1));

        assert!(scans.is_empty());
        assert!(ScanGuard::acquire(&scans, 1).is_ok());
    }
}
