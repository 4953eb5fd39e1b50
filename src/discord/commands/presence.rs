// Bot presence. Points people at the main command.

use poise::serenity_prelude as serenity;

pub fn status_text(prefix: &str) -> String {
    format!("{}emoji", prefix)
}

/// Called once the bot is ready.
pub fn on_ready(ctx: &serenity::Context, prefix: &str) {
    let activity = serenity::ActivityData::playing(status_text(prefix));
    ctx.set_presence(Some(activity), serenity::OnlineStatus::Online);
}
