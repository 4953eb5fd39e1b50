use crate::core::youtube::thumbnail_url;
use crate::discord::{Context, Error};
use chrono::Utc;

/// Get the full size thumbnail of a YouTube video.
#[poise::command(prefix_command, aliases("yt"))]
pub async fn thumbnail(
    ctx: Context<'_>,
    #[description = "YouTube video URL"] url: String,
) -> Result<(), Error> {
    match thumbnail_url(&url, Utc::now()) {
        Ok(thumbnail) => {
            ctx.reply(thumbnail).await?;
        }
        Err(e) => tracing::debug!("Ignoring thumbnail request: {}", e),
    }
    Ok(())
}
