use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

/// Look up stock prices. Up to ten symbols at once.
#[poise::command(prefix_command)]
pub async fn stock(
    ctx: Context<'_>,
    #[description = "Ticker symbols, e.g. AAPL 2330.TW COVER"] symbols: Vec<String>,
) -> Result<(), Error> {
    if symbols.is_empty() {
        return Ok(());
    }

    let _typing = ctx
        .channel_id()
        .start_typing(&ctx.serenity_context().http);
    let summaries = ctx.data().stocks.summaries(&symbols).await;
    if summaries.is_empty() {
        return Ok(());
    }

    let reply = summaries.into_iter().fold(poise::CreateReply::default(), |reply, summary| {
        reply.embed(
            serenity::CreateEmbed::new()
                .title(summary.title)
                .url(summary.url)
                .description(summary.description)
                .color(summary.color),
        )
    });

    ctx.send(reply).await?;
    Ok(())
}
