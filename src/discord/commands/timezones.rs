use crate::discord::{Context, Error};
use chrono::Utc;

const PARSE_ERROR_REPLY: &str = "```Parse Error```";

/// Show a time in the team's time zones. Defaults to now.
///
/// Examples: `time`, `time 21:30`, `time 2024-05-01 9pm JST`, `time 08:00 +0900`
#[poise::command(prefix_command)]
pub async fn time(
    ctx: Context<'_>,
    #[description = "Date, time and zone"] args: Vec<String>,
) -> Result<(), Error> {
    let timezones = &ctx.data().timezones;
    let now = Utc::now();

    let reply = if args.is_empty() {
        timezones.render(now)
    } else {
        match timezones.parse(&args.join(" "), now) {
            Ok(at) => timezones.render(at),
            Err(e) => {
                tracing::debug!(input = %args.join(" "), "Could not parse time: {}", e);
                PARSE_ERROR_REPLY.to_string()
            }
        }
    };

    ctx.say(reply).await?;
    Ok(())
}
