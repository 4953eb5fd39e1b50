use crate::discord::{Context, Error};

/// Show the commands, or details about one of them.
#[poise::command(prefix_command, track_edits)]
pub async fn help(
    ctx: Context<'_>,
    #[description = "Command to explain"] command: Option<String>,
) -> Result<(), Error> {
    let footer = format!(
        "Type {prefix}help <command> for more info on a command.",
        prefix = ctx.data().prefix
    );

    poise::builtins::help(
        ctx,
        command.as_deref(),
        poise::builtins::HelpConfiguration {
            extra_text_at_bottom: &footer,
            ..Default::default()
        },
    )
    .await?;
    Ok(())
}
