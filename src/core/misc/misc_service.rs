// Small text helpers behind the `raw`, `choose` and `clean` commands.

use rand::seq::SliceRandom;
use rand::Rng;

pub const DEFAULT_PURGE_LIMIT: u64 = 100;

const ZERO_WIDTH_SPACE: char = '\u{200b}';

/// The message content inside a code block, exactly as typed.
///
/// Backticks get a zero-width space in front so they cannot close the block.
pub fn raw_message_block(content: &str) -> String {
    let escaped = content.replace('`', &format!("{ZERO_WIDTH_SPACE}`"));
    format!("```\n{escaped}\n```")
}

/// `> <option>` for a random option, `None` when there is nothing to pick.
pub fn choose_reply<R: Rng + ?Sized>(options: &[String], rng: &mut R) -> Option<String> {
    options.choose(rng).map(|choice| format!("> {choice}"))
}

pub fn purge_limit(requested: Option<u64>) -> u64 {
    requested.unwrap_or(DEFAULT_PURGE_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    #[test]
    fn raw_block_escapes_backticks() {
        assert_eq!(
            raw_message_block("$raw `code` <:pog:1>"),
            "```\n$raw \u{200b}`code\u{200b}` <:pog:1>\n```"
        );
    }

    #[test]
    fn raw_block_keeps_plain_text() {
        assert_eq!(raw_message_block("hello"), "```\nhello\n```");
    }

    #[test]
    fn choose_picks_one_of_the_options() {
        let options: Vec<String> = ["tea", "coffee", "water"].iter().map(|s| s.to_string()).collect();
        let mut rng = StepRng::new(0, 1);

        let reply = choose_reply(&options, &mut rng).unwrap();

        assert!(options.iter().any(|o| reply == format!("> {o}")));
    }

    #[test]
    fn choose_without_options_says_nothing() {
        let mut rng = StepRng::new(0, 1);
        assert_eq!(choose_reply(&[], &mut rng), None);
    }

    #[test]
    fn purge_defaults_to_one_hundred() {
        assert_eq!(purge_limit(None), 100);
        assert_eq!(purge_limit(Some(5)), 5);
    }
}
