//! Prompt text sent to generative providers.

/// Output token budgets per request kind.
pub(crate) const TWIST_MAX_TOKENS: u32 = 100;
pub(crate) const SUGGESTION_MAX_TOKENS: u32 = 80;
pub(crate) const PROMPT_MAX_TOKENS: u32 = 120;

pub(crate) fn twist(story_text: &str) -> String {
    format!(
        "Based on this collaborative story, add an unexpected but creative twist that keeps \
         the narrative engaging and appropriate for all ages. The twist should be surprising \
         but logical given the story so far. Keep it to 1-2 sentences.\n\n\
         Story so far: \"{story_text}\"\n\n\
         Add a creative twist:"
    )
}

pub(crate) fn suggestion(player_names: &[String]) -> String {
    format!(
        "Given these players in a collaborative story game: {}. Suggest which player should \
         go next and why. Keep it fun and creative. Respond in 1-2 sentences.",
        player_names.join(", ")
    )
}

pub(crate) fn story_prompt(story_text: &str, player_names: &[String]) -> String {
    format!(
        "Create a creative story prompt for a collaborative storytelling game. Players: {}. \
         Current story: \"{story_text}\". Generate an engaging prompt that encourages creative \
         storytelling. Keep it appropriate and inspiring.",
        player_names.join(", ")
    )
}
