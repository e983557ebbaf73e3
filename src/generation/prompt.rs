//! Monologue prompt builder.
//!
//! The prompt is a single instruction block: the persona's voice, its style
//! rules and example lines, the task, the topic, and an explicit `</END>`
//! marker the backend is told to stop on.

use crate::persona::Persona;

/// Token budget for a monologue request.
pub const MONOLOGUE_MAX_TOKENS: u32 = 700;

/// Marker terminating every monologue prompt; also a backend stop sequence.
pub const END_MARKER: &str = "</END>";

const TASK_INSTRUCTION: &str = "Now, reflect in 2–4 paragraphs about the topic below in that voice. \
Do not include headings. Avoid bullet lists. Conclude with a crisp image or turn of phrase.";

/// Compose the full generation prompt for `persona` speaking about `topic`.
///
/// # Example
/// ```rust
/// use persona_stage::config::PersonaConfig;
/// use persona_stage::generation::build_monologue_prompt;
/// use persona_stage::persona::Persona;
///
/// let persona = Persona::from(&PersonaConfig {
///     name: "poet".into(),
///     prompt_persona: "A wistful poet.".into(),
///     style_rules: vec!["Short sentences".into()],
///     ..PersonaConfig::default()
/// });
/// let prompt = build_monologue_prompt(&persona, "old libraries");
/// assert!(prompt.starts_with("You adopt the following voice:"));
/// assert!(prompt.contains("- Short sentences"));
/// assert!(prompt.ends_with("</END>"));
/// ```
pub fn build_monologue_prompt(persona: &Persona, topic: &str) -> String {
    let rules = persona
        .style_rules
        .iter()
        .map(|rule| format!("- {rule}"))
        .collect::<Vec<_>>()
        .join("\n");

    let examples = persona
        .examples
        .iter()
        .map(|example| format!("• {example}"))
        .collect::<Vec<_>>()
        .join("\n");

    let mut prompt = String::with_capacity(1024);
    prompt.push_str("You adopt the following voice:\n");
    prompt.push_str(&persona.voice);
    prompt.push_str("\n\nStyle rules:\n");
    prompt.push_str(&rules);
    prompt.push_str("\n\nExamples of the voice:\n");
    prompt.push_str(&examples);
    prompt.push_str("\n\n");
    prompt.push_str(TASK_INSTRUCTION);
    prompt.push_str(&format!("\n\nTopic: {topic}\n\n{END_MARKER}"));
    prompt
}
