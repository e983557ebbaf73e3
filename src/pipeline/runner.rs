//! Persona pipeline — sequences generation and playback across personas.
//!
//! [`PersonaPipeline`] lives on the UI loop.  It never performs I/O itself:
//! every input (`start`, a [`GatewayMessage`], the playback-finished signal)
//! returns the [`Directive`]s the caller must carry out.
//!
//! # Pipeline flow
//!
//! ```text
//! start()
//!   └─▶ shuffle + cap personas, show startup.jpg
//!         └─▶ next persona: background, balloon, Request(Topic)      [AwaitingTopic]
//!
//! Generated(topic)
//!   └─▶ store topic, build prompt, Request(Monologue, 700)          [AwaitingMonologue]
//!
//! Generated(text)
//!   └─▶ store text, show ready.jpg, chunk, Play(chunks)              [Playing]
//!
//! playback finished / Error(_) while generating
//!   └─▶ next persona, or Done when none are left                     [Advancing]
//! ```

use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::Rng;

use crate::chunk::split_into_chunks;
use crate::generation::{
    build_monologue_prompt, GatewayMessage, GenerationRequest, MONOLOGUE_MAX_TOKENS,
};
use crate::persona::{BalloonRect, Persona, PersonaState};

use super::state::PipelineState;

/// Background shown before the first persona, if present.
pub const STARTUP_IMAGE: &str = "startup.jpg";

/// Background shown once a monologue is ready, if present.
pub const READY_IMAGE: &str = "ready.jpg";

/// Topic used when the topic response is blank.
const FALLBACK_TOPIC: &str = "amusement parks";

// ---------------------------------------------------------------------------
// Directive
// ---------------------------------------------------------------------------

/// Side effects requested by the pipeline, executed by the UI loop.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    /// Show text in the status bar.
    Status(String),
    /// Switch the background; `None` means plain black.
    Background(Option<PathBuf>),
    /// Move the speech balloon (design-space rectangle).
    Balloon(BalloonRect),
    /// Send a request to the generation worker.
    Request(GenerationRequest),
    /// Start a playback session with these chunks.
    Play(Vec<String>),
    /// The run is complete.
    Done,
}

// ---------------------------------------------------------------------------
// PersonaPipeline
// ---------------------------------------------------------------------------

/// Drives each selected persona through topic → monologue → playback.
///
/// ```rust
/// use persona_stage::pipeline::{Directive, PersonaPipeline, PipelineState};
///
/// // No personas configured → straight to Done.
/// let mut pipeline = PersonaPipeline::new(Vec::new(), 1, "assets");
/// let directives = pipeline.start();
/// assert_eq!(pipeline.state(), PipelineState::Done);
/// assert_eq!(directives.last(), Some(&Directive::Done));
/// ```
pub struct PersonaPipeline {
    roster: Vec<Persona>,
    num_characters: usize,
    assets_dir: PathBuf,
    lineup: Vec<PersonaState>,
    /// Active persona; `None` before the first one is selected.
    index: Option<usize>,
    state: PipelineState,
}

impl PersonaPipeline {
    /// Create a pipeline over `roster`, performing at most `num_characters`
    /// (minimum 1) of them.
    pub fn new(roster: Vec<Persona>, num_characters: usize, assets_dir: impl Into<PathBuf>) -> Self {
        Self {
            roster,
            num_characters,
            assets_dir: assets_dir.into(),
            lineup: Vec::new(),
            index: None,
            state: PipelineState::Idle,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// The persona currently taking its turn.
    pub fn active(&self) -> Option<&PersonaState> {
        self.index.and_then(|i| self.lineup.get(i))
    }

    /// Personas selected for this run, in performance order.
    pub fn lineup(&self) -> &[PersonaState] {
        &self.lineup
    }

    // -----------------------------------------------------------------------
    // Inputs
    // -----------------------------------------------------------------------

    /// Start the run with a thread-local RNG for the shuffle.
    pub fn start(&mut self) -> Vec<Directive> {
        self.start_with_rng(&mut rand::rng())
    }

    /// Start the run, shuffling the roster with `rng`.
    pub fn start_with_rng<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Vec<Directive> {
        let mut out = vec![
            Directive::Background(self.asset(STARTUP_IMAGE)),
            Directive::Status("Starting…".into()),
        ];

        let mut selection = self.roster.clone();
        selection.shuffle(rng);
        selection.truncate(self.num_characters.max(1));
        log::info!(
            "pipeline: {} of {} personas selected",
            selection.len(),
            self.roster.len()
        );

        self.lineup = selection.into_iter().map(PersonaState::new).collect();
        self.index = None;
        self.advance(&mut out);
        out
    }

    /// Handle a notification from the generation worker.
    pub fn on_gateway(&mut self, message: GatewayMessage) -> Vec<Directive> {
        let mut out = Vec::new();
        match message {
            GatewayMessage::Status(text) => out.push(Directive::Status(text)),
            GatewayMessage::Generated(text) => match self.state {
                PipelineState::AwaitingTopic => self.on_topic(text, &mut out),
                PipelineState::AwaitingMonologue => self.on_monologue(text, &mut out),
                state => log::debug!("pipeline: ignoring generated text in {state:?}"),
            },
            GatewayMessage::Error(msg) => {
                if self.state.is_generating() {
                    log::warn!("pipeline: generation error, skipping persona: {msg}");
                    out.push(Directive::Status(format!("Error: {msg}")));
                    self.state = PipelineState::Advancing;
                    self.advance(&mut out);
                } else {
                    log::debug!("pipeline: ignoring error in {:?}: {msg}", self.state);
                }
            }
        }
        out
    }

    /// Handle the playback engine's `Finished` signal.
    pub fn on_playback_finished(&mut self) -> Vec<Directive> {
        let mut out = Vec::new();
        if self.state != PipelineState::Playing {
            log::debug!("pipeline: ignoring playback finish in {:?}", self.state);
            return out;
        }
        out.push(Directive::Status("Persona finished. Moving on…".into()));
        self.state = PipelineState::Advancing;
        self.advance(&mut out);
        out
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    fn on_topic(&mut self, topic: String, out: &mut Vec<Directive>) {
        let Some(active) = self.index.and_then(|i| self.lineup.get_mut(i)) else {
            return;
        };
        active.topic = match topic.trim() {
            "" => FALLBACK_TOPIC.to_string(),
            t => t.to_string(),
        };
        log::debug!("pipeline: topic = {:?}", active.topic);

        let prompt = build_monologue_prompt(&active.persona, &active.topic);
        out.push(Directive::Status(format!(
            "Topic: {} — generating monologue…",
            active.topic
        )));
        self.state = PipelineState::AwaitingMonologue;
        out.push(Directive::Request(GenerationRequest::Monologue {
            prompt,
            max_tokens: MONOLOGUE_MAX_TOKENS,
        }));
    }

    fn on_monologue(&mut self, text: String, out: &mut Vec<Directive>) {
        let ready = self.asset(READY_IMAGE);
        let Some(active) = self.index.and_then(|i| self.lineup.get_mut(i)) else {
            return;
        };
        active.text = text;

        if ready.is_some() {
            out.push(Directive::Background(ready));
        }

        let chunks = split_into_chunks(&active.text, active.persona.chunk_word_budget());
        out.push(Directive::Status(format!("Displaying {} chunks…", chunks.len())));
        self.state = PipelineState::Playing;
        out.push(Directive::Play(chunks));
    }

    /// Select the next performable persona, or finish the run.
    fn advance(&mut self, out: &mut Vec<Directive>) {
        loop {
            let next = self.index.map_or(0, |i| i + 1);
            self.index = Some(next);

            let Some(active) = self.lineup.get(next) else {
                log::info!("pipeline: all personas complete");
                self.state = PipelineState::Done;
                out.push(Directive::Status("All personas complete. Goodbye.".into()));
                out.push(Directive::Done);
                return;
            };
            let persona = &active.persona;

            if let Err(e) = persona.validate() {
                log::warn!("pipeline: {e}");
                out.push(Directive::Status(format!("Skipping persona: {e}")));
                continue;
            }

            log::info!("pipeline: persona {} ({})", next + 1, persona.label());
            let background = persona
                .background_path(&self.assets_dir)
                .filter(|p| p.exists());
            out.push(Directive::Background(background));
            out.push(Directive::Balloon(persona.balloon));
            out.push(Directive::Status(format!(
                "Persona: {} — choosing topic…",
                persona.label()
            )));
            self.state = PipelineState::AwaitingTopic;
            out.push(Directive::Request(GenerationRequest::Topic));
            return;
        }
    }

    /// `assets_dir/name` if that file exists.
    fn asset(&self, name: &str) -> Option<PathBuf> {
        existing(&self.assets_dir.join(name))
    }
}

fn existing(path: &Path) -> Option<PathBuf> {
    path.exists().then(|| path.to_path_buf())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PersonaConfig;
    use crate::generation::{BackendError, GenerationGateway, GenerationWorker, TextBackend};
    use async_trait::async_trait;
    use rand::rngs::StdRng;
    use std::sync::Arc;
    use tokio::sync::mpsc;
    use rand::SeedableRng;
    use tempfile::tempdir;

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn persona(name: &str) -> Persona {
        Persona::from(&PersonaConfig {
            name: name.into(),
            display_name: name.to_uppercase(),
            image_file_name: format!("{name}.jpg"),
            prompt_persona: format!("The voice of {name}."),
            max_words_per_chunk: 10,
            ..PersonaConfig::default()
        })
    }

    fn roster(names: &[&str]) -> Vec<Persona> {
        names.iter().map(|n| persona(n)).collect()
    }

    struct Panics;

    #[async_trait]
    impl TextBackend for Panics {
        async fn generate(&self, _prompt: &str, _max: u32) -> Result<String, BackendError> {
            panic!("backend exploded");
        }
    }

    struct Blank;

    #[async_trait]
    impl TextBackend for Blank {
        async fn generate(&self, _prompt: &str, _max: u32) -> Result<String, BackendError> {
            Ok("   ".into())
        }
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn generated(text: &str) -> GatewayMessage {
        GatewayMessage::Generated(text.into())
    }

    fn requests(directives: &[Directive]) -> Vec<&GenerationRequest> {
        directives
            .iter()
            .filter_map(|d| match d {
                Directive::Request(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    fn statuses(directives: &[Directive]) -> Vec<&str> {
        directives
            .iter()
            .filter_map(|d| match d {
                Directive::Status(s) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }

    fn monologue(sentences: usize) -> String {
        (0..sentences)
            .map(|i| format!("This is sentence number {i} of the monologue."))
            .collect::<Vec<_>>()
            .join(" ")
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[test]
    fn empty_roster_goes_straight_to_done() {
        let mut pipeline = PersonaPipeline::new(Vec::new(), 3, "assets");
        let out = pipeline.start_with_rng(&mut rng());
        assert_eq!(pipeline.state(), PipelineState::Done);
        assert!(requests(&out).is_empty());
        assert_eq!(out.last(), Some(&Directive::Done));
    }

    #[test]
    fn start_requests_a_topic_for_the_first_persona() {
        let mut pipeline = PersonaPipeline::new(roster(&["poet"]), 1, "no-such-assets");
        let out = pipeline.start_with_rng(&mut rng());

        assert_eq!(pipeline.state(), PipelineState::AwaitingTopic);
        assert_eq!(requests(&out), vec![&GenerationRequest::Topic]);
        assert!(out.contains(&Directive::Background(None)));
        assert!(out.contains(&Directive::Balloon(BalloonRect::default())));
        assert!(statuses(&out).contains(&"Persona: POET — choosing topic…"));
    }

    #[test]
    fn selection_is_capped_with_minimum_of_one() {
        let mut pipeline = PersonaPipeline::new(roster(&["a", "b", "c"]), 2, "assets");
        pipeline.start_with_rng(&mut rng());
        assert_eq!(pipeline.lineup().len(), 2);

        let mut pipeline = PersonaPipeline::new(roster(&["a", "b", "c"]), 0, "assets");
        pipeline.start_with_rng(&mut rng());
        assert_eq!(pipeline.lineup().len(), 1);
    }

    #[test]
    fn selection_is_a_permutation_subset() {
        let mut pipeline = PersonaPipeline::new(roster(&["a", "b", "c", "d"]), 4, "assets");
        pipeline.start_with_rng(&mut rng());
        let mut names: Vec<&str> = pipeline
            .lineup()
            .iter()
            .map(|s| s.persona.name.as_str())
            .collect();
        names.sort_unstable();
        assert_eq!(names, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn topic_response_issues_monologue_request() {
        let mut pipeline = PersonaPipeline::new(roster(&["poet"]), 1, "assets");
        pipeline.start_with_rng(&mut rng());

        let out = pipeline.on_gateway(generated("old libraries"));
        assert_eq!(pipeline.state(), PipelineState::AwaitingMonologue);
        assert_eq!(pipeline.active().unwrap().topic, "old libraries");

        match requests(&out).as_slice() {
            [GenerationRequest::Monologue { prompt, max_tokens }] => {
                assert_eq!(*max_tokens, 700);
                assert!(prompt.contains("The voice of poet."));
                assert!(prompt.contains("Topic: old libraries"));
                assert!(prompt.ends_with("</END>"));
            }
            other => panic!("unexpected requests {other:?}"),
        }
    }

    #[test]
    fn blank_topic_uses_fallback_topic() {
        let mut pipeline = PersonaPipeline::new(roster(&["poet"]), 1, "assets");
        pipeline.start_with_rng(&mut rng());
        pipeline.on_gateway(generated("   "));
        assert_eq!(pipeline.active().unwrap().topic, "amusement parks");
    }

    #[test]
    fn monologue_is_chunked_with_word_floor_and_played() {
        let mut pipeline = PersonaPipeline::new(roster(&["poet"]), 1, "assets");
        pipeline.start_with_rng(&mut rng());
        pipeline.on_gateway(generated("tides"));

        // 20 sentences × 8 words; persona budget 10 is raised to 40.
        let text = monologue(20);
        let out = pipeline.on_gateway(generated(&text));
        assert_eq!(pipeline.state(), PipelineState::Playing);
        assert_eq!(pipeline.active().unwrap().text, text);

        let chunks = out
            .iter()
            .find_map(|d| match d {
                Directive::Play(c) => Some(c.clone()),
                _ => None,
            })
            .expect("play directive");
        assert_eq!(chunks, split_into_chunks(&text, 40));
        assert_eq!(chunks.len(), 4);
        assert!(statuses(&out).contains(&"Displaying 4 chunks…"));
    }

    #[test]
    fn playback_finished_advances_to_next_persona_then_done() {
        let mut pipeline = PersonaPipeline::new(roster(&["a", "b"]), 2, "assets");
        pipeline.start_with_rng(&mut rng());

        for turn in 0..2 {
            pipeline.on_gateway(generated("topic"));
            pipeline.on_gateway(generated("Some text."));
            let out = pipeline.on_playback_finished();
            if turn == 0 {
                assert_eq!(pipeline.state(), PipelineState::AwaitingTopic);
                assert_eq!(requests(&out), vec![&GenerationRequest::Topic]);
            } else {
                assert_eq!(pipeline.state(), PipelineState::Done);
                assert_eq!(out.last(), Some(&Directive::Done));
            }
        }
    }

    #[test]
    fn error_on_every_call_still_visits_every_persona_once() {
        let names = ["a", "b", "c", "d"];
        let mut pipeline = PersonaPipeline::new(roster(&names), names.len(), "assets");
        let mut out = pipeline.start_with_rng(&mut rng());
        let mut topic_requests = requests(&out).len();
        let mut visited = vec![pipeline.active().unwrap().persona.name.clone()];

        while !pipeline.state().is_done() {
            out = pipeline.on_gateway(GatewayMessage::Error("boom".into()));
            topic_requests += requests(&out).len();
            if let Some(active) = pipeline.active() {
                visited.push(active.persona.name.clone());
            }
        }

        assert_eq!(topic_requests, names.len());
        visited.sort_unstable();
        assert_eq!(visited, names);
    }

    #[test]
    fn error_during_monologue_skips_persona() {
        let mut pipeline = PersonaPipeline::new(roster(&["a", "b"]), 2, "assets");
        pipeline.start_with_rng(&mut rng());
        pipeline.on_gateway(generated("topic"));

        let out = pipeline.on_gateway(GatewayMessage::Error("worker died".into()));
        assert_eq!(statuses(&out)[0], "Error: worker died");
        assert_eq!(pipeline.state(), PipelineState::AwaitingTopic);
        assert_eq!(pipeline.active().unwrap().topic, "");
    }

    #[test]
    fn status_messages_pass_through_without_transition() {
        let mut pipeline = PersonaPipeline::new(roster(&["a"]), 1, "assets");
        pipeline.start_with_rng(&mut rng());
        let out = pipeline.on_gateway(GatewayMessage::Status("Choosing a topic…".into()));
        assert_eq!(out, vec![Directive::Status("Choosing a topic…".into())]);
        assert_eq!(pipeline.state(), PipelineState::AwaitingTopic);
    }

    #[test]
    fn unexpected_messages_are_ignored() {
        let mut pipeline = PersonaPipeline::new(roster(&["a"]), 1, "assets");
        assert!(pipeline.on_gateway(generated("early")).is_empty());
        assert!(pipeline.on_playback_finished().is_empty());
        assert_eq!(pipeline.state(), PipelineState::Idle);

        pipeline.start_with_rng(&mut rng());
        pipeline.on_gateway(generated("topic"));
        pipeline.on_gateway(generated("Text."));
        // Playing: stray generation results and errors change nothing.
        assert!(pipeline.on_gateway(generated("late")).is_empty());
        assert!(pipeline
            .on_gateway(GatewayMessage::Error("late".into()))
            .is_empty());
        assert_eq!(pipeline.state(), PipelineState::Playing);
    }

    #[test]
    fn malformed_persona_is_skipped_with_status() {
        let mut broken = persona("broken");
        broken.balloon.height = 0.0;
        let mut pipeline = PersonaPipeline::new(vec![broken], 1, "assets");

        let out = pipeline.start_with_rng(&mut rng());
        assert!(statuses(&out)
            .iter()
            .any(|s| s.starts_with("Skipping persona:")));
        assert!(requests(&out).is_empty());
        assert_eq!(pipeline.state(), PipelineState::Done);
    }

    #[test]
    fn existing_assets_are_used_as_backgrounds() {
        let dir = tempdir().expect("temp dir");
        for file in [STARTUP_IMAGE, READY_IMAGE, "poet.jpg"] {
            std::fs::write(dir.path().join(file), b"jpg").expect("write");
        }

        let mut pipeline = PersonaPipeline::new(roster(&["poet"]), 1, dir.path());
        let out = pipeline.start_with_rng(&mut rng());
        assert_eq!(
            out[0],
            Directive::Background(Some(dir.path().join(STARTUP_IMAGE)))
        );
        assert!(out.contains(&Directive::Background(Some(dir.path().join("poet.jpg")))));

        pipeline.on_gateway(generated("topic"));
        let out = pipeline.on_gateway(generated("Text."));
        assert!(out.contains(&Directive::Background(Some(dir.path().join(READY_IMAGE)))));
    }

    /// Drive the pipeline against a real worker until `Done`, finishing each
    /// playback session immediately.
    async fn run_to_done(gateway: GenerationGateway, personas: Vec<Persona>) -> Vec<Directive> {
        let (request_tx, request_rx) = mpsc::channel(4);
        let (message_tx, mut message_rx) = mpsc::channel(16);
        let worker = tokio::spawn(GenerationWorker::new(gateway).run(request_rx, message_tx));

        let count = personas.len();
        let mut pipeline = PersonaPipeline::new(personas, count, "assets");
        let mut pending = pipeline.start_with_rng(&mut rng());
        let mut seen = Vec::new();

        loop {
            for directive in std::mem::take(&mut pending) {
                match &directive {
                    Directive::Request(r) => request_tx.send(r.clone()).await.unwrap(),
                    Directive::Play(_) => pending.extend(pipeline.on_playback_finished()),
                    _ => {}
                }
                seen.push(directive);
            }
            if !pending.is_empty() {
                continue;
            }
            if pipeline.state().is_done() {
                break;
            }
            let msg = message_rx.recv().await.expect("worker alive");
            pending = pipeline.on_gateway(msg);
        }

        drop(request_tx);
        worker.await.unwrap();
        seen
    }

    #[tokio::test]
    async fn full_run_with_unavailable_model_plays_every_persona() {
        let seen = run_to_done(GenerationGateway::new(None), roster(&["a", "b"])).await;
        let plays = seen
            .iter()
            .filter(|d| matches!(d, Directive::Play(c) if !c.is_empty()))
            .count();
        assert_eq!(plays, 2);
        assert_eq!(seen.last(), Some(&Directive::Done));
    }

    #[tokio::test]
    async fn full_run_with_blank_replies_plays_empty_sessions() {
        let gateway = GenerationGateway::new(Some(Arc::new(Blank)));
        let seen = run_to_done(gateway, roster(&["a", "b"])).await;
        let empty_plays = seen
            .iter()
            .filter(|d| matches!(d, Directive::Play(c) if c.is_empty()))
            .count();
        assert_eq!(empty_plays, 2);
        assert!(statuses(&seen).contains(&"Displaying 0 chunks…"));
        assert_eq!(seen.last(), Some(&Directive::Done));
    }

    #[tokio::test]
    async fn full_run_with_panicking_backend_still_terminates() {
        let gateway = GenerationGateway::new(Some(Arc::new(Panics)));
        let seen = run_to_done(gateway, roster(&["a", "b", "c"])).await;
        assert!(!seen.iter().any(|d| matches!(d, Directive::Play(_))));
        let topics = requests(&seen).len();
        assert_eq!(topics, 3);
        assert_eq!(seen.last(), Some(&Directive::Done));
    }

    #[test]
    fn missing_ready_image_leaves_background_alone() {
        let mut pipeline = PersonaPipeline::new(roster(&["poet"]), 1, "no-such-assets");
        pipeline.start_with_rng(&mut rng());
        pipeline.on_gateway(generated("topic"));
        let out = pipeline.on_gateway(generated("Text."));
        assert!(!out.iter().any(|d| matches!(d, Directive::Background(_))));
    }
}
