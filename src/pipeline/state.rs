//! Pipeline state machine states.
//!
//! ```text
//! Idle ──start──▶ AwaitingTopic ──topic──▶ AwaitingMonologue ──text──▶ Playing
//!                      │                        │                        │
//!                      └──────error─────────────┴──────────▶ Advancing ◀─┘ finished
//!                                                               │
//!                                  next persona ◀───────────────┤
//!                                                               └──none left──▶ Done
//! ```

/// States of the persona pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineState {
    /// Not started yet.
    #[default]
    Idle,

    /// A topic request is outstanding for the active persona.
    AwaitingTopic,

    /// A monologue request is outstanding for the active persona.
    AwaitingMonologue,

    /// The active persona's chunks are being played.
    Playing,

    /// The active persona's turn is over; the next one is being selected.
    Advancing,

    /// Every persona has had its turn.  Terminal.
    Done,
}

impl PipelineState {
    /// Returns `true` while a generation request is outstanding.
    ///
    /// ```
    /// use persona_stage::pipeline::PipelineState;
    ///
    /// assert!(PipelineState::AwaitingTopic.is_generating());
    /// assert!(PipelineState::AwaitingMonologue.is_generating());
    /// assert!(!PipelineState::Playing.is_generating());
    /// ```
    pub fn is_generating(&self) -> bool {
        matches!(
            self,
            PipelineState::AwaitingTopic | PipelineState::AwaitingMonologue
        )
    }

    /// `true` once the run is over.
    pub fn is_done(&self) -> bool {
        *self == PipelineState::Done
    }

    /// A short human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            PipelineState::Idle => "Idle",
            PipelineState::AwaitingTopic => "Choosing topic",
            PipelineState::AwaitingMonologue => "Generating",
            PipelineState::Playing => "Playing",
            PipelineState::Advancing => "Advancing",
            PipelineState::Done => "Done",
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_idle() {
        assert_eq!(PipelineState::default(), PipelineState::Idle);
    }

    #[test]
    fn only_awaiting_states_are_generating() {
        for state in [
            PipelineState::Idle,
            PipelineState::Playing,
            PipelineState::Advancing,
            PipelineState::Done,
        ] {
            assert!(!state.is_generating(), "{state:?}");
        }
    }

    #[test]
    fn only_done_is_done() {
        assert!(PipelineState::Done.is_done());
        assert!(!PipelineState::Advancing.is_done());
    }

    #[test]
    fn labels() {
        assert_eq!(PipelineState::AwaitingTopic.label(), "Choosing topic");
        assert_eq!(PipelineState::Done.label(), "Done");
    }
}
