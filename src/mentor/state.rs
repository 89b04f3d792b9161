//! Conversation phase state machine and the phase router.

use serde::{Deserialize, Serialize};

/// Default number of suggestion turns before the conversation wraps up.
pub const DEFAULT_SUGGESTION_CAP: u32 = 3;

/// The phases of a mentoring conversation.
///
/// Progresses linearly: Start → Interests → Dislikes → Lifestyle →
/// Suggesting → Terminated. `Suggesting` loops until the suggestion cap is
/// reached; `Terminated` is absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[serde(alias = "greeting")]
    Start,
    Interests,
    Dislikes,
    Lifestyle,
    Suggesting,
    Terminated,
}

impl Phase {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: Phase) -> bool {
        use Phase::*;
        matches!(
            (self, target),
            (Start, Interests)
                | (Interests, Dislikes)
                | (Dislikes, Lifestyle)
                | (Lifestyle, Suggesting)
                | (Suggesting, Suggesting)
                | (Suggesting, Terminated)
                | (Terminated, Terminated)
        )
    }

    /// Whether the user's message in this phase is mined for profile data.
    pub fn collects_profile(&self) -> bool {
        matches!(self, Self::Interests | Self::Dislikes | Self::Lifestyle)
    }
}

impl Default for Phase {
    fn default() -> Self {
        Self::Start
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Start => "start",
            Self::Interests => "interests",
            Self::Dislikes => "dislikes",
            Self::Lifestyle => "lifestyle",
            Self::Suggesting => "suggesting",
            Self::Terminated => "terminated",
        };
        write!(f, "{s}")
    }
}

/// Compute the phase that follows a completed turn.
///
/// `suggestion_count` is the number of suggestion turns completed so far,
/// including the current one. Collection phases advance after a single
/// exchange regardless of what extraction produced.
pub fn route(phase: Phase, suggestion_count: u32, cap: u32) -> Phase {
    use Phase::*;
    match phase {
        Start => Interests,
        Interests => Dislikes,
        Dislikes => Lifestyle,
        Lifestyle => Suggesting,
        Suggesting if suggestion_count >= cap => Terminated,
        Suggesting => Suggesting,
        Terminated => Terminated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_transitions() {
        use Phase::*;
        let transitions = [
            (Start, Interests),
            (Interests, Dislikes),
            (Dislikes, Lifestyle),
            (Lifestyle, Suggesting),
            (Suggesting, Suggesting),
            (Suggesting, Terminated),
            (Terminated, Terminated),
        ];
        for (from, to) in transitions {
            assert!(from.can_transition_to(to), "{from} should transition to {to}");
        }
    }

    #[test]
    fn invalid_transitions() {
        use Phase::*;
        // Skip phases
        assert!(!Start.can_transition_to(Dislikes));
        assert!(!Interests.can_transition_to(Suggesting));
        // Go backward
        assert!(!Dislikes.can_transition_to(Interests));
        assert!(!Terminated.can_transition_to(Suggesting));
        // Collection phases never loop
        assert!(!Interests.can_transition_to(Interests));
    }

    #[test]
    fn route_walks_collection_phases_unconditionally() {
        use Phase::*;
        let mut phase = Start;
        for expected in [Interests, Dislikes, Lifestyle, Suggesting] {
            phase = route(phase, 0, DEFAULT_SUGGESTION_CAP);
            assert_eq!(phase, expected);
        }
    }

    #[test]
    fn route_suggesting_loops_until_cap() {
        use Phase::*;
        assert_eq!(route(Suggesting, 1, 3), Suggesting);
        assert_eq!(route(Suggesting, 2, 3), Suggesting);
        assert_eq!(route(Suggesting, 3, 3), Terminated);
        assert_eq!(route(Suggesting, 7, 3), Terminated);
    }

    #[test]
    fn route_terminated_is_absorbing() {
        assert_eq!(route(Phase::Terminated, 3, 3), Phase::Terminated);
        assert_eq!(route(Phase::Terminated, 0, 3), Phase::Terminated);
    }

    #[test]
    fn route_never_regresses() {
        use Phase::*;
        for phase in [Start, Interests, Dislikes, Lifestyle, Suggesting, Terminated] {
            for count in 0..5 {
                let next = route(phase, count, DEFAULT_SUGGESTION_CAP);
                assert!(next >= phase, "{phase} routed backwards to {next}");
                assert!(phase.can_transition_to(next));
            }
        }
    }

    #[test]
    fn display_matches_serde() {
        use Phase::*;
        for phase in [Start, Interests, Dislikes, Lifestyle, Suggesting, Terminated] {
            let display = format!("{phase}");
            let json = serde_json::to_string(&phase).unwrap();
            assert_eq!(format!("\"{display}\""), json, "mismatch for {phase:?}");
        }
    }

    #[test]
    fn greeting_alias_deserializes_to_start() {
        let phase: Phase = serde_json::from_str("\"greeting\"").unwrap();
        assert_eq!(phase, Phase::Start);
    }

    #[test]
    fn collects_profile_only_in_collection_phases() {
        use Phase::*;
        assert!(Interests.collects_profile());
        assert!(Dislikes.collects_profile());
        assert!(Lifestyle.collects_profile());
        assert!(!Start.collects_profile());
        assert!(!Suggesting.collects_profile());
        assert!(!Terminated.collects_profile());
    }
}
