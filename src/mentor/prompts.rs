//! Persona prompt, per-phase response templates, and extraction prompts.

use super::session::{Lifestyle, LogEntry, Session};
use super::state::Phase;

/// First assistant turn of every conversation. Sent without calling the model.
pub const GREETING: &str = "Hi! I'm HobbyMentor, and I'd love to help you discover some amazing new \
hobbies. Let's start by getting to know you - what kinds of things do you enjoy doing in your free time?";

/// Returned when a reply cannot be generated.
pub const FALLBACK_REPLY: &str = "I'm having trouble processing that. Could you tell me a bit \
about what you like to do for fun?";

/// Persona shared by every response turn.
pub const PERSONA: &str = "\
You are HobbyMentor, a warm AI hobby coach helping someone discover hobbies that fit their \
personality, interests, dislikes, and lifestyle.

Guidelines:
- Keep it short and human: a few plain sentences, no lists.
- Listen more than you talk. Acknowledge what the user shares before asking anything.
- Ask ONE question at a time.
- Never dump several hobby ideas at once; ideas come one at a time, each explained.
- If the user seems unsure, encourage them gently with a benefit or a fun fact.";

fn list_or_unknown(items: &[String]) -> String {
    if items.is_empty() {
        "unknown".to_string()
    } else {
        items.join(", ")
    }
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none yet".to_string()
    } else {
        items.join(", ")
    }
}

/// Phase instructions for a response turn. `None` for the fixed greeting.
pub fn phase_instructions(phase: Phase, session: &Session) -> Option<String> {
    let interests = list_or_unknown(&session.interests);
    let dislikes = list_or_unknown(&session.dislikes);
    let lifestyle = session.lifestyle.describe();
    let suggested = list_or_none(&session.suggested_hobbies);

    let text = match phase {
        Phase::Start => return None,
        Phase::Interests => format!(
            "CURRENT PHASE: Interests
What the user enjoys so far: {interests}

Show genuine curiosity about one of their interests with a short follow-up, then ask \
what they dislike or want to avoid in a hobby."
        ),
        Phase::Dislikes => format!(
            "CURRENT PHASE: Dislikes
User's interests: {interests}
User's dislikes: {dislikes}

Acknowledge what drains them. Then ask about their lifestyle: how much free time they \
have, their usual energy level, and whether they prefer social or solo activities."
        ),
        Phase::Lifestyle => format!(
            "CURRENT PHASE: Lifestyle
User's interests: {interests}
User's dislikes: {dislikes}
User's lifestyle: {lifestyle}

Reflect their lifestyle back in a sentence and tell them you're ready to start suggesting \
hobbies that fit them. Do not suggest a hobby yet."
        ),
        Phase::Suggesting => format!(
            "CURRENT PHASE: Suggesting
User's interests: {interests}
User's dislikes: {dislikes}
User's lifestyle: {lifestyle}
Previously suggested: {suggested}

Suggest exactly ONE new hobby. It must NOT be any hobby from the 'Previously suggested' \
list. Explain why it fits this person specifically, tying it to their interests, dislikes, \
and lifestyle. End with a question asking how they feel about it or whether they'd like \
another idea."
        ),
        Phase::Terminated => format!(
            "CURRENT PHASE: Wrap-up
User's interests: {interests}
Hobbies you suggested: {suggested}

You have finished making suggestions. Respond to the user's latest message kindly, \
do not introduce a new hobby, and offer a brief recap of the ideas above if it helps. \
Wish them well with whatever they try."
        ),
    };

    Some(text)
}

/// Render recent log entries as a transcript.
pub fn render_history(entries: &[LogEntry]) -> String {
    entries
        .iter()
        .map(|e| format!("{}: {}", e.role, e.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// User-side prompt for a response turn.
pub fn response_prompt(instructions: &str, history: &[LogEntry], user_message: &str) -> String {
    let history = if history.is_empty() {
        "(no messages yet)".to_string()
    } else {
        render_history(history)
    };

    format!(
        "{instructions}\n\n\
         Conversation so far:\n{history}\n\n\
         User's latest message: \"{user_message}\"\n\n\
         Reply with your next message to the user only."
    )
}

/// Extraction prompt for the phase, or `None` when the phase collects nothing.
pub fn extraction_prompt(phase: Phase, user_message: &str) -> Option<String> {
    let schema = match phase {
        Phase::Interests => {
            r#"Extract the things the user enjoys or finds relaxing.
Return format: {"interests": ["interest1", "interest2"]}
If no interests are mentioned, return {"interests": []}"#
        }
        Phase::Dislikes => {
            r#"Extract the things the user dislikes, finds draining, or wants to avoid.
Return format: {"dislikes": ["dislike1", "dislike2"]}
If no dislikes are mentioned, return {"dislikes": []}"#
        }
        Phase::Lifestyle => {
            r#"Extract the user's lifestyle. Omit any key that is not mentioned.
Return format: {"lifestyle": {"energy": "high|medium|low", "time": "lots|some|little", "social": "social|solo|both"}}
If no lifestyle information is mentioned, return {"lifestyle": {}}"#
        }
        Phase::Start | Phase::Suggesting | Phase::Terminated => return None,
    };

    Some(format!(
        "User message: \"{user_message}\"\n\n\
         {schema}\n\n\
         Respond with ONLY valid JSON, no explanation or markdown formatting."
    ))
}

/// System message for extraction calls.
pub const EXTRACTION_SYSTEM: &str =
    "You are a data extraction assistant. Output only valid JSON.";

/// Short profile summary used in logs.
pub fn profile_summary(interests: &[String], dislikes: &[String], lifestyle: &Lifestyle) -> String {
    format!(
        "interests=[{}] dislikes=[{}] lifestyle=[{}]",
        interests.join(", "),
        dislikes.join(", "),
        lifestyle.describe()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profiled_session() -> Session {
        let mut s = Session::new("u1");
        s.interests = vec!["music".into(), "hiking".into()];
        s.dislikes = vec!["crowds".into()];
        s.lifestyle = Lifestyle {
            energy: Some("low".into()),
            time: Some("some".into()),
            social: None,
        };
        s.suggested_hobbies = vec!["bird watching".into()];
        s
    }

    #[test]
    fn start_has_no_template() {
        assert!(phase_instructions(Phase::Start, &Session::new("u1")).is_none());
    }

    #[test]
    fn suggesting_forbids_previous_and_asks_for_one() {
        let text = phase_instructions(Phase::Suggesting, &profiled_session()).unwrap();
        assert!(text.contains("Previously suggested: bird watching"));
        assert!(text.contains("exactly ONE"));
        assert!(text.contains("music, hiking"));
        assert!(text.contains("crowds"));
        assert!(text.contains("energy: low, time: some"));
    }

    #[test]
    fn suggesting_with_no_history_says_none_yet() {
        let mut s = profiled_session();
        s.suggested_hobbies.clear();
        let text = phase_instructions(Phase::Suggesting, &s).unwrap();
        assert!(text.contains("Previously suggested: none yet"));
    }

    #[test]
    fn collection_templates_name_their_phase() {
        let s = Session::new("u1");
        for (phase, marker) in [
            (Phase::Interests, "Interests"),
            (Phase::Dislikes, "Dislikes"),
            (Phase::Lifestyle, "Lifestyle"),
            (Phase::Terminated, "Wrap-up"),
        ] {
            let text = phase_instructions(phase, &s).unwrap();
            assert!(text.contains(marker), "{phase} template missing {marker}");
            assert!(text.contains("unknown") || phase == Phase::Terminated);
        }
    }

    #[test]
    fn extraction_prompt_per_phase() {
        let p = extraction_prompt(Phase::Interests, "I love hiking").unwrap();
        assert!(p.contains("\"interests\""));
        assert!(p.contains("I love hiking"));
        assert!(extraction_prompt(Phase::Dislikes, "x").unwrap().contains("\"dislikes\""));
        assert!(extraction_prompt(Phase::Lifestyle, "x").unwrap().contains("\"social\""));
        assert!(extraction_prompt(Phase::Start, "x").is_none());
        assert!(extraction_prompt(Phase::Suggesting, "x").is_none());
        assert!(extraction_prompt(Phase::Terminated, "x").is_none());
    }

    #[test]
    fn response_prompt_includes_history_and_message() {
        let mut s = Session::new("u1");
        s.push_assistant("What do you enjoy?");
        s.push_user("Music");
        let p = response_prompt("INSTR", s.recent_messages(6), "Music");
        assert!(p.starts_with("INSTR"));
        assert!(p.contains("assistant: What do you enjoy?\nuser: Music"));
        assert!(p.contains("User's latest message: \"Music\""));
    }

    #[test]
    fn response_prompt_without_history() {
        let p = response_prompt("INSTR", &[], "");
        assert!(p.contains("(no messages yet)"));
    }
}
