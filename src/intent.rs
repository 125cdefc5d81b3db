//! Keyword intent classification.
//!
//! Each intent owns a keyword set; the intent whose keywords occur most often
//! (as substrings of the lower-cased utterance) wins. Ties go to the intent
//! declared first in [`KEYWORD_TABLE`], so `skills` beats `ai`.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    About,
    Skills,
    Projects,
    Experience,
    Contact,
    Ai,
    Navigation,
    Default,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::About => "about",
            Intent::Skills => "skills",
            Intent::Projects => "projects",
            Intent::Experience => "experience",
            Intent::Contact => "contact",
            Intent::Ai => "ai",
            Intent::Navigation => "navigation",
            Intent::Default => "default",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Declaration order is the tie-break order.
pub const KEYWORD_TABLE: &[(Intent, &[&str])] = &[
    (
        Intent::About,
        &["about jane", "about her", "about yourself", "who is", "who are", "bio", "background", "introduc"],
    ),
    (
        Intent::Skills,
        &["skill", "technical", "tools", "tech stack", "expertise", "capabilit", "good at", "proficien"],
    ),
    (
        Intent::Projects,
        &["project", "portfolio", "built", "case stud", "protogen", "working on"],
    ),
    (
        Intent::Experience,
        &["experience", "career", "worked", "job", "history", "previous role", "resume"],
    ),
    (
        Intent::Contact,
        &["contact", "hire", "email", "reach", "get in touch", "collaborat", "availab"],
    ),
    (
        Intent::Ai,
        &["ai", "artificial intelligence", "llm", "machine learning", "gpt", "prompt", "chatbot"],
    ),
    (
        Intent::Navigation,
        &["navigate", "show me", "take me", "go to", "section", "page", "where can i"],
    ),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationResult {
    pub intent: Intent,
    pub matched_keywords: BTreeSet<&'static str>,
}

impl ClassificationResult {
    pub fn default_intent() -> Self {
        Self {
            intent: Intent::Default,
            matched_keywords: BTreeSet::new(),
        }
    }
}

pub fn classify(utterance: &str) -> ClassificationResult {
    let lowered = utterance.to_lowercase();
    let mut best = ClassificationResult::default_intent();

    for (intent, keywords) in KEYWORD_TABLE {
        let matched: BTreeSet<&'static str> = keywords
            .iter()
            .copied()
            .filter(|k| lowered.contains(k))
            .collect();
        // strictly greater keeps the earlier declaration on ties
        if matched.len() > best.matched_keywords.len() {
            best = ClassificationResult {
                intent: *intent,
                matched_keywords: matched,
            };
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_utterance_is_default() {
        let result = classify("");
        assert_eq!(result.intent, Intent::Default);
        assert!(result.matched_keywords.is_empty());
    }

    #[test]
    fn test_unrelated_utterance_is_default() {
        assert_eq!(classify("lorem ipsum dolor").intent, Intent::Default);
    }

    #[test]
    fn test_skills_beats_ai_on_tie() {
        let result = classify("tell me about your AI skills");
        assert_eq!(result.intent, Intent::Skills);
        assert_eq!(result.matched_keywords, BTreeSet::from(["skill"]));

        // both intents matched exactly one keyword
        let ai_hits = KEYWORD_TABLE
            .iter()
            .find(|(i, _)| *i == Intent::Ai)
            .map(|(_, kws)| kws.iter().filter(|k| "tell me about your ai skills".contains(*k)).count());
        assert_eq!(ai_hits, Some(1));
    }

    #[test]
    fn test_highest_count_wins_over_declaration_order() {
        let result = classify("Which AI project has she built?");
        assert_eq!(result.intent, Intent::Projects);
        assert_eq!(result.matched_keywords, BTreeSet::from(["built", "project"]));
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(classify("HOW DO I CONTACT HER").intent, Intent::Contact);
    }

    #[test]
    fn test_each_intent_reachable() {
        assert_eq!(classify("who is Jane?").intent, Intent::About);
        assert_eq!(classify("what was her career path").intent, Intent::Experience);
        assert_eq!(classify("does she use LLM tooling like GPT").intent, Intent::Ai);
        assert_eq!(classify("navigate to the contact section").intent, Intent::Navigation);
    }

    #[test]
    fn test_table_order_matches_enum() {
        let order: Vec<Intent> = KEYWORD_TABLE.iter().map(|(i, _)| *i).collect();
        assert_eq!(
            order,
            vec![
                Intent::About,
                Intent::Skills,
                Intent::Projects,
                Intent::Experience,
                Intent::Contact,
                Intent::Ai,
                Intent::Navigation
            ]
        );
    }
}
