//! Navigation requests: jumping to a section, previewing an item, searching
//! the knowledge base and suggesting follow-up questions.

use crate::models::knowledge::KnowledgeBase;
use log::debug;
use serde::{ Serialize, Deserialize };

const DEEP_LINK_PHRASES: &[&str] = &["show me", "take me", "go to", "navigate", "jump to"];
const PREVIEW_PHRASES: &[&str] = &["preview", "quick look", "sneak peek"];
const SEARCH_PHRASES: &[&str] = &["find", "search", "look for"];
const SUGGEST_PHRASES: &[&str] = &["suggest", "recommend", "what should"];

const SEARCH_STOP_WORDS: &[&str] = &["find", "search", "for", "look"];
const MAX_SEARCH_RESULTS: usize = 5;
const NAME_WEIGHT: u32 = 3;
const DESCRIPTION_WEIGHT: u32 = 2;
const TAG_WEIGHT: u32 = 1;
const SHORT_TERM_LEN: usize = 2;

const PROJECT_SUGGESTIONS: &[&str] = &[
    "Show me the projects",
    "Find AI projects",
    "Preview the latest project",
];
const SKILL_SUGGESTIONS: &[&str] = &[
    "Take me to the skills section",
    "Find prototyping skills",
    "What are the AI skills?",
];
const CONTACT_SUGGESTIONS: &[&str] = &[
    "Take me to the contact section",
    "How can we collaborate?",
    "Is she available for hire?",
];
const DEFAULT_SUGGESTIONS: &[&str] = &[
    "Show me the projects",
    "What are the key skills?",
    "Tell me about her background",
    "How can I get in touch?",
];

pub const HELP_TEXT: &str =
    "I can help you find your way around this portfolio. Try asking:\n\
- \"Show me projects\" or \"Take me to the contact section\"\n\
- \"Preview Protogen 101\"\n\
- \"Find AI projects\" or \"Search for JavaScript\"\n\
- \"Suggest something to ask\"";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationKind {
    DeepLink,
    Preview,
    Search,
    Suggest,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationTarget {
    Projects,
    Skills,
    About,
    Contact,
}

impl NavigationTarget {
    pub fn section_id(&self) -> &'static str {
        match self {
            NavigationTarget::Projects => "projects",
            NavigationTarget::Skills => "skills",
            NavigationTarget::About => "about",
            NavigationTarget::Contact => "contact",
        }
    }

    fn keywords(&self) -> &'static [&'static str] {
        match self {
            NavigationTarget::Projects => &["project", "work", "portfolio"],
            NavigationTarget::Skills => &["skill", "expertise"],
            NavigationTarget::About => &["about", "bio", "who"],
            NavigationTarget::Contact => &["contact", "hire", "email", "reach"],
        }
    }
}

/// Checked in this order; `about` last since it is the most generic word.
const TARGET_ORDER: [NavigationTarget; 4] = [
    NavigationTarget::Projects,
    NavigationTarget::Skills,
    NavigationTarget::Contact,
    NavigationTarget::About,
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewItem {
    pub id: String,
    pub title: String,
    pub summary: String,
}

/// Structured payload for the UI to show next to a navigation answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preview {
    pub target: NavigationTarget,
    pub anchor: String,
    pub title: String,
    pub items: Vec<PreviewItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    Project,
    Skill,
    Experience,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub kind: SearchKind,
    pub id: String,
    pub title: String,
    pub score: u32,
    /// Position in the knowledge base walk (projects, skills, experience).
    pub order: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavigationOutcome {
    pub kind: NavigationKind,
    pub text: String,
    pub preview: Option<Preview>,
    pub results: Vec<SearchHit>,
    pub suggestions: Vec<String>,
}

impl NavigationOutcome {
    fn text_only(kind: NavigationKind, text: String) -> Self {
        Self { kind, text, preview: None, results: Vec::new(), suggestions: Vec::new() }
    }
}

fn contains_any(haystack: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| haystack.contains(p))
}

/// True when the utterance asks to be taken somewhere, regardless of intent.
pub fn is_navigation_request(utterance: &str) -> bool {
    let lowered = utterance.to_lowercase();
    contains_any(&lowered, DEEP_LINK_PHRASES) ||
        contains_any(&lowered, PREVIEW_PHRASES) ||
        contains_any(&lowered, SEARCH_PHRASES) ||
        contains_any(&lowered, SUGGEST_PHRASES)
}

pub fn navigation_kind(utterance: &str) -> NavigationKind {
    let lowered = utterance.to_lowercase();
    if contains_any(&lowered, DEEP_LINK_PHRASES) {
        NavigationKind::DeepLink
    } else if contains_any(&lowered, PREVIEW_PHRASES) {
        NavigationKind::Preview
    } else if contains_any(&lowered, SEARCH_PHRASES) {
        NavigationKind::Search
    } else if contains_any(&lowered, SUGGEST_PHRASES) {
        NavigationKind::Suggest
    } else {
        NavigationKind::Unknown
    }
}

pub fn resolve_navigation(utterance: &str, kb: &KnowledgeBase) -> NavigationOutcome {
    let kind = navigation_kind(utterance);
    debug!("Navigation request classified as {:?}", kind);
    match kind {
        NavigationKind::DeepLink => deep_link(utterance, kb),
        NavigationKind::Preview => preview(utterance, kb),
        NavigationKind::Search => search(utterance, kb),
        NavigationKind::Suggest => suggest(utterance),
        NavigationKind::Unknown => NavigationOutcome::text_only(kind, HELP_TEXT.to_string()),
    }
}

fn words(lowered: &str) -> Vec<&str> {
    lowered
        .split(|c: char| !c.is_alphanumeric() && c != '-')
        .filter(|w| !w.is_empty())
        .collect()
}

/// Multi-word tags match as substrings, single words must match a whole word.
fn tag_matches(tag: &str, lowered: &str, words: &[&str]) -> bool {
    let tag = tag.to_lowercase();
    if tag.contains(' ') {
        lowered.contains(&tag)
    } else {
        words.iter().any(|w| *w == tag)
    }
}

fn resolve_preview(utterance: &str, kb: &KnowledgeBase) -> Option<Preview> {
    let lowered = utterance.to_lowercase();
    let words = words(&lowered);

    let scoped_projects: Vec<PreviewItem> = kb.projects
        .iter()
        .filter(|p| {
            lowered.contains(&p.id.to_lowercase()) ||
                lowered.contains(&p.name.to_lowercase()) ||
                p.tags.iter().any(|t| tag_matches(t, &lowered, &words))
        })
        .map(|p| PreviewItem {
            id: p.id.clone(),
            title: p.name.clone(),
            summary: format!("{} ({})", p.description, p.status.label()),
        })
        .collect();

    let scoped_category = kb.skill_categories
        .iter()
        .find(|c| words.contains(&c.id.to_lowercase().as_str()) || lowered.contains(&c.name.to_lowercase()));

    let target = TARGET_ORDER
        .iter()
        .copied()
        .find(|t| contains_any(&lowered, t.keywords()))
        .or_else(|| {
            if !scoped_projects.is_empty() {
                Some(NavigationTarget::Projects)
            } else if scoped_category.is_some() {
                Some(NavigationTarget::Skills)
            } else {
                None
            }
        })?;

    let items = match target {
        NavigationTarget::Projects => {
            if scoped_projects.is_empty() {
                kb.projects
                    .iter()
                    .map(|p| PreviewItem {
                        id: p.id.clone(),
                        title: p.name.clone(),
                        summary: format!("{} ({})", p.description, p.status.label()),
                    })
                    .collect()
            } else {
                scoped_projects
            }
        }
        NavigationTarget::Skills => {
            kb.skill_categories
                .iter()
                .filter(|c| scoped_category.map_or(true, |s| s.id == c.id))
                .map(|c| PreviewItem {
                    id: c.id.clone(),
                    title: c.name.clone(),
                    summary: c.skills.iter().take(4).cloned().collect::<Vec<_>>().join(", "),
                })
                .collect()
        }
        NavigationTarget::About => {
            vec![PreviewItem {
                id: "about".to_string(),
                title: format!("{}, {}", kb.personal.name, kb.personal.title),
                summary: kb.personal.bio.clone(),
            }]
        }
        NavigationTarget::Contact => {
            vec![PreviewItem {
                id: "contact".to_string(),
                title: kb.personal.email.clone(),
                summary: kb.personal.availability.clone(),
            }]
        }
    };

    let (anchor, title) = match kb.section(target.section_id()) {
        Some(section) => (section.anchor.clone(), section.title.clone()),
        None => (format!("#{}", target.section_id()), target.section_id().to_string()),
    };

    Some(Preview { target, anchor, title, items })
}

fn section_not_found(kind: NavigationKind, kb: &KnowledgeBase) -> NavigationOutcome {
    let sections = kb.sections.iter().map(|s| s.title.as_str()).collect::<Vec<_>>().join(", ");
    NavigationOutcome::text_only(
        kind,
        format!("I couldn't find that part of the portfolio. Try one of these sections: {}.", sections)
    )
}

fn deep_link(utterance: &str, kb: &KnowledgeBase) -> NavigationOutcome {
    let Some(preview) = resolve_preview(utterance, kb) else {
        return section_not_found(NavigationKind::DeepLink, kb);
    };

    let titles = preview.items.iter().map(|i| i.title.as_str()).collect::<Vec<_>>().join(", ");
    let name = &kb.personal.name;
    let text = match preview.target {
        NavigationTarget::Projects => format!("Here are {}'s projects: {}.", name, titles),
        NavigationTarget::Skills => format!("Here are {}'s skills by area: {}.", name, titles),
        NavigationTarget::About => format!("Here's a bit about {}: {}", name, kb.personal.bio),
        NavigationTarget::Contact =>
            format!("{} Reach out at {}.", kb.personal.availability, kb.personal.email),
    };

    NavigationOutcome {
        kind: NavigationKind::DeepLink,
        text,
        preview: Some(preview),
        results: Vec::new(),
        suggestions: Vec::new(),
    }
}

fn preview(utterance: &str, kb: &KnowledgeBase) -> NavigationOutcome {
    let Some(mut preview) = resolve_preview(utterance, kb) else {
        return section_not_found(NavigationKind::Preview, kb);
    };
    preview.items.truncate(1);

    let text = match preview.items.first() {
        Some(item) => format!("Preview of {}: {}", item.title, item.summary),
        None => format!("The {} section is empty right now.", preview.title),
    };

    NavigationOutcome {
        kind: NavigationKind::Preview,
        text,
        preview: Some(preview),
        results: Vec::new(),
        suggestions: Vec::new(),
    }
}

fn search_terms(lowered: &str) -> Vec<String> {
    words(lowered)
        .into_iter()
        .filter(|w| !SEARCH_STOP_WORDS.contains(w))
        .map(|w| {
            // crude plural folding so "projects" still matches "project"
            if w.len() > 3 && w.ends_with('s') && !w.ends_with("ss") {
                w[..w.len() - 1].to_string()
            } else {
                w.to_string()
            }
        })
        .collect()
}

/// Terms of two characters or fewer ("ai", "ux") must match a whole word,
/// otherwise "ai" would hit "maintaining" and "email".
fn term_matches(term: &str, text: &str) -> bool {
    if term.chars().count() <= SHORT_TERM_LEN {
        text.split(|c: char| !c.is_alphanumeric()).any(|w| w == term)
    } else {
        text.contains(term)
    }
}

fn score_entry(terms: &[String], name: &str, description: &str, tags: &[&str]) -> u32 {
    let name = name.to_lowercase();
    let description = description.to_lowercase();
    let tags: Vec<String> = tags.iter().map(|t| t.to_lowercase()).collect();

    terms
        .iter()
        .map(|term| {
            let mut score = 0;
            if term_matches(term, &name) {
                score += NAME_WEIGHT;
            }
            if term_matches(term, &description) {
                score += DESCRIPTION_WEIGHT;
            }
            score += (tags.iter().filter(|t| term_matches(term, t)).count() as u32) * TAG_WEIGHT;
            score
        })
        .sum()
}

/// Scores every project, skill and experience entry. Returns at most five hits,
/// highest score first; equal scores keep knowledge base order.
pub fn search_knowledge(query: &str, kb: &KnowledgeBase) -> Vec<SearchHit> {
    let terms = search_terms(&query.to_lowercase());
    if terms.is_empty() {
        return Vec::new();
    }

    let mut hits = Vec::new();
    let mut order = 0;
    let mut push = |kind: SearchKind, id: String, title: String, score: u32| {
        if score > 0 {
            hits.push(SearchHit { kind, id, title, score, order });
        }
        order += 1;
    };

    for project in &kb.projects {
        let tags: Vec<&str> = project.technologies
            .iter()
            .chain(project.tags.iter())
            .map(String::as_str)
            .collect();
        let score = score_entry(&terms, &project.name, &project.description, &tags);
        push(SearchKind::Project, project.id.clone(), project.name.clone(), score);
    }

    for category in &kb.skill_categories {
        let tags: Vec<&str> = category.keywords.iter().map(String::as_str).collect();
        for (index, skill) in category.skills.iter().enumerate() {
            let score = score_entry(&terms, skill, &category.name, &tags);
            push(SearchKind::Skill, format!("{}-{}", category.id, index), skill.clone(), score);
        }
    }

    for entry in &kb.experience {
        let tags: Vec<&str> = entry.technologies.iter().map(String::as_str).collect();
        let score = score_entry(&terms, &entry.role, &entry.description, &tags);
        push(
            SearchKind::Experience,
            entry.id.clone(),
            format!("{} at {}", entry.role, entry.organization),
            score
        );
    }

    // sort_by is stable
    hits.sort_by(|a, b| b.score.cmp(&a.score));
    hits.truncate(MAX_SEARCH_RESULTS);
    hits
}

fn search(utterance: &str, kb: &KnowledgeBase) -> NavigationOutcome {
    let query = search_terms(&utterance.to_lowercase()).join(" ");
    let results = search_knowledge(utterance, kb);

    let text = if query.is_empty() {
        "What would you like me to search for? Try \"find AI projects\".".to_string()
    } else if results.is_empty() {
        format!("No matches found for \"{}\". Try searching for a skill, project or technology.", query)
    } else {
        let lines = results
            .iter()
            .enumerate()
            .map(|(i, hit)| {
                let kind = match hit.kind {
                    SearchKind::Project => "project",
                    SearchKind::Skill => "skill",
                    SearchKind::Experience => "experience",
                };
                format!("{}. {} ({})", i + 1, hit.title, kind)
            })
            .collect::<Vec<_>>()
            .join("\n");
        format!("Top matches for \"{}\":\n{}", query, lines)
    };

    NavigationOutcome {
        kind: NavigationKind::Search,
        text,
        preview: None,
        results,
        suggestions: Vec::new(),
    }
}

fn suggest(utterance: &str) -> NavigationOutcome {
    let lowered = utterance.to_lowercase();
    let picked = if lowered.contains("project") {
        PROJECT_SUGGESTIONS
    } else if lowered.contains("skill") {
        SKILL_SUGGESTIONS
    } else if lowered.contains("contact") || lowered.contains("collaborate") {
        CONTACT_SUGGESTIONS
    } else {
        DEFAULT_SUGGESTIONS
    };
    let suggestions: Vec<String> = picked.iter().map(|s| s.to_string()).collect();

    let text = format!(
        "Here are some things you could ask:\n{}",
        suggestions.iter().map(|s| format!("- {}", s)).collect::<Vec<_>>().join("\n")
    );

    NavigationOutcome {
        kind: NavigationKind::Suggest,
        text,
        preview: None,
        results: Vec::new(),
        suggestions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::knowledge::builtin_knowledge_base;

    #[test]
    fn test_kind_priority() {
        assert_eq!(navigation_kind("show me how to find things"), NavigationKind::DeepLink);
        assert_eq!(navigation_kind("preview and search"), NavigationKind::Preview);
        assert_eq!(navigation_kind("search, then suggest"), NavigationKind::Search);
        assert_eq!(navigation_kind("suggest a question"), NavigationKind::Suggest);
        assert_eq!(navigation_kind("where is everything"), NavigationKind::Unknown);
    }

    #[test]
    fn test_show_me_projects() {
        let kb = builtin_knowledge_base();
        let outcome = resolve_navigation("show me projects", &kb);
        assert_eq!(outcome.kind, NavigationKind::DeepLink);
        assert!(outcome.text.contains("projects"));

        let preview = outcome.preview.expect("deep link carries a preview");
        assert_eq!(preview.target, NavigationTarget::Projects);
        assert_eq!(preview.anchor, "#projects");
        assert!(preview.items.iter().any(|i| kb.projects.iter().any(|p| p.id == i.id)));
    }

    #[test]
    fn test_deep_link_scoped_to_project() {
        let kb = builtin_knowledge_base();
        let outcome = resolve_navigation("take me to Voice Journal", &kb);
        let preview = outcome.preview.unwrap();
        assert_eq!(preview.target, NavigationTarget::Projects);
        let ids: Vec<&str> = preview.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["voice-journal"]);
    }

    #[test]
    fn test_deep_link_scoped_to_skill_category() {
        let kb = builtin_knowledge_base();
        let preview = resolve_navigation("show me the technical skills", &kb).preview.unwrap();
        assert_eq!(preview.target, NavigationTarget::Skills);
        assert_eq!(preview.items.len(), 1);
        assert_eq!(preview.items[0].id, "technical");
    }

    #[test]
    fn test_deep_link_contact() {
        let kb = builtin_knowledge_base();
        let outcome = resolve_navigation("go to contact", &kb);
        assert_eq!(outcome.preview.unwrap().target, NavigationTarget::Contact);
        assert!(outcome.text.contains(&kb.personal.email));
    }

    #[test]
    fn test_deep_link_without_target_is_not_found() {
        let kb = builtin_knowledge_base();
        let outcome = resolve_navigation("take me somewhere nice", &kb);
        assert_eq!(outcome.kind, NavigationKind::DeepLink);
        assert!(outcome.preview.is_none());
        assert!(outcome.text.contains("couldn't find"));
    }

    #[test]
    fn test_preview_single_item() {
        let kb = builtin_knowledge_base();
        let outcome = resolve_navigation("preview Protogen 101", &kb);
        assert_eq!(outcome.kind, NavigationKind::Preview);
        let preview = outcome.preview.unwrap();
        assert_eq!(preview.items.len(), 1);
        assert_eq!(preview.items[0].id, "protogen-101");
        assert!(outcome.text.starts_with("Preview of Protogen 101"));
    }

    #[test]
    fn test_search_ranked_and_stable() {
        let kb = builtin_knowledge_base();
        let outcome = resolve_navigation("find AI projects", &kb);
        assert_eq!(outcome.kind, NavigationKind::Search);
        assert!(!outcome.results.is_empty());
        assert!(outcome.results.len() <= 5);

        for pair in outcome.results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
            if pair[0].score == pair[1].score {
                assert!(pair[0].order < pair[1].order);
            }
        }
        assert!(outcome.results.iter().any(|h| h.id == "protogen-101"));
    }

    #[test]
    fn test_search_weights() {
        let kb = builtin_knowledge_base();
        let hits = search_knowledge("find storybook", &kb);
        // technology match only
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "atlas-design-system");
        assert_eq!(hits[0].score, 1);

        let hits = search_knowledge("search for journal", &kb);
        // name plus description ("journaling")
        assert_eq!(hits[0].id, "voice-journal");
        assert_eq!(hits[0].score, 5);
    }

    #[test]
    fn test_short_terms_match_whole_words() {
        let kb = builtin_knowledge_base();
        let hits = search_knowledge("find ai", &kb);
        let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
        // "AI-powered" splits into words, "maintaining" does not count
        assert!(ids.contains(&"protogen-101"));
        assert!(!ids.contains(&"product-studio"));

        let protogen = hits.iter().find(|h| h.id == "protogen-101").unwrap();
        // description plus the "ai" tag
        assert_eq!(protogen.score, 3);
    }

    #[test]
    fn test_search_without_terms() {
        let kb = builtin_knowledge_base();
        let outcome = resolve_navigation("search for", &kb);
        assert!(outcome.results.is_empty());
        assert!(outcome.text.contains("What would you like me to search for"));
    }

    #[test]
    fn test_search_no_hits() {
        let kb = builtin_knowledge_base();
        let outcome = resolve_navigation("find quantum zebras", &kb);
        assert!(outcome.results.is_empty());
        assert!(outcome.text.starts_with("No matches found"));
    }

    #[test]
    fn test_suggest_sets() {
        let kb = builtin_knowledge_base();
        assert_eq!(resolve_navigation("suggest project questions", &kb).suggestions.len(), 3);
        assert_eq!(
            resolve_navigation("recommend a skill to ask about", &kb).suggestions,
            SKILL_SUGGESTIONS.iter().map(|s| s.to_string()).collect::<Vec<_>>()
        );
        assert_eq!(resolve_navigation("suggest how to collaborate", &kb).suggestions[0], CONTACT_SUGGESTIONS[0]);
        assert_eq!(resolve_navigation("suggest something", &kb).suggestions.len(), 4);
    }

    #[test]
    fn test_unknown_returns_help() {
        let kb = builtin_knowledge_base();
        let outcome = resolve_navigation("which page has the bio", &kb);
        assert_eq!(outcome.kind, NavigationKind::Unknown);
        assert_eq!(outcome.text, HELP_TEXT);
    }
}
