use crate::intent::Intent;
use crate::models::knowledge::{ KnowledgeBase, ProjectStatus, SkillCategory };

const SKILLS_PER_CATEGORY: usize = 4;
const EXPERTISE_IN_BIO: usize = 3;

/// Picks the skill category an utterance refers to by id, name or keyword.
pub fn match_skill_category<'a>(kb: &'a KnowledgeBase, utterance: &str) -> Option<&'a SkillCategory> {
    let lowered = utterance.to_lowercase();
    kb.skill_categories.iter().find(|category| {
        lowered.contains(&category.id.to_lowercase()) ||
            lowered.contains(&category.name.to_lowercase()) ||
            category.keywords.iter().any(|k| lowered.contains(&k.to_lowercase()))
    })
}

fn first_skills(category: &SkillCategory) -> String {
    category.skills.iter().take(SKILLS_PER_CATEGORY).cloned().collect::<Vec<_>>().join(", ")
}

fn join_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.collect::<Vec<_>>().join(", ")
}

/// Deterministic answer built only from knowledge base fields.
pub fn render(intent: Intent, utterance: &str, kb: &KnowledgeBase) -> String {
    let name = &kb.personal.name;
    match intent {
        Intent::About => {
            let expertise = join_names(
                kb.personal.expertise.iter().take(EXPERTISE_IN_BIO).map(String::as_str)
            );
            format!("{} is an {}. {} Areas of expertise include {}.", name, kb.personal.title, kb.personal.bio, expertise)
        }
        Intent::Skills => {
            match match_skill_category(kb, utterance) {
                Some(category) =>
                    format!("{}'s {} skills include {}.", name, category.name, first_skills(category)),
                None => {
                    let lines = kb.skill_categories
                        .iter()
                        .map(|c| format!("- {}: {}", c.name, first_skills(c)))
                        .collect::<Vec<_>>()
                        .join("\n");
                    format!("{}'s skills span {} areas:\n{}", name, kb.skill_categories.len(), lines)
                }
            }
        }
        Intent::Projects => {
            let active: Vec<&str> = kb
                .projects_with_status(ProjectStatus::InDevelopment)
                .map(|p| p.name.as_str())
                .collect();
            let concepts = kb.projects_with_status(ProjectStatus::Concept).count();
            let mut text = format!(
                "{} has {} project(s) in development and {} in the concept stage.",
                name,
                active.len(),
                concepts
            );
            if !active.is_empty() {
                text.push_str(&format!(" Currently in development: {}.", active.join(", ")));
            }
            text
        }
        Intent::Experience => {
            match kb.experience.first() {
                Some(latest) =>
                    format!(
                        "{} currently works as {} at {} ({}). {} The portfolio lists {} role(s) in total.",
                        name,
                        latest.role,
                        latest.organization,
                        latest.period,
                        latest.description,
                        kb.experience.len()
                    ),
                None => format!("{} is an {}.", name, kb.personal.title),
            }
        }
        Intent::Contact => {
            format!(
                "{} You can reach {} at {}. Location: {}.",
                kb.personal.availability,
                name,
                kb.personal.email,
                kb.personal.location
            )
        }
        Intent::Ai => {
            let mut text = match kb.skill_category("ai") {
                Some(category) =>
                    format!("{} specializes in {}.", name, first_skills(category)),
                None => format!("{} is an {}.", name, kb.personal.title),
            };
            let ai_projects = join_names(
                kb.projects
                    .iter()
                    .filter(|p| p.tags.iter().any(|t| t.eq_ignore_ascii_case("ai")))
                    .map(|p| p.name.as_str())
            );
            if !ai_projects.is_empty() {
                text.push_str(&format!(" AI projects: {}.", ai_projects));
            }
            text
        }
        Intent::Navigation => {
            let sections = join_names(kb.sections.iter().map(|s| s.title.as_str()));
            format!("You can explore these sections of {}'s portfolio: {}.", name, sections)
        }
        Intent::Default => {
            format!(
                "I'd be happy to help you learn more about {}'s work! You can ask about {}'s background, skills, projects, experience, or how to get in touch.",
                name,
                name
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::knowledge::builtin_knowledge_base;

    #[test]
    fn test_about_uses_three_expertise_entries() {
        let kb = builtin_knowledge_base();
        let text = render(Intent::About, "who is she", &kb);
        assert!(text.contains(&kb.personal.bio));
        assert!(text.contains("UX/UI Design, AI Integration, Frontend Development"));
        assert!(!text.contains("User Research"));
    }

    #[test]
    fn test_skills_uses_matched_category() {
        let kb = builtin_knowledge_base();
        let text = render(Intent::Skills, "what design skills", &kb);
        assert!(text.contains("User Experience Design, User Interface Design, User Research, Prototyping"));
        assert!(!text.contains("Design Systems"));
    }

    #[test]
    fn test_skills_without_category_lists_all() {
        let kb = builtin_knowledge_base();
        let text = render(Intent::Skills, "what skills", &kb);
        for category in &kb.skill_categories {
            assert!(text.contains(&category.name));
        }
    }

    #[test]
    fn test_projects_counts_by_status() {
        let kb = builtin_knowledge_base();
        let text = render(Intent::Projects, "projects", &kb);
        assert!(text.contains("1 project(s) in development and 2 in the concept stage"));
        assert!(text.contains("Protogen 101"));
    }

    #[test]
    fn test_every_intent_renders_text() {
        let kb = builtin_knowledge_base();
        for intent in [
            Intent::About,
            Intent::Skills,
            Intent::Projects,
            Intent::Experience,
            Intent::Contact,
            Intent::Ai,
            Intent::Navigation,
            Intent::Default,
        ] {
            assert!(!render(intent, "", &kb).trim().is_empty(), "{} rendered empty", intent);
        }
    }
}
