use crate::config::ConfigError;
use crate::models::knowledge::{
    Experience,
    KnowledgeBase,
    Personal,
    Project,
    ProjectStatus,
    Section,
    SkillCategory,
};
use log::info;
use std::collections::HashSet;
use std::fs;
use std::sync::Arc;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn builtin_knowledge_base() -> KnowledgeBase {
    KnowledgeBase {
        personal: Personal {
            name: "Jane".into(),
            title: "Experience Designer".into(),
            location: "Available for remote collaboration".into(),
            bio: "Experience Designer with a passion for integrating AI technology into human-centered design solutions.".into(),
            expertise: strings(
                &["UX/UI Design", "AI Integration", "Frontend Development", "User Research"]
            ),
            email: "jane@example.com".into(),
            availability: "Jane is available for design consultation and collaboration.".into(),
        },
        projects: vec![
            Project {
                id: "protogen-101".into(),
                name: "Protogen 101".into(),
                kind: "AI Integration Project".into(),
                description: "AI-powered portfolio navigator demonstrating practical LLM integration in design workflows".into(),
                technologies: strings(&["OpenAI API", "JavaScript", "CSS", "HTML"]),
                tags: strings(&["ai", "llm", "chat", "navigation"]),
                status: ProjectStatus::InDevelopment,
                url: "#protogen-101".into(),
            },
            Project {
                id: "atlas-design-system".into(),
                name: "Atlas Design System".into(),
                kind: "Design System".into(),
                description: "Token-based component library for consistent, accessible product interfaces".into(),
                technologies: strings(&["Figma", "CSS Custom Properties", "Storybook"]),
                tags: strings(&["design", "accessibility", "components"]),
                status: ProjectStatus::Concept,
                url: "#atlas-design-system".into(),
            },
            Project {
                id: "voice-journal".into(),
                name: "Voice Journal".into(),
                kind: "Conversational UI Concept".into(),
                description: "Voice-first journaling companion exploring conversational UI patterns with speech input".into(),
                technologies: strings(&["Web Speech API", "LLM Integration", "JavaScript"]),
                tags: strings(&["ai", "voice", "conversational ui"]),
                status: ProjectStatus::Concept,
                url: "#voice-journal".into(),
            }
        ],
        skill_categories: vec![
            SkillCategory {
                id: "design".into(),
                name: "Design".into(),
                skills: strings(
                    &[
                        "User Experience Design",
                        "User Interface Design",
                        "User Research",
                        "Prototyping",
                        "Design Systems",
                    ]
                ),
                keywords: strings(&["ux", "user research", "prototyp", "visual"]),
            },
            SkillCategory {
                id: "technical".into(),
                name: "Technical".into(),
                skills: strings(
                    &["JavaScript", "CSS3", "HTML5", "API Integration", "Responsive Design"]
                ),
                keywords: strings(&["javascript", "css", "html", "frontend", "coding", "develop"]),
            },
            SkillCategory {
                id: "ai".into(),
                name: "AI Integration".into(),
                skills: strings(
                    &[
                        "LLM Integration",
                        "Prompt Engineering",
                        "AI-Human Interaction Design",
                        "Conversational UI",
                    ]
                ),
                keywords: strings(&["ai", "llm", "prompt", "machine learning"]),
            }
        ],
        experience: vec![
            Experience {
                id: "independent-practice".into(),
                role: "Experience Designer".into(),
                organization: "Independent Practice".into(),
                period: "2023 - Present".into(),
                description: "Designing human-centered products that bring AI assistants into everyday workflows.".into(),
                technologies: strings(&["LLM Integration", "Figma", "JavaScript"]),
            },
            Experience {
                id: "product-studio".into(),
                role: "UX/UI Designer".into(),
                organization: "Digital Product Studio".into(),
                period: "2020 - 2023".into(),
                description: "Led user research and interface design for web and mobile products, maintaining a shared design system.".into(),
                technologies: strings(&["User Research", "Design Systems", "Prototyping"]),
            },
            Experience {
                id: "web-agency".into(),
                role: "Frontend Developer".into(),
                organization: "Web Agency".into(),
                period: "2018 - 2020".into(),
                description: "Built responsive, accessible websites and interactive prototypes for client campaigns.".into(),
                technologies: strings(&["HTML5", "CSS3", "JavaScript"]),
            }
        ],
        sections: vec![
            Section {
                id: "about".into(),
                title: "About".into(),
                anchor: "#about".into(),
                description: "Background, bio and areas of expertise".into(),
            },
            Section {
                id: "projects".into(),
                title: "Projects".into(),
                anchor: "#projects".into(),
                description: "Current and concept-stage work".into(),
            },
            Section {
                id: "skills".into(),
                title: "Skills".into(),
                anchor: "#skills".into(),
                description: "Design, technical and AI skills".into(),
            },
            Section {
                id: "contact".into(),
                title: "Contact".into(),
                anchor: "#contact".into(),
                description: "Ways to get in touch for collaboration".into(),
            }
        ],
    }
}

fn validate(kb: &KnowledgeBase) -> Result<(), ConfigError> {
    if kb.personal.name.trim().is_empty() {
        return Err(ConfigError::Invalid("personal.name must not be empty".to_string()));
    }
    let mut seen = HashSet::new();
    for project in &kb.projects {
        if !seen.insert(project.id.as_str()) {
            return Err(ConfigError::Invalid(format!("duplicate project id '{}'", project.id)));
        }
    }
    Ok(())
}

pub fn load_knowledge_base(path: Option<&str>) -> Result<Arc<KnowledgeBase>, ConfigError> {
    let kb = match path {
        Some(path) => {
            info!("Loading knowledge base from: {}", path);
            let json_str = fs::read_to_string(path)?;
            serde_json::from_str::<KnowledgeBase>(&json_str)?
        }
        None => {
            info!("Using built-in knowledge base");
            builtin_knowledge_base()
        }
    };
    validate(&kb)?;
    Ok(Arc::new(kb))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_is_valid() {
        let kb = builtin_knowledge_base();
        assert!(validate(&kb).is_ok());
        assert_eq!(kb.personal.name, "Jane");
        assert!(kb.section("contact").is_some());
        assert_eq!(kb.skill_category("ai").map(|c| c.skills.len()), Some(4));
    }

    #[test]
    fn test_load_from_file() {
        let mut kb = builtin_knowledge_base();
        kb.personal.name = "Sam".into();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", serde_json::to_string(&kb).unwrap()).unwrap();

        let loaded = load_knowledge_base(file.path().to_str()).unwrap();
        assert_eq!(loaded.personal.name, "Sam");
        assert_eq!(loaded.projects.len(), kb.projects.len());
    }

    #[test]
    fn test_duplicate_project_ids_rejected() {
        let mut kb = builtin_knowledge_base();
        let dup = kb.projects[0].clone();
        kb.projects.push(dup);
        assert!(matches!(validate(&kb), Err(ConfigError::Invalid(_))));
    }
}
