use serde::Deserialize;
use std::error::Error;
use std::fmt;
use std::fs;
use std::sync::Arc;
use std::time::SystemTime;
use log::info;

use crate::intent::Intent;
use crate::models::knowledge::KnowledgeBase;

const TOP_ITEMS: usize = 3;

#[derive(Debug)]
pub enum PromptError {
    MissingPlaceholder(String),
    IoError(std::io::Error),
    JsonError(serde_json::Error),
}

impl fmt::Display for PromptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptError::MissingPlaceholder(key) => write!(f, "Prompt template is missing placeholder '{}'", key),
            PromptError::IoError(e) => write!(f, "Prompt file IO error: {}", e),
            PromptError::JsonError(e) => write!(f, "Prompt JSON parsing error: {}", e),
        }
    }
}

impl Error for PromptError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PromptError::IoError(e) => Some(e),
            PromptError::JsonError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PromptError {
    fn from(err: std::io::Error) -> Self {
        PromptError::IoError(err)
    }
}

impl From<serde_json::Error> for PromptError {
    fn from(err: serde_json::Error) -> Self {
        PromptError::JsonError(err)
    }
}

const DEFAULT_SYSTEM_TEMPLATE: &str = "You are the assistant on the portfolio website of {name}, {title}. {bio}
Location: {location}
Expertise: {expertise}
Key projects: {projects}
Key skills:
{skills}

Answer visitor questions about {name} in a friendly, professional tone. Keep answers under 150 words and only use the information given here. If something is not covered, suggest contacting {name} directly.";

const DEFAULT_USER_TEMPLATE: &str = "{message}{context}";

#[derive(Deserialize, Debug, Clone)]
pub struct PromptConfig {
    pub system_template: String,
    pub user_template: String,
    #[serde(skip)]
    pub last_loaded: Option<SystemTime>,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            system_template: DEFAULT_SYSTEM_TEMPLATE.to_string(),
            user_template: DEFAULT_USER_TEMPLATE.to_string(),
            last_loaded: None,
        }
    }
}

impl PromptConfig {
    fn validate(&self) -> Result<(), PromptError> {
        if !self.user_template.contains("{message}") {
            return Err(PromptError::MissingPlaceholder("user_template:{message}".to_string()));
        }
        Ok(())
    }
}

pub fn load_prompts(path: Option<&str>) -> Result<Arc<PromptConfig>, PromptError> {
    let Some(path) = path else {
        info!("Using built-in prompt templates");
        return Ok(Arc::new(PromptConfig::default()));
    };
    info!("Loading prompt templates from: {}", path);
    let file_content = fs::read_to_string(path)?;
    let mut config: PromptConfig = serde_json::from_str(&file_content)?;
    config.validate()?;
    config.last_loaded = Some(SystemTime::now());
    Ok(Arc::new(config))
}

fn top_projects(kb: &KnowledgeBase) -> String {
    kb.projects.iter().take(TOP_ITEMS).map(|p| p.name.as_str()).collect::<Vec<_>>().join(", ")
}

fn top_skills(kb: &KnowledgeBase) -> String {
    kb.skill_categories
        .iter()
        .map(|c| format!("- {}: {}", c.name, c.skills.iter().take(TOP_ITEMS).cloned().collect::<Vec<_>>().join(", ")))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn projects_context(kb: &KnowledgeBase) -> String {
    kb.projects
        .iter()
        .map(|p| {
            format!(
                "- {} [{}] ({}): {}. Technologies: {}",
                p.name,
                p.kind,
                p.status.label(),
                p.description,
                p.technologies.join(", ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn skills_context(kb: &KnowledgeBase) -> String {
    kb.skill_categories
        .iter()
        .map(|c| format!("- {}: {}", c.name, c.skills.join(", ")))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn experience_context(kb: &KnowledgeBase) -> String {
    kb.experience
        .iter()
        .map(|e| format!("- {} at {} ({}): {}", e.role, e.organization, e.period, e.description))
        .collect::<Vec<_>>()
        .join("\n")
}

fn contact_context(kb: &KnowledgeBase) -> String {
    format!(
        "- Availability: {}\n- Email: {}\n- Location: {}",
        kb.personal.availability,
        kb.personal.email,
        kb.personal.location
    )
}

fn about_context(kb: &KnowledgeBase) -> String {
    format!("- Bio: {}\n- Expertise: {}", kb.personal.bio, kb.personal.expertise.join(", "))
}

fn intent_context(kb: &KnowledgeBase, intent: Intent) -> Option<String> {
    let block = match intent {
        Intent::Projects | Intent::Ai => format!("Projects:\n{}", projects_context(kb)),
        Intent::Skills => format!("Skills:\n{}", skills_context(kb)),
        Intent::Experience => format!("Work history:\n{}", experience_context(kb)),
        Intent::Contact => format!("Contact:\n{}", contact_context(kb)),
        Intent::About => format!("About:\n{}", about_context(kb)),
        Intent::Navigation | Intent::Default => {
            return None;
        }
    };
    Some(block)
}

pub fn get_system_prompt(config: &PromptConfig, kb: &KnowledgeBase) -> String {
    let personal = &kb.personal;
    config.system_template
        .replace("{name}", &personal.name)
        .replace("{title}", &personal.title)
        .replace("{bio}", &personal.bio)
        .replace("{location}", &personal.location)
        .replace("{expertise}", &personal.expertise.join(", "))
        .replace("{projects}", &top_projects(kb))
        .replace("{skills}", &top_skills(kb))
}

pub fn get_user_prompt(config: &PromptConfig, kb: &KnowledgeBase, message: &str, intent: Intent) -> String {
    let context = intent_context(kb, intent)
        .map(|block| format!("\n\nRelevant context:\n{}", block))
        .unwrap_or_default();
    // context first so a message containing "{context}" is left alone
    config.user_template.replace("{context}", &context).replace("{message}", message)
}
