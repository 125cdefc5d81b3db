use serde::{ Serialize, Deserialize };

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Personal {
    pub name: String,
    pub title: String,
    pub location: String,
    pub bio: String,
    pub expertise: Vec<String>,
    pub email: String,
    pub availability: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    InDevelopment,
    Concept,
    Completed,
}

impl ProjectStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ProjectStatus::InDevelopment => "In Development",
            ProjectStatus::Concept => "Concept",
            ProjectStatus::Completed => "Completed",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub kind: String,
    pub description: String,
    pub technologies: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub status: ProjectStatus,
    pub url: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SkillCategory {
    pub id: String,
    pub name: String,
    pub skills: Vec<String>,
    /// Extra words that select this category in a question, besides id and name.
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Experience {
    pub id: String,
    pub role: String,
    pub organization: String,
    pub period: String,
    pub description: String,
    #[serde(default)]
    pub technologies: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    pub title: String,
    pub anchor: String,
    pub description: String,
}

/// Static facts about the portfolio owner. Loaded once and shared read-only.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KnowledgeBase {
    pub personal: Personal,
    pub projects: Vec<Project>,
    pub skill_categories: Vec<SkillCategory>,
    pub experience: Vec<Experience>,
    pub sections: Vec<Section>,
}

impl KnowledgeBase {
    pub fn projects_with_status(&self, status: ProjectStatus) -> impl Iterator<Item = &Project> {
        self.projects.iter().filter(move |p| p.status == status)
    }

    pub fn skill_category(&self, id: &str) -> Option<&SkillCategory> {
        self.skill_categories.iter().find(|c| c.id == id)
    }

    pub fn section(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }
}
