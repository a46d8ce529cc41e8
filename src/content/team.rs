use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{is_valid_email, optional, optional_url, parse_order, FieldErrors};
use crate::persist::{load_json, save_json};

/// Editable text of the "O nás" page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AboutContent {
    pub title: String,
    pub content: String,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for AboutContent {
    fn default() -> Self {
        AboutContent {
            title: "O nás".to_string(),
            content: "Informace o naší organizaci se právě připravují.".to_string(),
            updated_at: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: String,
    pub name: String,
    pub position: String,
    pub email: Option<String>,
    pub image_url: Option<String>,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TeamMember {
    /// First letter of each name part, shown when there is no photo.
    pub fn initials(&self) -> String {
        self.name
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .collect()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AboutForm {
    pub title: String,
    pub content: String,
}

impl AboutForm {
    pub fn from_content(about: &AboutContent) -> Self {
        AboutForm {
            title: about.title.clone(),
            content: about.content.clone(),
        }
    }

    pub fn validate(&self) -> Result<(String, String), FieldErrors> {
        let mut errors = FieldErrors::default();
        errors.check_len("title", &self.title, 1, "Nadpis je povinný", Some((200, "Nadpis je příliš dlouhý")));
        errors.check_len("content", &self.content, 1, "Obsah je povinný", None);
        errors.into_result((self.title.trim().to_string(), self.content.trim().to_string()))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MemberForm {
    pub name: String,
    pub position: String,
    pub email: String,
    pub image_url: String,
    pub display_order: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInput {
    pub name: String,
    pub position: String,
    pub email: Option<String>,
    pub image_url: Option<String>,
    pub display_order: i32,
}

impl MemberForm {
    pub fn from_member(member: &TeamMember) -> Self {
        MemberForm {
            name: member.name.clone(),
            position: member.position.clone(),
            email: member.email.clone().unwrap_or_default(),
            image_url: member.image_url.clone().unwrap_or_default(),
            display_order: member.display_order.to_string(),
        }
    }

    pub fn validate(&self) -> Result<MemberInput, FieldErrors> {
        let mut errors = FieldErrors::default();
        errors.check_len("name", &self.name, 1, "Jméno je povinné", Some((100, "Jméno je příliš dlouhé")));
        errors.check_len("position", &self.position, 1, "Pozice je povinná", Some((100, "Pozice je příliš dlouhá")));
        let email = optional(&self.email);
        if email.as_deref().is_some_and(|e| !is_valid_email(e)) {
            errors.push("email", "Neplatný email");
        }
        let image_url = optional_url(&mut errors, "image_url", &self.image_url, "Neplatná URL fotografie");
        let display_order = parse_order(&mut errors, "display_order", &self.display_order);

        errors.into_result(MemberInput {
            name: self.name.trim().to_string(),
            position: self.position.trim().to_string(),
            email,
            image_url,
            display_order,
        })
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TeamFile {
    #[serde(default)]
    about: AboutContent,
    #[serde(default)]
    members: Vec<TeamMember>,
}

pub struct TeamStore {
    file_path: PathBuf,
    about: AboutContent,
    members: Vec<TeamMember>,
}

impl TeamStore {
    pub fn load_or_create(path: &Path) -> anyhow::Result<Self> {
        let file: TeamFile = load_json(path)?;
        let mut store = TeamStore {
            file_path: path.to_path_buf(),
            about: file.about,
            members: file.members,
        };
        store.sort();
        Ok(store)
    }

    fn save(&self) -> anyhow::Result<()> {
        let file = TeamFile {
            about: self.about.clone(),
            members: self.members.clone(),
        };
        save_json(&self.file_path, &file)
    }

    fn sort(&mut self) {
        self.members
            .sort_by(|a, b| a.display_order.cmp(&b.display_order).then_with(|| a.name.cmp(&b.name)));
    }

    pub fn about(&self) -> &AboutContent {
        &self.about
    }

    pub fn update_about(&mut self, title: String, content: String, now: DateTime<Utc>) -> anyhow::Result<()> {
        self.about = AboutContent {
            title,
            content,
            updated_at: Some(now),
        };
        self.save()
    }

    pub fn members(&self) -> &[TeamMember] {
        &self.members
    }

    pub fn get(&self, id: &str) -> Option<&TeamMember> {
        self.members.iter().find(|m| m.id == id)
    }

    pub fn add(&mut self, input: MemberInput, now: DateTime<Utc>) -> anyhow::Result<TeamMember> {
        let member = TeamMember {
            id: uuid::Uuid::new_v4().to_string(),
            name: input.name,
            position: input.position,
            email: input.email,
            image_url: input.image_url,
            display_order: input.display_order,
            created_at: now,
            updated_at: now,
        };
        self.members.push(member.clone());
        self.sort();
        self.save()?;
        Ok(member)
    }

    pub fn update(
        &mut self,
        id: &str,
        input: MemberInput,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Option<TeamMember>> {
        let Some(member) = self.members.iter_mut().find(|m| m.id == id) else {
            return Ok(None);
        };
        member.name = input.name;
        member.position = input.position;
        member.email = input.email;
        member.image_url = input.image_url;
        member.display_order = input.display_order;
        member.updated_at = now;

        let updated = member.clone();
        self.sort();
        self.save()?;
        Ok(Some(updated))
    }

    pub fn delete(&mut self, id: &str) -> anyhow::Result<bool> {
        let before = self.members.len();
        self.members.retain(|m| m.id != id);
        if self.members.len() == before {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }
}
