use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{is_checked, optional, optional_url, parse_order, FieldErrors};
use crate::persist::{load_json, save_json};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartnerCategory {
    Educational,
    Municipal,
    Corporate,
    Media,
}

impl PartnerCategory {
    pub const ALL: [PartnerCategory; 4] = [
        PartnerCategory::Educational,
        PartnerCategory::Municipal,
        PartnerCategory::Corporate,
        PartnerCategory::Media,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PartnerCategory::Educational => "educational",
            PartnerCategory::Municipal => "municipal",
            PartnerCategory::Corporate => "corporate",
            PartnerCategory::Media => "media",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PartnerCategory::Educational => "Vzdělávací instituce",
            PartnerCategory::Municipal => "Města a obce",
            PartnerCategory::Corporate => "Firemní partneři",
            PartnerCategory::Media => "Mediální partneři",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == value.trim())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Partner {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub website: Option<String>,
    pub logo_url: Option<String>,
    pub category: PartnerCategory,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PartnerForm {
    pub name: String,
    pub description: String,
    pub website: String,
    pub logo_url: String,
    pub category: String,
    pub display_order: String,
    pub is_active: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartnerInput {
    pub name: String,
    pub description: Option<String>,
    pub website: Option<String>,
    pub logo_url: Option<String>,
    pub category: PartnerCategory,
    pub display_order: i32,
    pub is_active: bool,
}

impl PartnerForm {
    /// Empty form for a new partner; new partners start active.
    pub fn blank() -> Self {
        PartnerForm {
            is_active: Some("on".to_string()),
            ..Default::default()
        }
    }

    pub fn from_partner(partner: &Partner) -> Self {
        PartnerForm {
            name: partner.name.clone(),
            description: partner.description.clone().unwrap_or_default(),
            website: partner.website.clone().unwrap_or_default(),
            logo_url: partner.logo_url.clone().unwrap_or_default(),
            category: partner.category.as_str().to_string(),
            display_order: partner.display_order.to_string(),
            is_active: partner.is_active.then(|| "on".to_string()),
        }
    }

    pub fn is_active(&self) -> bool {
        is_checked(&self.is_active)
    }

    pub fn validate(&self) -> Result<PartnerInput, FieldErrors> {
        let mut errors = FieldErrors::default();
        errors.check_len("name", &self.name, 1, "Název je povinný", Some((200, "Název je příliš dlouhý")));
        errors.check_len("description", &self.description, 0, "", Some((1000, "Popis je příliš dlouhý")));
        let website = optional_url(&mut errors, "website", &self.website, "Neplatná adresa webu");
        let logo_url = optional_url(&mut errors, "logo_url", &self.logo_url, "Neplatná URL loga");
        let category = PartnerCategory::parse(&self.category);
        if category.is_none() {
            errors.push("category", "Neplatná kategorie");
        }
        let display_order = parse_order(&mut errors, "display_order", &self.display_order);

        let Some(category) = category else {
            return Err(errors);
        };
        errors.into_result(PartnerInput {
            name: self.name.trim().to_string(),
            description: optional(&self.description),
            website,
            logo_url,
            category,
            display_order,
            is_active: self.is_active(),
        })
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PartnersFile {
    partners: Vec<Partner>,
}

pub struct PartnerStore {
    file_path: PathBuf,
    partners: Vec<Partner>,
}

impl PartnerStore {
    pub fn load_or_create(path: &Path) -> anyhow::Result<Self> {
        let file: PartnersFile = load_json(path)?;
        let mut store = PartnerStore {
            file_path: path.to_path_buf(),
            partners: file.partners,
        };
        store.sort();
        Ok(store)
    }

    fn save(&self) -> anyhow::Result<()> {
        let file = PartnersFile {
            partners: self.partners.clone(),
        };
        save_json(&self.file_path, &file)
    }

    // Category, then display order, then name
    fn sort(&mut self) {
        self.partners.sort_by(|a, b| {
            a.category
                .cmp(&b.category)
                .then(a.display_order.cmp(&b.display_order))
                .then_with(|| a.name.cmp(&b.name))
        });
    }

    pub fn list(&self) -> &[Partner] {
        &self.partners
    }

    /// Active partners grouped by category; empty categories are left out.
    pub fn active_by_category(&self) -> Vec<(PartnerCategory, Vec<Partner>)> {
        PartnerCategory::ALL
            .into_iter()
            .map(|category| {
                let partners = self
                    .partners
                    .iter()
                    .filter(|p| p.is_active && p.category == category)
                    .cloned()
                    .collect::<Vec<_>>();
                (category, partners)
            })
            .filter(|(_, partners)| !partners.is_empty())
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<&Partner> {
        self.partners.iter().find(|p| p.id == id)
    }

    pub fn create(&mut self, input: PartnerInput, now: DateTime<Utc>) -> anyhow::Result<Partner> {
        let partner = Partner {
            id: uuid::Uuid::new_v4().to_string(),
            name: input.name,
            description: input.description,
            website: input.website,
            logo_url: input.logo_url,
            category: input.category,
            display_order: input.display_order,
            is_active: input.is_active,
            created_at: now,
            updated_at: now,
        };
        self.partners.push(partner.clone());
        self.sort();
        self.save()?;
        Ok(partner)
    }

    pub fn update(
        &mut self,
        id: &str,
        input: PartnerInput,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Option<Partner>> {
        let Some(partner) = self.partners.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        partner.name = input.name;
        partner.description = input.description;
        partner.website = input.website;
        partner.logo_url = input.logo_url;
        partner.category = input.category;
        partner.display_order = input.display_order;
        partner.is_active = input.is_active;
        partner.updated_at = now;

        let updated = partner.clone();
        self.sort();
        self.save()?;
        Ok(Some(updated))
    }

    pub fn delete(&mut self, id: &str) -> anyhow::Result<bool> {
        let before = self.partners.len();
        self.partners.retain(|p| p.id != id);
        if self.partners.len() == before {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    pub fn toggle_active(&mut self, id: &str, now: DateTime<Utc>) -> anyhow::Result<Option<bool>> {
        let Some(partner) = self.partners.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        partner.is_active = !partner.is_active;
        partner.updated_at = now;
        let active = partner.is_active;
        self.save()?;
        Ok(Some(active))
    }
}
