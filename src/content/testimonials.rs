use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{optional_url, parse_order, FieldErrors};
use crate::persist::{load_json, save_json};

const DEFAULT_RATING: u8 = 5;

/// A quote from a participant or parent shown on the references page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Testimonial {
    pub id: String,
    pub name: String,
    pub position: String,
    pub text: String,
    pub photo_url: Option<String>,
    /// 1 to 5 stars.
    pub rating: u8,
    pub is_active: bool,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Testimonial {
    pub fn stars(&self) -> String {
        "★".repeat(self.rating as usize)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TestimonialForm {
    pub name: String,
    pub position: String,
    pub text: String,
    pub photo_url: String,
    pub rating: String,
    pub display_order: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestimonialInput {
    pub name: String,
    pub position: String,
    pub text: String,
    pub photo_url: Option<String>,
    pub rating: u8,
    pub display_order: i32,
}

impl TestimonialForm {
    pub fn from_testimonial(t: &Testimonial) -> Self {
        TestimonialForm {
            name: t.name.clone(),
            position: t.position.clone(),
            text: t.text.clone(),
            photo_url: t.photo_url.clone().unwrap_or_default(),
            rating: t.rating.to_string(),
            display_order: t.display_order.to_string(),
        }
    }

    pub fn validate(&self) -> Result<TestimonialInput, FieldErrors> {
        let mut errors = FieldErrors::default();
        errors.check_len("name", &self.name, 1, "Jméno je povinné", Some((100, "Jméno je příliš dlouhé")));
        errors.check_len("position", &self.position, 1, "Pozice je povinná", Some((100, "Pozice je příliš dlouhá")));
        errors.check_len("text", &self.text, 1, "Text reference je povinný", Some((1000, "Text reference je příliš dlouhý")));
        let photo_url = optional_url(&mut errors, "photo_url", &self.photo_url, "Neplatná URL fotografie");

        let rating = match self.rating.trim() {
            "" => DEFAULT_RATING,
            value => match value.parse::<u8>() {
                Ok(r) if (1..=5).contains(&r) => r,
                _ => {
                    errors.push("rating", "Hodnocení musí být 1 až 5");
                    DEFAULT_RATING
                }
            },
        };
        let display_order = parse_order(&mut errors, "display_order", &self.display_order);

        errors.into_result(TestimonialInput {
            name: self.name.trim().to_string(),
            position: self.position.trim().to_string(),
            text: self.text.trim().to_string(),
            photo_url,
            rating,
            display_order,
        })
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TestimonialsFile {
    testimonials: Vec<Testimonial>,
}

pub struct TestimonialStore {
    file_path: PathBuf,
    testimonials: Vec<Testimonial>,
}

impl TestimonialStore {
    pub fn load_or_create(path: &Path) -> anyhow::Result<Self> {
        let file: TestimonialsFile = load_json(path)?;
        let mut store = TestimonialStore {
            file_path: path.to_path_buf(),
            testimonials: file.testimonials,
        };
        store.sort();
        Ok(store)
    }

    fn save(&self) -> anyhow::Result<()> {
        let file = TestimonialsFile {
            testimonials: self.testimonials.clone(),
        };
        save_json(&self.file_path, &file)
    }

    fn sort(&mut self) {
        self.testimonials
            .sort_by(|a, b| a.display_order.cmp(&b.display_order).then(a.created_at.cmp(&b.created_at)));
    }

    pub fn list(&self) -> &[Testimonial] {
        &self.testimonials
    }

    pub fn active(&self) -> Vec<Testimonial> {
        self.testimonials.iter().filter(|t| t.is_active).cloned().collect()
    }

    pub fn get(&self, id: &str) -> Option<&Testimonial> {
        self.testimonials.iter().find(|t| t.id == id)
    }

    /// New testimonials are shown immediately.
    pub fn create(&mut self, input: TestimonialInput, now: DateTime<Utc>) -> anyhow::Result<Testimonial> {
        let testimonial = Testimonial {
            id: uuid::Uuid::new_v4().to_string(),
            name: input.name,
            position: input.position,
            text: input.text,
            photo_url: input.photo_url,
            rating: input.rating,
            is_active: true,
            display_order: input.display_order,
            created_at: now,
            updated_at: now,
        };
        self.testimonials.push(testimonial.clone());
        self.sort();
        self.save()?;
        Ok(testimonial)
    }

    pub fn update(
        &mut self,
        id: &str,
        input: TestimonialInput,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Option<Testimonial>> {
        let Some(testimonial) = self.testimonials.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };
        testimonial.name = input.name;
        testimonial.position = input.position;
        testimonial.text = input.text;
        testimonial.photo_url = input.photo_url;
        testimonial.rating = input.rating;
        testimonial.display_order = input.display_order;
        testimonial.updated_at = now;

        let updated = testimonial.clone();
        self.sort();
        self.save()?;
        Ok(Some(updated))
    }

    pub fn delete(&mut self, id: &str) -> anyhow::Result<bool> {
        let before = self.testimonials.len();
        self.testimonials.retain(|t| t.id != id);
        if self.testimonials.len() == before {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    pub fn toggle_active(&mut self, id: &str, now: DateTime<Utc>) -> anyhow::Result<Option<bool>> {
        let Some(testimonial) = self.testimonials.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };
        testimonial.is_active = !testimonial.is_active;
        testimonial.updated_at = now;
        let active = testimonial.is_active;
        self.save()?;
        Ok(Some(active))
    }
}
