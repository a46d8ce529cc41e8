use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::slug::{slugify, unique_slug};
use super::validation::{is_valid_url, FieldErrors};
use crate::persist::{load_json, save_json};

const DEFAULT_READ_TIME: u32 = 5;
const FEATURED_LIMIT: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsArticle {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub perex: String,
    pub content: String,
    pub author: String,
    pub category: String,
    pub tags: Vec<String>,
    pub image_url: Option<String>,
    pub featured: bool,
    pub read_time: u32,
    pub published_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw admin form submission.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewsForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub perex: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub image_url: String,
    pub featured: Option<String>,
    #[serde(default)]
    pub read_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsInput {
    pub title: String,
    pub perex: String,
    pub content: String,
    pub author: String,
    pub category: String,
    pub tags: Vec<String>,
    pub image_url: Option<String>,
    pub featured: bool,
    pub read_time: u32,
}

impl NewsForm {
    pub fn from_article(article: &NewsArticle) -> Self {
        NewsForm {
            title: article.title.clone(),
            perex: article.perex.clone(),
            content: article.content.clone(),
            author: article.author.clone(),
            category: article.category.clone(),
            tags: article.tags.join(", "),
            image_url: article.image_url.clone().unwrap_or_default(),
            featured: article.featured.then(|| "on".to_string()),
            read_time: article.read_time.to_string(),
        }
    }

    pub fn is_featured(&self) -> bool {
        self.featured.as_deref() == Some("on")
    }

    pub fn validate(&self) -> Result<NewsInput, FieldErrors> {
        let mut errors = FieldErrors::default();
        errors.check_len("title", &self.title, 1, "Název je povinný", Some((200, "Název je příliš dlouhý")));
        errors.check_len(
            "perex",
            &self.perex,
            10,
            "Perex musí mít alespoň 10 znaků",
            Some((500, "Perex je příliš dlouhý")),
        );
        errors.check_len("content", &self.content, 50, "Obsah musí mít alespoň 50 znaků", None);
        errors.check_len(
            "author",
            &self.author,
            1,
            "Autor je povinný",
            Some((100, "Jméno autora je příliš dlouhé")),
        );
        errors.check_len("category", &self.category, 1, "Kategorie je povinná", None);

        let image_url = self.image_url.trim();
        if !image_url.is_empty() && !is_valid_url(image_url) {
            errors.push("image_url", "Neplatná URL obrázku");
        }

        let read_time = self
            .read_time
            .trim()
            .parse::<u32>()
            .unwrap_or(DEFAULT_READ_TIME);
        if read_time < 1 {
            errors.push("read_time", "Čas čtení musí být alespoň 1 minuta");
        } else if read_time > 60 {
            errors.push("read_time", "Čas čtení je příliš dlouhý");
        }

        let tags = self
            .tags
            .split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        errors.into_result(NewsInput {
            title: self.title.trim().to_string(),
            perex: self.perex.trim().to_string(),
            content: self.content.trim().to_string(),
            author: self.author.trim().to_string(),
            category: self.category.trim().to_string(),
            tags,
            image_url: (!image_url.is_empty()).then(|| image_url.to_string()),
            featured: self.is_featured(),
            read_time,
        })
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct NewsFile {
    articles: Vec<NewsArticle>,
}

pub struct NewsStore {
    file_path: PathBuf,
    articles: Vec<NewsArticle>,
}

impl NewsStore {
    pub fn load_or_create(path: &Path) -> anyhow::Result<Self> {
        let file: NewsFile = load_json(path)?;
        let mut store = NewsStore {
            file_path: path.to_path_buf(),
            articles: file.articles,
        };
        store.sort();
        Ok(store)
    }

    fn save(&self) -> anyhow::Result<()> {
        let file = NewsFile {
            articles: self.articles.clone(),
        };
        save_json(&self.file_path, &file)
    }

    // Newest first
    fn sort(&mut self) {
        self.articles
            .sort_by(|a, b| b.published_at.cmp(&a.published_at));
    }

    pub fn list(&self) -> &[NewsArticle] {
        &self.articles
    }

    pub fn latest(&self, limit: usize) -> Vec<NewsArticle> {
        self.articles.iter().take(limit).cloned().collect()
    }

    pub fn featured(&self) -> Vec<NewsArticle> {
        self.articles
            .iter()
            .filter(|a| a.featured)
            .take(FEATURED_LIMIT)
            .cloned()
            .collect()
    }

    pub fn by_category(&self, category: &str) -> Vec<NewsArticle> {
        self.articles
            .iter()
            .filter(|a| a.category.eq_ignore_ascii_case(category))
            .cloned()
            .collect()
    }

    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> =
            self.articles.iter().map(|a| a.category.clone()).collect();
        categories.sort();
        categories.dedup();
        categories
    }

    pub fn get_by_slug(&self, slug: &str) -> Option<&NewsArticle> {
        self.articles.iter().find(|a| a.slug == slug)
    }

    pub fn get(&self, id: &str) -> Option<&NewsArticle> {
        self.articles.iter().find(|a| a.id == id)
    }

    pub fn create(&mut self, input: NewsInput, now: DateTime<Utc>) -> anyhow::Result<NewsArticle> {
        let slug = unique_slug(&slugify(&input.title), "clanek", |s| {
            self.articles.iter().any(|a| a.slug == s)
        });

        let article = NewsArticle {
            id: uuid::Uuid::new_v4().to_string(),
            slug,
            title: input.title,
            perex: input.perex,
            content: input.content,
            author: input.author,
            category: input.category,
            tags: input.tags,
            image_url: input.image_url,
            featured: input.featured,
            read_time: input.read_time,
            published_at: now,
            created_at: now,
            updated_at: now,
        };
        self.articles.push(article.clone());
        self.sort();
        self.save()?;
        Ok(article)
    }

    /// Replaces the editable fields; slug and publication time are kept.
    pub fn update(
        &mut self,
        id: &str,
        input: NewsInput,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Option<NewsArticle>> {
        let Some(article) = self.articles.iter_mut().find(|a| a.id == id) else {
            return Ok(None);
        };

        article.title = input.title;
        article.perex = input.perex;
        article.content = input.content;
        article.author = input.author;
        article.category = input.category;
        article.tags = input.tags;
        article.image_url = input.image_url;
        article.featured = input.featured;
        article.read_time = input.read_time;
        article.updated_at = now;

        let updated = article.clone();
        self.save()?;
        Ok(Some(updated))
    }

    pub fn delete(&mut self, id: &str) -> anyhow::Result<bool> {
        let before = self.articles.len();
        self.articles.retain(|a| a.id != id);
        if self.articles.len() == before {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    pub fn toggle_featured(&mut self, id: &str, now: DateTime<Utc>) -> anyhow::Result<Option<bool>> {
        let Some(article) = self.articles.iter_mut().find(|a| a.id == id) else {
            return Ok(None);
        };
        article.featured = !article.featured;
        article.updated_at = now;
        let featured = article.featured;
        self.save()?;
        Ok(Some(featured))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use std::fs;
    use tempfile::NamedTempFile;

    fn temp_path() -> PathBuf {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_path_buf();
        drop(file);
        path
    }

    fn form(title: &str) -> NewsForm {
        NewsForm {
            title: title.to_string(),
            perex: "Krátký perex článku.".to_string(),
            content: "Obsah článku, který musí mít alespoň padesát znaků, aby prošel.".to_string(),
            author: "Redakce".to_string(),
            category: "Tábory".to_string(),
            tags: "léto, děti, ,tábor".to_string(),
            image_url: String::new(),
            featured: None,
            read_time: String::new(),
        }
    }

    #[test]
    fn test_validate_defaults() {
        let input = form("Letní tábor").validate().unwrap();
        assert_eq!(input.tags, vec!["léto", "děti", "tábor"]);
        assert_eq!(input.read_time, 5);
        assert!(input.image_url.is_none());
        assert!(!input.featured);
    }

    #[test]
    fn test_validate_errors() {
        let mut bad = form("");
        bad.perex = "short".to_string();
        bad.content = "too short".to_string();
        bad.image_url = "not-a-url".to_string();
        bad.read_time = "90".to_string();
        let errors = bad.validate().unwrap_err();
        for field in ["title", "perex", "content", "image_url", "read_time"] {
            assert!(errors.has(field), "missing error for {}", field);
        }
        assert!(!errors.has("author"));
        assert_eq!(errors.0[0].message, "Název je povinný");
        assert!(errors.0.iter().any(|e| e.message == "Čas čtení je příliš dlouhý"));
    }

    #[test]
    fn test_create_and_slug_collision() {
        let path = temp_path();
        let mut store = NewsStore::load_or_create(&path).unwrap();
        let now = Utc::now();
        let first = store.create(form("Letní tábor").validate().unwrap(), now).unwrap();
        let second = store
            .create(form("Letní tábor").validate().unwrap(), now + TimeDelta::seconds(1))
            .unwrap();
        assert_eq!(first.slug, "letni-tabor");
        assert_eq!(second.slug, "letni-tabor-2");
        assert_eq!(store.list()[0].id, second.id);
        assert!(store.get_by_slug("letni-tabor").is_some());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_update_keeps_slug() {
        let path = temp_path();
        let mut store = NewsStore::load_or_create(&path).unwrap();
        let now = Utc::now();
        let article = store.create(form("Původní název").validate().unwrap(), now).unwrap();

        let later = now + TimeDelta::hours(1);
        let updated = store
            .update(&article.id, form("Nový název").validate().unwrap(), later)
            .unwrap()
            .unwrap();
        assert_eq!(updated.slug, "puvodni-nazev");
        assert_eq!(updated.title, "Nový název");
        assert_eq!(updated.published_at, article.published_at);
        assert_eq!(updated.updated_at, later);

        assert!(store.update("missing", form("x").validate().unwrap(), later).unwrap().is_none());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_featured_toggle_and_delete() {
        let path = temp_path();
        let mut store = NewsStore::load_or_create(&path).unwrap();
        let now = Utc::now();
        let article = store.create(form("Článek").validate().unwrap(), now).unwrap();

        assert_eq!(store.toggle_featured(&article.id, now).unwrap(), Some(true));
        assert_eq!(store.featured().len(), 1);
        assert_eq!(store.toggle_featured(&article.id, now).unwrap(), Some(false));
        assert!(store.featured().is_empty());

        assert!(store.delete(&article.id).unwrap());
        assert!(!store.delete(&article.id).unwrap());
        assert!(store.list().is_empty());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_featured_limit_and_categories() {
        let path = temp_path();
        let mut store = NewsStore::load_or_create(&path).unwrap();
        let now = Utc::now();
        for i in 0..5 {
            let mut f = form(&format!("Článek {}", i));
            f.featured = Some("on".to_string());
            if i % 2 == 0 {
                f.category = "Akce".to_string();
            }
            store.create(f.validate().unwrap(), now + TimeDelta::minutes(i)).unwrap();
        }
        assert_eq!(store.featured().len(), 3);
        assert_eq!(store.latest(2).len(), 2);
        assert_eq!(store.by_category("akce").len(), 3);
        assert_eq!(store.categories(), vec!["Akce", "Tábory"]);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_persistence() {
        let path = temp_path();
        let id;
        {
            let mut store = NewsStore::load_or_create(&path).unwrap();
            id = store.create(form("Trvalý").validate().unwrap(), Utc::now()).unwrap().id;
        }
        let store = NewsStore::load_or_create(&path).unwrap();
        assert!(store.get(&id).is_some());
        let _ = fs::remove_file(&path);
    }
}
