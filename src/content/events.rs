use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::registrations::{Registration, RegistrationInput};
use super::slug::{slugify, unique_slug};
use super::validation::{is_checked, optional, optional_url, split_list, FieldErrors};
use crate::persist::{load_json, save_json};

pub const EVENT_CATEGORIES: [&str; 4] = ["workshop", "tábor", "kurz", "událost"];
const MAX_CAPACITY: i64 = 1000;
const MAX_PRICE: i64 = 100_000;
const FEATURED_LIMIT: usize = 3;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";

/// Which sign-up form an event uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormType {
    #[default]
    Event,
    Camp,
}

impl FormType {
    fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "" | "event" => Some(FormType::Event),
            "camp" => Some(FormType::Camp),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FormType::Event => "event",
            FormType::Camp => "camp",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgendaItem {
    pub time: String,
    pub activity: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub long_description: Option<String>,
    pub date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub location: String,
    pub address: Option<String>,
    pub capacity: u32,
    pub registered: u32,
    /// Whole CZK; 0 means free.
    pub price: u32,
    pub category: String,
    pub organizer: Option<String>,
    pub image_url: Option<String>,
    pub form_type: FormType,
    pub requirements: Vec<String>,
    pub tags: Vec<String>,
    pub agenda: Vec<AgendaItem>,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn spots_left(&self) -> u32 {
        self.capacity.saturating_sub(self.registered)
    }

    pub fn is_full(&self) -> bool {
        self.registered >= self.capacity
    }

    pub fn is_upcoming(&self, today: NaiveDate) -> bool {
        self.end_date.unwrap_or(self.date) >= today
    }

    pub fn is_camp(&self) -> bool {
        self.form_type == FormType::Camp
    }
}

/// Raw admin form submission.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EventForm {
    pub title: String,
    pub description: String,
    pub long_description: String,
    pub date: String,
    pub end_date: String,
    pub time: String,
    pub end_time: String,
    pub location: String,
    pub address: String,
    pub capacity: String,
    pub price: String,
    pub category: String,
    pub organizer: String,
    pub image_url: String,
    pub form_type: String,
    /// One requirement per line.
    pub requirements: String,
    pub tags: String,
    /// One `time - activity` entry per line.
    pub agenda: String,
    pub featured: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventInput {
    pub title: String,
    pub description: String,
    pub long_description: Option<String>,
    pub date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub location: String,
    pub address: Option<String>,
    pub capacity: u32,
    pub price: u32,
    pub category: String,
    pub organizer: Option<String>,
    pub image_url: Option<String>,
    pub form_type: FormType,
    pub requirements: Vec<String>,
    pub tags: Vec<String>,
    pub agenda: Vec<AgendaItem>,
    pub featured: bool,
}

fn format_time(time: Option<NaiveTime>) -> String {
    time.map(|t| t.format(TIME_FORMAT).to_string())
        .unwrap_or_default()
}

fn parse_time(errors: &mut FieldErrors, field: &'static str, value: &str) -> Option<NaiveTime> {
    let value = optional(value)?;
    let parsed = NaiveTime::parse_from_str(&value, TIME_FORMAT).ok();
    if parsed.is_none() {
        errors.push(field, "Neplatný čas");
    }
    parsed
}

fn parse_agenda(text: &str) -> Vec<AgendaItem> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| match line.split_once(" - ") {
            Some((time, activity)) if !activity.trim().is_empty() => AgendaItem {
                time: time.trim().to_string(),
                activity: activity.trim().to_string(),
            },
            _ => AgendaItem {
                time: String::new(),
                activity: line.to_string(),
            },
        })
        .collect()
}

impl EventForm {
    pub fn from_event(event: &Event) -> Self {
        EventForm {
            title: event.title.clone(),
            description: event.description.clone(),
            long_description: event.long_description.clone().unwrap_or_default(),
            date: event.date.format(DATE_FORMAT).to_string(),
            end_date: event
                .end_date
                .map(|d| d.format(DATE_FORMAT).to_string())
                .unwrap_or_default(),
            time: format_time(event.time),
            end_time: format_time(event.end_time),
            location: event.location.clone(),
            address: event.address.clone().unwrap_or_default(),
            capacity: event.capacity.to_string(),
            price: event.price.to_string(),
            category: event.category.clone(),
            organizer: event.organizer.clone().unwrap_or_default(),
            image_url: event.image_url.clone().unwrap_or_default(),
            form_type: event.form_type.as_str().to_string(),
            requirements: event.requirements.join("\n"),
            tags: event.tags.join(", "),
            agenda: event
                .agenda
                .iter()
                .map(|item| {
                    if item.time.is_empty() {
                        item.activity.clone()
                    } else {
                        format!("{} - {}", item.time, item.activity)
                    }
                })
                .collect::<Vec<_>>()
                .join("\n"),
            featured: event.featured.then(|| "on".to_string()),
        }
    }

    pub fn is_featured(&self) -> bool {
        is_checked(&self.featured)
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.category.trim().to_lowercase() == category
    }

    pub fn validate(&self) -> Result<EventInput, FieldErrors> {
        let mut errors = FieldErrors::default();
        errors.check_len("title", &self.title, 1, "Název je povinný", Some((200, "Název je příliš dlouhý")));
        errors.check_len(
            "description",
            &self.description,
            10,
            "Popis musí mít alespoň 10 znaků",
            Some((1000, "Popis je příliš dlouhý")),
        );
        errors.check_len("location", &self.location, 1, "Místo je povinné", Some((200, "Místo je příliš dlouhé")));
        errors.check_len(
            "organizer",
            &self.organizer,
            0,
            "",
            Some((100, "Jméno organizátora je příliš dlouhé")),
        );

        let date = NaiveDate::parse_from_str(self.date.trim(), DATE_FORMAT).ok();
        if date.is_none() {
            errors.push("date", "Neplatné datum");
        }
        let end_date = optional(&self.end_date).and_then(|d| {
            let parsed = NaiveDate::parse_from_str(&d, DATE_FORMAT).ok();
            if parsed.is_none() {
                errors.push("end_date", "Neplatné datum konce");
            }
            parsed
        });
        if let (Some(start), Some(end)) = (date, end_date) {
            if end < start {
                errors.push("end_date", "Konec nemůže být před začátkem");
            }
        }
        let time = parse_time(&mut errors, "time", &self.time);
        let end_time = parse_time(&mut errors, "end_time", &self.end_time);

        let capacity = match self.capacity.trim().parse::<i64>() {
            Ok(c) if c > MAX_CAPACITY => {
                errors.push("capacity", "Kapacita je příliš velká");
                0
            }
            Ok(c) if c >= 1 => c as u32,
            _ => {
                errors.push("capacity", "Kapacita musí být alespoň 1");
                0
            }
        };

        let price = match optional(&self.price).map(|p| p.parse::<i64>()) {
            None => 0,
            Some(Ok(p)) if p < 0 => {
                errors.push("price", "Cena nemůže být záporná");
                0
            }
            Some(Ok(p)) if p > MAX_PRICE => {
                errors.push("price", "Cena je příliš vysoká");
                0
            }
            Some(Ok(p)) => p as u32,
            Some(Err(_)) => {
                errors.push("price", "Neplatná cena");
                0
            }
        };

        let category = self.category.trim().to_lowercase();
        if !EVENT_CATEGORIES.contains(&category.as_str()) {
            errors.push("category", "Neplatná kategorie");
        }

        let form_type = FormType::parse(&self.form_type).unwrap_or_else(|| {
            errors.push("form_type", "Neplatný typ formuláře");
            FormType::Event
        });
        let image_url = optional_url(&mut errors, "image_url", &self.image_url, "Neplatná URL obrázku");

        let Some(date) = date else {
            return Err(errors);
        };
        errors.into_result(EventInput {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            long_description: optional(&self.long_description),
            date,
            end_date,
            time,
            end_time,
            location: self.location.trim().to_string(),
            address: optional(&self.address),
            capacity,
            price,
            category,
            organizer: optional(&self.organizer),
            image_url,
            form_type,
            requirements: split_list(&self.requirements, '\n'),
            tags: split_list(&self.tags, ','),
            agenda: parse_agenda(&self.agenda),
            featured: self.is_featured(),
        })
    }
}

/// Result of a sign-up attempt.
#[derive(Debug)]
pub enum Signup {
    Registered(Registration),
    Full,
    Closed,
    NotFound,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct EventsFile {
    events: Vec<Event>,
    registrations: Vec<Registration>,
}

/// Events and their registrations, persisted together so a sign-up and the
/// seat count it takes are written in one step.
pub struct EventStore {
    file_path: PathBuf,
    events: Vec<Event>,
    registrations: Vec<Registration>,
}

impl EventStore {
    pub fn load_or_create(path: &Path) -> anyhow::Result<Self> {
        let file: EventsFile = load_json(path)?;
        let mut store = EventStore {
            file_path: path.to_path_buf(),
            events: file.events,
            registrations: file.registrations,
        };
        store.sort();
        Ok(store)
    }

    fn save(&self) -> anyhow::Result<()> {
        let file = EventsFile {
            events: self.events.clone(),
            registrations: self.registrations.clone(),
        };
        save_json(&self.file_path, &file)
    }

    // Latest date first
    fn sort(&mut self) {
        self.events.sort_by(|a, b| b.date.cmp(&a.date).then(b.time.cmp(&a.time)));
    }

    pub fn list(&self) -> &[Event] {
        &self.events
    }

    /// Events that have not ended yet, soonest first.
    pub fn upcoming(&self, today: NaiveDate, limit: usize) -> Vec<Event> {
        let mut upcoming: Vec<Event> = self
            .events
            .iter()
            .filter(|e| e.is_upcoming(today))
            .cloned()
            .collect();
        upcoming.sort_by(|a, b| a.date.cmp(&b.date).then(a.time.cmp(&b.time)));
        upcoming.truncate(limit);
        upcoming
    }

    pub fn past(&self, today: NaiveDate) -> Vec<Event> {
        self.events
            .iter()
            .filter(|e| !e.is_upcoming(today))
            .cloned()
            .collect()
    }

    pub fn featured(&self, today: NaiveDate) -> Vec<Event> {
        self.upcoming(today, usize::MAX)
            .into_iter()
            .filter(|e| e.featured)
            .take(FEATURED_LIMIT)
            .collect()
    }

    pub fn get_by_slug(&self, slug: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.slug == slug)
    }

    pub fn get(&self, id: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.id == id)
    }

    pub fn create(&mut self, input: EventInput, now: DateTime<Utc>) -> anyhow::Result<Event> {
        let slug = unique_slug(&slugify(&input.title), "udalost", |s| {
            self.events.iter().any(|e| e.slug == s)
        });

        let event = Event {
            id: uuid::Uuid::new_v4().to_string(),
            slug,
            title: input.title,
            description: input.description,
            long_description: input.long_description,
            date: input.date,
            end_date: input.end_date,
            time: input.time,
            end_time: input.end_time,
            location: input.location,
            address: input.address,
            capacity: input.capacity,
            registered: 0,
            price: input.price,
            category: input.category,
            organizer: input.organizer,
            image_url: input.image_url,
            form_type: input.form_type,
            requirements: input.requirements,
            tags: input.tags,
            agenda: input.agenda,
            featured: input.featured,
            created_at: now,
            updated_at: now,
        };
        self.events.push(event.clone());
        self.sort();
        self.save()?;
        Ok(event)
    }

    /// Replaces the editable fields; slug and registration count are kept.
    pub fn update(
        &mut self,
        id: &str,
        input: EventInput,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Option<Event>> {
        let Some(event) = self.events.iter_mut().find(|e| e.id == id) else {
            return Ok(None);
        };

        event.title = input.title;
        event.description = input.description;
        event.long_description = input.long_description;
        event.date = input.date;
        event.end_date = input.end_date;
        event.time = input.time;
        event.end_time = input.end_time;
        event.location = input.location;
        event.address = input.address;
        event.capacity = input.capacity;
        event.price = input.price;
        event.category = input.category;
        event.organizer = input.organizer;
        event.image_url = input.image_url;
        event.form_type = input.form_type;
        event.requirements = input.requirements;
        event.tags = input.tags;
        event.agenda = input.agenda;
        event.featured = input.featured;
        event.updated_at = now;

        let updated = event.clone();
        self.sort();
        self.save()?;
        Ok(Some(updated))
    }

    /// Deletes the event together with its registrations.
    pub fn delete(&mut self, id: &str) -> anyhow::Result<bool> {
        let before = self.events.len();
        self.events.retain(|e| e.id != id);
        if self.events.len() == before {
            return Ok(false);
        }
        self.registrations.retain(|r| r.event_id != id);
        self.save()?;
        Ok(true)
    }

    /// Newest first.
    pub fn registrations_for(&self, event_id: &str) -> Vec<Registration> {
        let mut registrations: Vec<Registration> = self
            .registrations
            .iter()
            .filter(|r| r.event_id == event_id)
            .cloned()
            .collect();
        registrations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        registrations
    }

    /// Records a sign-up and takes one seat, unless the event is full or has
    /// already ended.
    pub fn register(
        &mut self,
        event_id: &str,
        input: RegistrationInput,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Signup> {
        let Some(event) = self.events.iter_mut().find(|e| e.id == event_id) else {
            return Ok(Signup::NotFound);
        };
        if !event.is_upcoming(now.date_naive()) {
            return Ok(Signup::Closed);
        }
        if event.is_full() {
            return Ok(Signup::Full);
        }
        event.registered += 1;

        let registration = Registration {
            id: uuid::Uuid::new_v4().to_string(),
            event_id: event_id.to_string(),
            full_name: input.full_name,
            email: input.email,
            phone: input.phone,
            message: input.message,
            camp: input.camp,
            created_at: now,
        };
        self.registrations.push(registration.clone());
        self.save()?;
        Ok(Signup::Registered(registration))
    }
}
