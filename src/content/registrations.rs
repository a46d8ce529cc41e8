use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::events::FormType;
use super::validation::{is_checked, is_valid_email, is_valid_phone, optional, FieldErrors};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampDetails {
    pub birth_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub zip_code: Option<String>,
    pub parent_name: Option<String>,
    pub parent_phone: Option<String>,
    pub parent_email: Option<String>,
    pub agree_to_newsletter: bool,
    pub agree_to_photos: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub id: String,
    pub event_id: String,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: Option<String>,
    /// Present for camp sign-ups only.
    pub camp: Option<CampDetails>,
    pub created_at: DateTime<Utc>,
}

impl Registration {
    pub fn kind(&self) -> FormType {
        if self.camp.is_some() {
            FormType::Camp
        } else {
            FormType::Event
        }
    }
}

/// Public sign-up form. Camp events use the extra participant and parent
/// fields; plain events only the contact fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegistrationForm {
    pub full_name: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
    pub birth_date: String,
    pub address: String,
    pub city: String,
    pub zip_code: String,
    pub parent_name: String,
    pub parent_phone: String,
    pub parent_email: String,
    pub agree_to_terms: Option<String>,
    pub agree_to_newsletter: Option<String>,
    pub agree_to_photos: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationInput {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: Option<String>,
    pub camp: Option<CampDetails>,
}

impl RegistrationForm {
    pub fn validate(&self, form_type: FormType) -> Result<RegistrationInput, FieldErrors> {
        let mut errors = FieldErrors::default();

        let full_name = match form_type {
            FormType::Event => {
                errors.check_len(
                    "full_name",
                    &self.full_name,
                    1,
                    "Jméno je povinné",
                    Some((100, "Jméno je příliš dlouhé")),
                );
                self.full_name.trim().to_string()
            }
            FormType::Camp => {
                errors.check_len(
                    "first_name",
                    &self.first_name,
                    1,
                    "Jméno je povinné",
                    Some((50, "Jméno je příliš dlouhé")),
                );
                errors.check_len(
                    "last_name",
                    &self.last_name,
                    1,
                    "Příjmení je povinné",
                    Some((50, "Příjmení je příliš dlouhé")),
                );
                format!("{} {}", self.first_name.trim(), self.last_name.trim())
            }
        };

        let email = self.email.trim();
        if !is_valid_email(email) {
            errors.push("email", "Neplatný email");
        } else if email.chars().count() > 100 {
            errors.push("email", "Email je příliš dlouhý");
        }

        let phone = optional(&self.phone);
        if phone.as_deref().is_some_and(|p| !is_valid_phone(p)) {
            errors.push("phone", "Neplatné telefonní číslo");
        }
        errors.check_len("message", &self.message, 0, "", Some((500, "Zpráva je příliš dlouhá")));

        let camp = match form_type {
            FormType::Event => None,
            FormType::Camp => Some(self.camp_details(&mut errors)),
        };

        errors.into_result(RegistrationInput {
            full_name,
            email: email.to_string(),
            phone,
            message: optional(&self.message),
            camp,
        })
    }

    fn camp_details(&self, errors: &mut FieldErrors) -> CampDetails {
        let birth_date = optional(&self.birth_date).and_then(|d| {
            let parsed = NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok();
            if parsed.is_none() {
                errors.push("birth_date", "Neplatné datum narození");
            }
            parsed
        });

        let parent_phone = optional(&self.parent_phone);
        if parent_phone.as_deref().is_some_and(|p| !is_valid_phone(p)) {
            errors.push("parent_phone", "Neplatné telefonní číslo rodiče");
        }
        let parent_email = optional(&self.parent_email);
        if parent_email.as_deref().is_some_and(|e| !is_valid_email(e)) {
            errors.push("parent_email", "Neplatný email rodiče");
        }
        if !is_checked(&self.agree_to_terms) {
            errors.push("agree_to_terms", "Je nutné souhlasit s podmínkami");
        }

        CampDetails {
            birth_date,
            address: optional(&self.address),
            city: optional(&self.city),
            zip_code: optional(&self.zip_code),
            parent_name: optional(&self.parent_name),
            parent_phone,
            parent_email,
            agree_to_newsletter: is_checked(&self.agree_to_newsletter),
            agree_to_photos: is_checked(&self.agree_to_photos),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_form() -> RegistrationForm {
        RegistrationForm {
            full_name: "Jana Nováková".to_string(),
            email: "jana@example.org".to_string(),
            phone: "+420 777 123 456".to_string(),
            ..Default::default()
        }
    }

    fn camp_form() -> RegistrationForm {
        RegistrationForm {
            first_name: "Petr".to_string(),
            last_name: "Malý".to_string(),
            email: "rodic@example.org".to_string(),
            birth_date: "2014-05-02".to_string(),
            parent_name: "Eva Malá".to_string(),
            parent_phone: "777 123 456".to_string(),
            agree_to_terms: Some("on".to_string()),
            agree_to_photos: Some("on".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_event_registration() {
        let input = event_form().validate(FormType::Event).unwrap();
        assert_eq!(input.full_name, "Jana Nováková");
        assert_eq!(input.phone.as_deref(), Some("+420 777 123 456"));
        assert!(input.message.is_none());
        assert!(input.camp.is_none());
    }

    #[test]
    fn test_event_registration_errors() {
        let mut form = event_form();
        form.full_name = " ".to_string();
        form.email = "jana".to_string();
        form.phone = "123".to_string();
        form.message = "x".repeat(501);
        let errors = form.validate(FormType::Event).unwrap_err();
        for field in ["full_name", "email", "phone", "message"] {
            assert!(errors.has(field), "missing error for {}", field);
        }
        assert_eq!(errors.0[0].message, "Jméno je povinné");
    }

    #[test]
    fn test_camp_registration() {
        let input = camp_form().validate(FormType::Camp).unwrap();
        assert_eq!(input.full_name, "Petr Malý");
        let camp = input.camp.unwrap();
        assert_eq!(camp.birth_date, NaiveDate::from_ymd_opt(2014, 5, 2));
        assert!(camp.agree_to_photos);
        assert!(!camp.agree_to_newsletter);
    }

    #[test]
    fn test_camp_requires_terms_and_names() {
        let mut form = camp_form();
        form.agree_to_terms = None;
        form.last_name = String::new();
        form.birth_date = "2.5.2014".to_string();
        let errors = form.validate(FormType::Camp).unwrap_err();
        assert!(errors.has("agree_to_terms"));
        assert!(errors.has("last_name"));
        assert!(errors.has("birth_date"));

        // A plain event ignores the camp-only fields
        let mut form = camp_form();
        form.full_name = "Petr Malý".to_string();
        form.agree_to_terms = None;
        assert!(form.validate(FormType::Event).is_ok());
    }
}
