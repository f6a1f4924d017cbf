//! Contact form submissions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

#[derive(Clone, Debug, Default, Deserialize, Validate)]
pub struct ContactRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[serde(default)]
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "phone is required"))]
    pub phone: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "subject is required"))]
    pub subject: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "message is required"))]
    pub message: String,
}

impl ContactRequest {
    /// Strips surrounding whitespace so blank fields fail the length checks.
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            subject: self.subject.trim().to_string(),
            message: self.message.trim().to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub subject: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl ContactMessage {
    pub fn from_request(request: ContactRequest) -> Result<Self, ValidationErrors> {
        let request = request.normalized();
        request.validate()?;
        Ok(Self {
            id: Uuid::now_v7(),
            name: request.name,
            email: request.email,
            phone: request.phone,
            subject: request.subject,
            message: request.message,
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_requires_every_field() {
        let request = ContactRequest {
            name: "Ana".into(), email: "not-an-email".into(), phone: String::new(),
            subject: "Pedido".into(), message: "Olá".into(),
        };
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("phone"));
        assert!(!fields.contains_key("name"));
    }

    #[test]
    fn test_blank_fields_are_missing() {
        let request = ContactRequest {
            name: "   ".into(), email: " ana@example.com ".into(), phone: "9999".into(),
            subject: "Pedido".into(), message: "\n\t".into(),
        };
        let errors = ContactMessage::from_request(request).unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("message"));
        assert!(!fields.contains_key("email"));

        let message = ContactMessage::from_request(ContactRequest {
            name: " Ana ".into(), email: " ana@example.com ".into(), phone: "9999".into(),
            subject: "Pedido".into(), message: "Olá ".into(),
        })
        .unwrap();
        assert_eq!(message.name, "Ana");
        assert_eq!(message.email, "ana@example.com");
        assert_eq!(message.message, "Olá");
    }
}
