use chrono::{DateTime, Utc};
use paperclip::actix::Apiv2Schema;
use serde::{Deserialize, Serialize};
use validator::Validate;

pub type BookId = i64;
pub type UserId = i64;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
#[serde(default)]
/// Struct representing a book stored in the repository.
/// `id` is assigned by the store and ignored when creating a book
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub publish_date: DateTime<Utc>,
    pub rating: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
/// Sparse update of a book. Only fields that are present are changed,
/// absent (or null) fields leave the stored column untouched
pub struct UpdateBookInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<i32>,
}

impl UpdateBookInput {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.publish_date.is_none()
            && self.rating.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
pub struct CreateBookResponse {
    pub id: BookId,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, Apiv2Schema)]
pub struct SignUpInput {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, Apiv2Schema)]
pub struct SignInInput {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
pub struct SignUpResponse {
    pub id: UserId,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
/// Signed session token returned by sign in, to be sent back as `Authorization: Bearer <token>`
pub struct TokenResponse {
    pub token: String,
}
