//! # Domain Models
//!
//! Wire-faithful representations of the civic-feed API payloads.
//! The core logic only ever keys on `Post::id`; everything else is
//! passive data carried through for the presentation layer.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Standard response envelope wrapping every API payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    /// "success" or "error"
    pub status: String,
    pub message: String,
    pub data: T,
}

/// Civic category a post is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PostCategory {
    Alert,
    News,
    Announcement,
    Discussion,
    Update,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaType {
    Image,
    Video,
}

/// Author summary embedded in posts and collaborator entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostAuthor {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub profile_picture: Option<String>,
    pub role: String,
}

/// A media attachment already uploaded and hosted by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostMedia {
    pub id: Uuid,
    pub media_url: String,
    pub media_type: MediaType,
    pub file_name: String,
    pub file_size: u64,
    pub mime_type: String,
}

/// A co-authoring body attached to a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostCollaborator {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub user: PostAuthor,
}

/// The fundamental unit of the feed. Identity is canonical by `id`;
/// reconciliation never compares any other field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub user_id: Uuid,
    pub post_content: String,
    pub post_category: PostCategory,
    #[serde(default)]
    pub post_tags: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub city_id: Option<Uuid>,
    pub user: PostAuthor,
    #[serde(default)]
    pub collaborators: Vec<PostCollaborator>,
    #[serde(default)]
    pub media: Vec<PostMedia>,
    #[serde(default)]
    pub reaction_count: u64,
    #[serde(default)]
    pub comment_count: u64,
}

/// Pagination cursor metadata returned alongside every feed page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_posts: u64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

/// One fetched slice of the feed: the `data` half of `GET /feed/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedPage {
    pub posts: Vec<Post>,
    pub pagination: PaginationMeta,
}

/// The credential pair in effect for outbound requests.
/// Both halves are secrets; only the transport adapter exposes them,
/// at header-building time.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTokens {
    pub access_token: SecretString,
    pub refresh_token: SecretString,
}

/// The `data` half of a successful login: the rotated token pair plus
/// whatever profile payload the server attaches (opaque to the core).
#[derive(Debug, Clone, Deserialize)]
pub struct SessionData {
    pub tokens: SessionTokens,
    #[serde(default)]
    pub user: serde_json::Value,
}

/// Login form input. The password never leaves `SecretString` except at
/// the moment the request body is built.
#[derive(Debug, Clone)]
pub struct LoginCredentials {
    pub email: String,
    pub password: SecretString,
}
