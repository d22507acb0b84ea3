//! Deterministic domain fixtures: posts numbered by a small index so
//! tests can assert reconciliation order by id.

use chrono::Utc;
use uuid::Uuid;

use domains::{FeedPage, PaginationMeta, Post, PostAuthor, PostCategory};

pub fn author(n: u128) -> PostAuthor {
    PostAuthor {
        id: Uuid::from_u128(n),
        full_name: format!("Body {n}"),
        email: format!("body{n}@example.gov"),
        profile_picture: None,
        role: "BODY".to_string(),
    }
}

pub fn post(n: u128) -> Post {
    Post {
        id: Uuid::from_u128(n),
        user_id: Uuid::from_u128(1000 + n),
        post_content: format!("post {n}"),
        post_category: PostCategory::News,
        post_tags: Vec::new(),
        is_active: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
        city_id: None,
        user: author(n),
        collaborators: Vec::new(),
        media: Vec::new(),
        reaction_count: 0,
        comment_count: 0,
    }
}

pub fn page(posts: Vec<Post>, current_page: u32, total_pages: u32) -> FeedPage {
    let total_posts = posts.len() as u64;
    FeedPage {
        posts,
        pagination: PaginationMeta {
            current_page,
            total_pages,
            total_posts,
            has_next_page: current_page < total_pages,
            has_previous_page: current_page > 1,
        },
    }
}

/// Serialized `GET /feed/` response wrapping the given page.
pub fn feed_body(page: &FeedPage) -> String {
    serde_json::json!({
        "status": "success",
        "message": "ok",
        "data": page,
    })
    .to_string()
}

/// Serialized auth response carrying a token pair, as both the login and
/// refresh endpoints return it.
pub fn tokens_body(access: &str, refresh: &str) -> String {
    serde_json::json!({
        "status": "success",
        "message": "ok",
        "data": {
            "tokens": { "accessToken": access, "refreshToken": refresh },
            "user": {},
        },
    })
    .to_string()
}

/// Post ids as small integers, in list order.
pub fn ids(posts: &[Post]) -> Vec<u128> {
    posts.iter().map(|post| post.id.as_u128()).collect()
}
