//! Data Transfer Objects - request/response types for the API.
//!
//! Request bodies are flat objects. Responses wrap the resource under its
//! name (`user`, `profile`, `article`, ...) with an optional `message`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use conduit_core::domain::{ArticleView, CommentView, Identity, Listing, Profile};

/// Request to register a new user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterUserRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Request to login. `username` also accepts an email address.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default, alias = "email")]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Partial update of the current user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub password: Option<String>,
}

/// The current user's own record. Tokens travel in cookies only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub name: String,
    pub email: String,
    pub bio: String,
    pub image: String,
}

impl From<&Identity> for UserResponse {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id,
            username: identity.handle.clone(),
            name: identity.name.clone(),
            email: identity.contact.clone(),
            bio: identity.bio.clone(),
            image: identity.image.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEnvelope {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub user: UserResponse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub username: String,
    pub name: String,
    pub bio: String,
    pub image: String,
    pub following: bool,
}

impl From<Profile> for ProfileResponse {
    fn from(profile: Profile) -> Self {
        Self {
            username: profile.handle,
            name: profile.name,
            bio: profile.bio,
            image: profile.image,
            following: profile.following,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileEnvelope {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub profile: ProfileResponse,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateArticleRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub tag_list: Vec<String>,
}

/// Article edit. The slug is kept unless `reslug` is true.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateArticleRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub body: Option<String>,
    pub tag_list: Option<Vec<String>>,
    #[serde(default)]
    pub reslug: bool,
}

/// Query string of `GET /api/articles`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListArticlesQuery {
    pub tag: Option<String>,
    pub author: Option<String>,
    pub favorited: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Query string of `GET /api/articles/feed`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageQuery {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleResponse {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub body: String,
    pub tag_list: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub favorited: bool,
    pub favorites_count: u64,
    pub author: ProfileResponse,
}

impl From<ArticleView> for ArticleResponse {
    fn from(view: ArticleView) -> Self {
        let article = view.article;
        Self {
            slug: article.slug,
            title: article.title,
            description: article.description,
            body: article.body,
            tag_list: article.tag_list,
            created_at: article.created_at,
            updated_at: article.updated_at,
            favorited: view.favorited,
            favorites_count: article.favorites_count,
            author: view.author.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleEnvelope {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub article: ArticleResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticlesEnvelope {
    pub articles: Vec<ArticleResponse>,
    pub articles_count: u64,
}

impl From<Listing<ArticleView>> for ArticlesEnvelope {
    fn from(listing: Listing<ArticleView>) -> Self {
        Self {
            articles: listing.items.into_iter().map(Into::into).collect(),
            articles_count: listing.total,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateCommentRequest {
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author: ProfileResponse,
}

impl From<CommentView> for CommentResponse {
    fn from(view: CommentView) -> Self {
        Self {
            id: view.comment.id,
            body: view.comment.body,
            created_at: view.comment.created_at,
            updated_at: view.comment.updated_at,
            author: view.author.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentEnvelope {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub comment: CommentResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentsEnvelope {
    pub comments: Vec<CommentResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagsEnvelope {
    pub tags: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_core::domain::Article;

    #[test]
    fn test_article_response_uses_camel_case() {
        let author = Identity::new("alice", "alice@example.com", "Alice".into(), "h".into());
        let article = Article::new(
            author.id,
            "hello-world-000001".into(),
            "Hello World".into(),
            "d".into(),
            "b".into(),
            vec!["rust".into()],
        );
        let view = ArticleView {
            article,
            author: author.profile(false),
            favorited: true,
        };

        let json = serde_json::to_value(ArticleResponse::from(view)).unwrap();

        assert_eq!(json["tagList"][0], "rust");
        assert_eq!(json["favoritesCount"], 0);
        assert_eq!(json["favorited"], true);
        assert_eq!(json["author"]["username"], "alice");
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn test_login_accepts_email_field() {
        let request: LoginRequest =
            serde_json::from_str(r#"{"email":"alice@example.com","password":"pw"}"#).unwrap();
        assert_eq!(request.username, "alice@example.com");
    }

    #[test]
    fn test_user_response_never_carries_password_hash() {
        let identity = Identity::new("bob", "bob@example.com", "Bob".into(), "secret-hash".into());
        let json = serde_json::to_string(&UserEnvelope {
            message: None,
            user: UserResponse::from(&identity),
        })
        .unwrap();

        assert!(!json.contains("secret-hash"));
        assert!(!json.contains("message"));
    }
}
