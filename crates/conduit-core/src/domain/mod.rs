//! Domain entities - the core business objects.

mod article;
mod comment;
mod identity;
mod session;
pub mod slug;

pub use article::{Article, ArticleFilter, ArticleView, Listing, Page, normalize_tags};
pub use comment::{Comment, CommentView};
pub use identity::{
    DEFAULT_AVATAR, Identity, Profile, is_valid_contact, mask_contact, normalize_contact,
    normalize_handle,
};
pub use session::{Caller, CredentialPair, Session, TokenClaims, TokenScope, Viewer};
pub use slug::SlugAllocator;
