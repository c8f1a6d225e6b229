//! Article entity for SeaORM.

use sea_orm::entity::prelude::*;
use sea_orm::{NotSet, Set};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "articles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub slug: String,
    pub title: String,
    pub description: String,
    #[sea_orm(column_type = "Text")]
    pub body: String,
    pub tag_list: Vec<String>,
    pub author_id: Uuid,
    pub favorites_count: i64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Author,
    #[sea_orm(has_many = "super::comment::Entity")]
    Comment,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for conduit_core::domain::Article {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            slug: model.slug,
            title: model.title,
            description: model.description,
            body: model.body,
            tag_list: model.tag_list,
            author_id: model.author_id,
            favorites_count: u64::try_from(model.favorites_count).unwrap_or(0),
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

/// `favorites_count` is left unset: inserts take the column default and
/// updates never touch the counter.
impl From<conduit_core::domain::Article> for ActiveModel {
    fn from(article: conduit_core::domain::Article) -> Self {
        Self {
            id: Set(article.id),
            slug: Set(article.slug),
            title: Set(article.title),
            description: Set(article.description),
            body: Set(article.body),
            tag_list: Set(article.tag_list),
            author_id: Set(article.author_id),
            favorites_count: NotSet,
            created_at: Set(article.created_at.into()),
            updated_at: Set(article.updated_at.into()),
        }
    }
}
