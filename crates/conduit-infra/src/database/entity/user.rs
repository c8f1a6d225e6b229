//! Identity entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub handle: String,
    #[sea_orm(unique)]
    pub contact: String,
    pub name: String,
    pub password_hash: String,
    #[sea_orm(column_type = "Text")]
    pub bio: String,
    pub image: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::article::Entity")]
    Article,
}

impl Related<super::article::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Article.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for conduit_core::domain::Identity {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            handle: model.handle,
            contact: model.contact,
            name: model.name,
            password_hash: model.password_hash,
            bio: model.bio,
            image: model.image,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

impl From<conduit_core::domain::Identity> for ActiveModel {
    fn from(identity: conduit_core::domain::Identity) -> Self {
        Self {
            id: Set(identity.id),
            handle: Set(identity.handle),
            contact: Set(identity.contact),
            name: Set(identity.name),
            password_hash: Set(identity.password_hash),
            bio: Set(identity.bio),
            image: Set(identity.image),
            created_at: Set(identity.created_at.into()),
            updated_at: Set(identity.updated_at.into()),
        }
    }
}
