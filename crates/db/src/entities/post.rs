//! Post entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of post, used to split the public feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[sea_orm(string_value = "post")]
    Post,
    #[sea_orm(string_value = "blog")]
    Blog,
    #[sea_orm(string_value = "discussion")]
    Discussion,
}

/// Publication status. Drafts are visible to their author only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "published")]
    Published,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "post")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Author profile ID
    #[sea_orm(indexed)]
    pub author_id: String,

    pub title: String,

    /// Rich text body (HTML), stored as submitted
    #[sea_orm(column_type = "Text")]
    pub content: String,

    pub category: Category,

    pub status: Status,

    pub created_at: DateTimeWithTimeZone,

    /// Bumped on every edit; orders the author's own listing
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Whether `viewer_id` may see this post.
    #[must_use]
    pub fn is_visible_to(&self, viewer_id: Option<&str>) -> bool {
        self.status == Status::Published || viewer_id == Some(self.author_id.as_str())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::profile::Entity",
        from = "Column::AuthorId",
        to = "super::profile::Column::Id",
        on_delete = "Cascade"
    )]
    Author,

    #[sea_orm(has_many = "super::comment::Entity")]
    Comment,

    #[sea_orm(has_many = "super::reaction::Entity")]
    Reaction,
}

impl Related<super::profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comment.def()
    }
}

impl Related<super::reaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reaction.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
