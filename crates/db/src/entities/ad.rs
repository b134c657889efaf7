//! Ad (classified listing) entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Moderation state of an ad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum AdStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

/// Listing categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum Category {
    #[sea_orm(string_value = "Immobilier")]
    Immobilier,
    #[sea_orm(string_value = "Véhicules")]
    Vehicules,
    #[sea_orm(string_value = "Maison & Jardin")]
    MaisonJardin,
    #[sea_orm(string_value = "Électronique")]
    Electronique,
    #[sea_orm(string_value = "Loisirs")]
    Loisirs,
    #[sea_orm(string_value = "Mode")]
    Mode,
    #[sea_orm(string_value = "Autres")]
    Autres,
}

impl Category {
    /// All categories, in display order.
    #[must_use]
    pub const fn all() -> [Self; 7] {
        [
            Self::Immobilier,
            Self::Vehicules,
            Self::MaisonJardin,
            Self::Electronique,
            Self::Loisirs,
            Self::Mode,
            Self::Autres,
        ]
    }

    /// Parse a category from its display label.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Immobilier" => Some(Self::Immobilier),
            "Véhicules" => Some(Self::Vehicules),
            "Maison & Jardin" => Some(Self::MaisonJardin),
            "Électronique" => Some(Self::Electronique),
            "Loisirs" => Some(Self::Loisirs),
            "Mode" => Some(Self::Mode),
            "Autres" => Some(Self::Autres),
            _ => None,
        }
    }

    /// The display label stored in the database.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Immobilier => "Immobilier",
            Self::Vehicules => "Véhicules",
            Self::MaisonJardin => "Maison & Jardin",
            Self::Electronique => "Électronique",
            Self::Loisirs => "Loisirs",
            Self::Mode => "Mode",
            Self::Autres => "Autres",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ad")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    /// Price in whole currency units
    pub price: i64,

    pub category: Category,

    #[sea_orm(nullable)]
    pub location: Option<String>,

    #[sea_orm(nullable)]
    pub phone: Option<String>,

    /// Public URLs of the listing images
    #[sea_orm(column_type = "JsonBinary")]
    pub image_urls: Json,

    /// Deletion handles at the image host, same arity as `image_urls`
    #[sea_orm(column_type = "JsonBinary")]
    pub image_keys: Json,

    /// Affiliate link; settable by admins only
    #[sea_orm(nullable)]
    pub affiliate_link: Option<String>,

    /// Author user ID
    #[sea_orm(indexed)]
    pub author_id: String,

    pub status: AdStatus,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// Image URLs as a string vector.
    #[must_use]
    pub fn image_url_list(&self) -> Vec<String> {
        json_string_array(&self.image_urls)
    }

    /// Image deletion handles as a string vector.
    #[must_use]
    pub fn image_key_list(&self) -> Vec<String> {
        json_string_array(&self.image_keys)
    }
}

fn json_string_array(value: &Json) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(ToString::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Author,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_labels_roundtrip() {
        for category in Category::all() {
            assert_eq!(Category::from_label(category.label()), Some(category));
        }
        assert_eq!(Category::from_label("Bateaux"), None);
    }
}
