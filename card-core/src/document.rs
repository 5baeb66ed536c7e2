//! Persisted projection of a card.
//!
//! The stored document drops the photo bytes (only a presence marker is kept)
//! and icon references; field names follow the `cards` collection schema.

use serde::{Deserialize, Serialize};

use crate::card::{CardModel, Socials, TechSelection, Theme};
use crate::catalog::{Category, TechRef};

/// Value of the `image` field when a card image was generated.
pub const IMAGE_GENERATED: &str = "generated";

/// Serializable identity of a selected technology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTech {
    /// Catalog id.
    pub id: String,
    /// Display name at the time of saving.
    pub name: String,
    /// Category.
    pub category: Category,
}

impl From<&TechRef> for StoredTech {
    fn from(tech: &TechRef) -> Self {
        Self {
            id: tech.id.clone(),
            name: tech.name.clone(),
            category: tech.category,
        }
    }
}

/// A card as written to the `cards` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDocument {
    /// Whether the card had a photo. Never the bytes.
    pub photo: Option<bool>,
    /// Display name.
    pub name: String,
    /// Short bio.
    pub bio: String,
    /// Role.
    pub role: String,
    /// Theme.
    pub theme: Theme,
    /// Custom gradient start.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_theme_from: Option<String>,
    /// Custom gradient end.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_theme_to: Option<String>,
    /// Selected languages.
    #[serde(default)]
    pub languages: Vec<StoredTech>,
    /// Selected frameworks.
    #[serde(default)]
    pub frameworks: Vec<StoredTech>,
    /// Selected AI tooling.
    #[serde(default)]
    pub ai: Vec<StoredTech>,
    /// Selected tools.
    #[serde(default)]
    pub tools: Vec<StoredTech>,
    /// Social links.
    #[serde(default)]
    pub socials: Socials,
    /// `"generated"` when a card image was produced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Creation time, milliseconds since the Unix epoch.
    pub created_at: u64,
}

impl CardDocument {
    /// Project a card for storage.
    #[must_use]
    pub fn from_model(model: &CardModel, image_generated: bool, created_at: u64) -> Self {
        let stored = |category: Category| -> Vec<StoredTech> {
            model.tech.get(category).iter().map(StoredTech::from).collect()
        };
        Self {
            photo: Some(model.photo.is_some()),
            name: model.name.clone(),
            bio: model.bio.clone(),
            role: model.role.clone(),
            theme: model.theme,
            custom_theme_from: model.custom_theme_from.clone(),
            custom_theme_to: model.custom_theme_to.clone(),
            languages: stored(Category::Languages),
            frameworks: stored(Category::Frameworks),
            ai: stored(Category::Ai),
            tools: stored(Category::Tools),
            socials: model.socials.clone(),
            image: image_generated.then(|| IMAGE_GENERATED.to_string()),
            created_at,
        }
    }

    /// Whether the stored card had a photo.
    #[must_use]
    pub fn has_photo(&self) -> bool {
        self.photo.unwrap_or(false)
    }

    /// Stored technologies of one category.
    #[must_use]
    pub fn tech(&self, category: Category) -> &[StoredTech] {
        match category {
            Category::Languages => &self.languages,
            Category::Frameworks => &self.frameworks,
            Category::Ai => &self.ai,
            Category::Tools => &self.tools,
        }
    }

    /// Rebuild a card model for display.
    ///
    /// Icons come from the static catalog. The photo is not recoverable and
    /// is always `None`. Entries beyond the per-category limit are dropped.
    #[must_use]
    pub fn to_model(&self) -> CardModel {
        let mut model = CardModel {
            name: self.name.clone(),
            bio: self.bio.clone(),
            role: self.role.clone(),
            theme: self.theme,
            custom_theme_from: self.custom_theme_from.clone(),
            custom_theme_to: self.custom_theme_to.clone(),
            tech: TechSelection::default(),
            socials: self.socials.clone(),
            photo: None,
        };
        for category in Category::ALL {
            for stored in self.tech(category) {
                let tech = TechRef {
                    id: stored.id.clone(),
                    name: stored.name.clone(),
                    category,
                    icon: None,
                }
                .with_catalog_icon();
                if let Err(e) = model.add_tech(tech) {
                    tracing::debug!("Skipping stored technology {}: {e}", stored.id);
                }
            }
        }
        model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::CroppedPhoto;

    fn sample() -> CardModel {
        let mut model = CardModel::new();
        model.photo = CroppedPhoto::from_data_url("data:image/jpeg;base64,/9j/AAAA");
        model.name = "Grace".into();
        model.role = "Compiler whisperer".into();
        model.bio = "Ships things.".into();
        model.add_tech_by_id("rust").expect("rust");
        model.add_tech_by_id("react").expect("react");
        model.add_tech_by_id("openai").expect("openai");
        model.socials.github = Some("grace".into());
        model
    }

    #[test]
    fn test_field_names_match_collection_schema() {
        let doc = CardDocument::from_model(&sample(), true, 1_700_000_000_000);
        let json = serde_json::to_value(&doc).expect("serialize");

        assert_eq!(json["photo"], serde_json::json!(true));
        assert_eq!(json["image"], serde_json::json!("generated"));
        assert_eq!(json["createdAt"], serde_json::json!(1_700_000_000_000_u64));
        assert_eq!(json["theme"], serde_json::json!("midnight"));
        assert_eq!(
            json["languages"],
            serde_json::json!([{"id": "rust", "name": "Rust", "category": "languages"}])
        );
        assert_eq!(json["ai"][0]["id"], "openai");
        assert!(json.get("customThemeFrom").is_none());
        assert!(!json.to_string().contains("base64"));
        assert!(!json.to_string().contains("icons/"));
    }

    #[test]
    fn test_to_model_restores_icons() {
        let doc = CardDocument::from_model(&sample(), false, 1);
        let model = doc.to_model();
        assert!(model.photo.is_none());
        assert_eq!(model.name, "Grace");
        let rust = &model.tech.get(Category::Languages)[0];
        assert!(rust.icon.is_some());
        assert!(doc.image.is_none());
    }

    #[test]
    fn test_to_model_enforces_limit() {
        let mut doc = CardDocument::from_model(&CardModel::new(), false, 1);
        for i in 0..7 {
            doc.tools.push(StoredTech {
                id: format!("tool-{i}"),
                name: format!("Tool {i}"),
                category: Category::Tools,
            });
        }
        let model = doc.to_model();
        assert_eq!(model.tech.get(Category::Tools).len(), 5);
        assert!(!doc.has_photo());
    }
}
