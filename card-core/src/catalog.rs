//! Static technology catalog.
//!
//! Selectable technologies grouped by [`Category`]. Icons are resolved from
//! this table by id; they are never persisted.

use serde::{Deserialize, Serialize};

/// Technology category on a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Programming languages.
    Languages,
    /// Frameworks and libraries.
    Frameworks,
    /// AI and machine learning tooling.
    Ai,
    /// Developer tools and platforms.
    Tools,
}

impl Category {
    /// All categories in display order.
    pub const ALL: [Category; 4] = [
        Category::Languages,
        Category::Frameworks,
        Category::Ai,
        Category::Tools,
    ];

    /// Stable lowercase key, also used as the persisted field name.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Languages => "languages",
            Self::Frameworks => "frameworks",
            Self::Ai => "ai",
            Self::Tools => "tools",
        }
    }

    /// Heading shown above the category's badges.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Languages => "Languages",
            Self::Frameworks => "Frameworks",
            Self::Ai => "AI & ML",
            Self::Tools => "Tools",
        }
    }

    /// Accent color for badges of this category.
    #[must_use]
    pub const fn accent(self) -> &'static str {
        match self {
            Self::Languages => "#60a5fa",
            Self::Frameworks => "#34d399",
            Self::Ai => "#f472b6",
            Self::Tools => "#fbbf24",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Display icon reference for a technology.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IconRef {
    /// Icon asset path, resolved by the renderer's asset resolver.
    pub src: &'static str,
    /// Brand color used for the badge dot when the icon is unavailable.
    pub color: &'static str,
}

/// A selectable technology.
///
/// Only `id`, `name` and `category` are serialized; the icon is looked up
/// from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechRef {
    /// Stable identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Category the technology belongs to.
    pub category: Category,
    /// Icon, if the technology is known to the catalog.
    #[serde(skip)]
    pub icon: Option<IconRef>,
}

impl TechRef {
    /// Build a reference for a catalog id.
    #[must_use]
    pub fn from_catalog(id: &str) -> Option<Self> {
        lookup(id).map(CatalogEntry::to_ref)
    }

    /// Re-attach the icon from the catalog.
    #[must_use]
    pub fn with_catalog_icon(mut self) -> Self {
        self.icon = lookup(&self.id).map(|e| e.icon);
        self
    }
}

/// A static catalog row.
#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry {
    /// Stable identifier.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Category.
    pub category: Category,
    /// Icon reference.
    pub icon: IconRef,
}

impl CatalogEntry {
    /// Convert into an owned [`TechRef`].
    #[must_use]
    pub fn to_ref(&self) -> TechRef {
        TechRef {
            id: self.id.to_string(),
            name: self.name.to_string(),
            category: self.category,
            icon: Some(self.icon),
        }
    }
}

macro_rules! entry {
    ($id:literal, $name:literal, $cat:ident, $color:literal) => {
        CatalogEntry {
            id: $id,
            name: $name,
            category: Category::$cat,
            icon: IconRef {
                src: concat!("icons/", $id, ".svg"),
                color: $color,
            },
        }
    };
}

/// The full catalog.
pub const CATALOG: &[CatalogEntry] = &[
    entry!("javascript", "JavaScript", Languages, "#f7df1e"),
    entry!("typescript", "TypeScript", Languages, "#3178c6"),
    entry!("python", "Python", Languages, "#3776ab"),
    entry!("rust", "Rust", Languages, "#dea584"),
    entry!("go", "Go", Languages, "#00add8"),
    entry!("java", "Java", Languages, "#ea2d2e"),
    entry!("cpp", "C++", Languages, "#00599c"),
    entry!("csharp", "C#", Languages, "#512bd4"),
    entry!("kotlin", "Kotlin", Languages, "#7f52ff"),
    entry!("swift", "Swift", Languages, "#f05138"),
    entry!("react", "React", Frameworks, "#61dafb"),
    entry!("nextjs", "Next.js", Frameworks, "#000000"),
    entry!("vue", "Vue", Frameworks, "#4fc08d"),
    entry!("angular", "Angular", Frameworks, "#dd0031"),
    entry!("svelte", "Svelte", Frameworks, "#ff3e00"),
    entry!("django", "Django", Frameworks, "#092e20"),
    entry!("express", "Express", Frameworks, "#000000"),
    entry!("tailwind", "Tailwind CSS", Frameworks, "#06b6d4"),
    entry!("axum", "Axum", Frameworks, "#dea584"),
    entry!("tensorflow", "TensorFlow", Ai, "#ff6f00"),
    entry!("pytorch", "PyTorch", Ai, "#ee4c2c"),
    entry!("openai", "OpenAI", Ai, "#412991"),
    entry!("huggingface", "Hugging Face", Ai, "#ffd21e"),
    entry!("langchain", "LangChain", Ai, "#1c3c3c"),
    entry!("scikit", "scikit-learn", Ai, "#f7931e"),
    entry!("git", "Git", Tools, "#f05032"),
    entry!("docker", "Docker", Tools, "#2496ed"),
    entry!("kubernetes", "Kubernetes", Tools, "#326ce5"),
    entry!("aws", "AWS", Tools, "#ff9900"),
    entry!("firebase", "Firebase", Tools, "#ffca28"),
    entry!("figma", "Figma", Tools, "#f24e1e"),
    entry!("postgres", "PostgreSQL", Tools, "#4169e1"),
    entry!("vscode", "VS Code", Tools, "#007acc"),
];

/// Find a catalog entry by id.
#[must_use]
pub fn lookup(id: &str) -> Option<&'static CatalogEntry> {
    CATALOG.iter().find(|e| e.id == id)
}

/// Catalog entries of one category, in catalog order.
pub fn by_category(category: Category) -> impl Iterator<Item = &'static CatalogEntry> {
    CATALOG.iter().filter(move |e| e.category == category)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_ids_unique() {
        let ids: HashSet<_> = CATALOG.iter().map(|e| e.id).collect();
        assert_eq!(ids.len(), CATALOG.len());
    }

    #[test]
    fn test_every_category_has_entries() {
        for category in Category::ALL {
            assert!(by_category(category).count() > 5, "{category} too small");
        }
    }

    #[test]
    fn test_icon_is_not_serialized() {
        let tech = TechRef::from_catalog("rust").expect("rust in catalog");
        assert!(tech.icon.is_some());

        let json = serde_json::to_value(&tech).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({"id": "rust", "name": "Rust", "category": "languages"})
        );

        let back: TechRef = serde_json::from_value(json).expect("deserialize");
        assert!(back.icon.is_none());
        assert_eq!(back.with_catalog_icon(), tech);
    }

    #[test]
    fn test_unknown_id() {
        assert!(TechRef::from_catalog("cobol-on-rails").is_none());
    }
}
