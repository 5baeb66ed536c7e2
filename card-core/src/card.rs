//! The card model assembled by the wizard.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::catalog::{Category, TechRef};
use crate::error::{CardError, CardResult};

/// Maximum technologies per category.
pub const MAX_TECH_PER_CATEGORY: usize = 5;
/// Maximum name length in characters.
pub const MAX_NAME_LEN: usize = 20;
/// Maximum bio length in characters.
pub const MAX_BIO_LEN: usize = 100;
/// Maximum role length in characters.
pub const MAX_ROLE_LEN: usize = 30;

/// An encoded, cropped photo held as a `data:` URL.
///
/// This is the only artifact that outlives a crop session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CroppedPhoto(String);

impl CroppedPhoto {
    /// Wrap an image data URL.
    ///
    /// Returns `None` unless the string is a `data:image/...` URL.
    #[must_use]
    pub fn from_data_url(data_url: impl Into<String>) -> Option<Self> {
        let data_url = data_url.into();
        if data_url.starts_with("data:image/") && data_url.contains(',') {
            Some(Self(data_url))
        } else {
            None
        }
    }

    /// The full data URL.
    #[must_use]
    pub fn data_url(&self) -> &str {
        &self.0
    }

    /// MIME type declared by the data URL.
    #[must_use]
    pub fn mime(&self) -> &str {
        let rest = self.0.strip_prefix("data:").unwrap_or_default();
        let meta = rest.split(',').next().unwrap_or_default();
        meta.split(';').next().unwrap_or_default()
    }
}

/// Background theme of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Deep navy to violet.
    #[default]
    Midnight,
    /// Teal to blue.
    Ocean,
    /// Orange to pink.
    Sunset,
    /// Dark green to lime.
    Forest,
    /// Purple to cyan.
    Aurora,
    /// Charcoal to graphite.
    Monochrome,
    /// User supplied gradient stops.
    Custom,
}

impl Theme {
    /// Preset themes, in picker order.
    pub const PRESETS: [Theme; 6] = [
        Theme::Midnight,
        Theme::Ocean,
        Theme::Sunset,
        Theme::Forest,
        Theme::Aurora,
        Theme::Monochrome,
    ];

    /// Gradient stops of a preset. `Custom` falls back to `Midnight`.
    #[must_use]
    pub const fn preset_stops(self) -> (&'static str, &'static str) {
        match self {
            Self::Midnight | Self::Custom => ("#0f172a", "#4c1d95"),
            Self::Ocean => ("#0e7490", "#1e3a8a"),
            Self::Sunset => ("#ea580c", "#be185d"),
            Self::Forest => ("#14532d", "#4d7c0f"),
            Self::Aurora => ("#6d28d9", "#0891b2"),
            Self::Monochrome => ("#18181b", "#52525b"),
        }
    }
}

/// Optional social links shown on the card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Socials {
    /// LinkedIn profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    /// GitHub profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    /// Twitter / X handle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    /// Personal website.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

impl Socials {
    /// Non-empty entries as `(label, value)` pairs, in display order.
    #[must_use]
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        [
            ("linkedin", self.linkedin.as_deref()),
            ("github", self.github.as_deref()),
            ("twitter", self.twitter.as_deref()),
            ("website", self.website.as_deref()),
        ]
        .into_iter()
        .filter_map(|(label, value)| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| (label, v))
        })
        .collect()
    }
}

/// Selected technologies, one ordered list per category.
///
/// Deserialization goes through the same checks as [`CardModel::add_tech`],
/// so a parsed selection never exceeds the per-category limit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TechSelection(BTreeMap<Category, Vec<TechRef>>);

impl<'de> Deserialize<'de> for TechSelection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;

        let raw = BTreeMap::<Category, Vec<TechRef>>::deserialize(deserializer)?;
        let mut selection = Self::default();
        for (category, techs) in raw {
            selection.0.entry(category).or_default();
            for tech in techs {
                if tech.category != category {
                    return Err(D::Error::custom(format!(
                        "{} belongs to {}, not {category}",
                        tech.id, tech.category
                    )));
                }
                selection.push(tech).map_err(D::Error::custom)?;
            }
        }
        Ok(selection)
    }
}

impl TechSelection {
    /// Technologies selected in a category.
    #[must_use]
    pub fn get(&self, category: Category) -> &[TechRef] {
        self.0.get(&category).map_or(&[], Vec::as_slice)
    }

    /// Total number of selected technologies.
    #[must_use]
    pub fn total(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    /// Whether nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Non-empty categories with their technologies, in category order.
    pub fn groups(&self) -> impl Iterator<Item = (Category, &[TechRef])> {
        Category::ALL
            .into_iter()
            .map(|c| (c, self.get(c)))
            .filter(|(_, techs)| !techs.is_empty())
    }

    fn push(&mut self, tech: TechRef) -> CardResult<()> {
        let list = self.0.entry(tech.category).or_default();
        if list.iter().any(|t| t.id == tech.id) {
            return Err(CardError::DuplicateTech(tech.name));
        }
        if list.len() >= MAX_TECH_PER_CATEGORY {
            return Err(CardError::CategoryFull {
                category: tech.category,
                max: MAX_TECH_PER_CATEGORY,
            });
        }
        list.push(tech);
        Ok(())
    }

    fn remove(&mut self, category: Category, id: &str) -> bool {
        let Some(list) = self.0.get_mut(&category) else {
            return false;
        };
        let before = list.len();
        list.retain(|t| t.id != id);
        before != list.len()
    }
}

/// Everything the wizard collects for one card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardModel {
    /// Cropped photo, if one was confirmed.
    #[serde(default)]
    pub photo: Option<CroppedPhoto>,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Short bio.
    #[serde(default)]
    pub bio: String,
    /// Job title or role.
    #[serde(default)]
    pub role: String,
    /// Background theme.
    #[serde(default)]
    pub theme: Theme,
    /// First gradient stop for [`Theme::Custom`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_theme_from: Option<String>,
    /// Second gradient stop for [`Theme::Custom`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_theme_to: Option<String>,
    /// Selected technologies.
    #[serde(default)]
    pub tech: TechSelection,
    /// Social links.
    #[serde(default)]
    pub socials: Socials,
}

impl CardModel {
    /// Create an empty card.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a technology to its category.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::CategoryFull`] when the category already holds
    /// [`MAX_TECH_PER_CATEGORY`] entries, or [`CardError::DuplicateTech`] if
    /// it is already selected. The selection is unchanged on error.
    pub fn add_tech(&mut self, tech: TechRef) -> CardResult<()> {
        self.tech.push(tech)
    }

    /// Add a technology by catalog id.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::UnknownTech`] for ids not in the catalog, plus the
    /// errors of [`CardModel::add_tech`].
    pub fn add_tech_by_id(&mut self, id: &str) -> CardResult<()> {
        let tech = TechRef::from_catalog(id).ok_or_else(|| CardError::UnknownTech(id.into()))?;
        self.add_tech(tech)
    }

    /// Remove a technology. Returns whether anything was removed.
    pub fn remove_tech(&mut self, category: Category, id: &str) -> bool {
        self.tech.remove(category, id)
    }

    /// Switch to a custom gradient.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::InvalidColor`] if either stop is not `#rrggbb`.
    pub fn set_custom_theme(&mut self, from: &str, to: &str) -> CardResult<()> {
        for color in [from, to] {
            if !is_hex_color(color) {
                return Err(CardError::InvalidColor(color.to_string()));
            }
        }
        self.theme = Theme::Custom;
        self.custom_theme_from = Some(from.to_lowercase());
        self.custom_theme_to = Some(to.to_lowercase());
        Ok(())
    }

    /// Re-attach catalog icons to every selected technology.
    ///
    /// Icons are not serialized, so models read from JSON need this before
    /// they are rendered.
    #[must_use]
    pub fn with_catalog_icons(mut self) -> Self {
        for list in self.tech.0.values_mut() {
            *list = std::mem::take(list)
                .into_iter()
                .map(TechRef::with_catalog_icon)
                .collect();
        }
        self
    }

    /// Resolved background gradient stops.
    ///
    /// Custom stops are only used when both are valid colors.
    #[must_use]
    pub fn gradient(&self) -> (String, String) {
        if self.theme == Theme::Custom {
            if let (Some(from), Some(to)) = (&self.custom_theme_from, &self.custom_theme_to) {
                if is_hex_color(from) && is_hex_color(to) {
                    return (from.clone(), to.clone());
                }
            }
        }
        let (from, to) = self.theme.preset_stops();
        (from.to_string(), to.to_string())
    }
}

/// Check for a `#rrggbb` color.
#[must_use]
pub fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}
