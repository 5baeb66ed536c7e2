//! Six-step card wizard.
//!
//! Each step owns an ordered list of `(predicate, message)` rules. Validation
//! walks the list and stops at the first rule that fails.

use serde::{Deserialize, Serialize};

use crate::card::{is_hex_color, CardModel, Theme};
use crate::card::{MAX_BIO_LEN, MAX_NAME_LEN, MAX_ROLE_LEN, MAX_TECH_PER_CATEGORY};
use crate::catalog::Category;
use crate::error::ValidationError;
use crate::profanity::is_profane;

/// Wizard steps, numbered `1..=6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Step {
    /// Upload and crop a photo.
    Photo = 1,
    /// Name, role and bio.
    Identity = 2,
    /// Background theme.
    Theme = 3,
    /// Technology selection.
    TechStack = 4,
    /// Social links.
    Socials = 5,
    /// Preview, export and share.
    Preview = 6,
}

impl Step {
    /// First step.
    pub const FIRST: Step = Step::Photo;
    /// Last step.
    pub const LAST: Step = Step::Preview;

    /// Step number.
    #[must_use]
    pub const fn number(self) -> u8 {
        self as u8
    }

    /// Following step, if any.
    #[must_use]
    pub fn next(self) -> Option<Step> {
        Step::try_from(self.number() + 1).ok()
    }

    /// Preceding step, if any.
    #[must_use]
    pub fn prev(self) -> Option<Step> {
        self.number()
            .checked_sub(1)
            .and_then(|n| Step::try_from(n).ok())
    }
}

impl TryFrom<u8> for Step {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Photo),
            2 => Ok(Self::Identity),
            3 => Ok(Self::Theme),
            4 => Ok(Self::TechStack),
            5 => Ok(Self::Socials),
            6 => Ok(Self::Preview),
            other => Err(format!("step must be between 1 and 6, got {other}")),
        }
    }
}

impl From<Step> for u8 {
    fn from(step: Step) -> Self {
        step.number()
    }
}

type Rule = (fn(&CardModel) -> bool, &'static str);

const PHOTO_RULES: &[Rule] = &[(|m| m.photo.is_some(), "Please upload and crop a photo")];

const IDENTITY_RULES: &[Rule] = &[
    (|m| !m.name.trim().is_empty(), "Please enter your name"),
    (
        |m| m.name.chars().count() <= MAX_NAME_LEN,
        "Name must be 20 characters or less",
    ),
    (
        |m| m.role.chars().count() <= MAX_ROLE_LEN,
        "Role must be 30 characters or less",
    ),
    (
        |m| m.bio.chars().count() <= MAX_BIO_LEN,
        "Bio must be 100 characters or less",
    ),
    (
        |m| !is_profane(&m.name),
        "Please keep your name free of inappropriate language",
    ),
    (
        |m| !is_profane(&m.role),
        "Please keep your role free of inappropriate language",
    ),
    (
        |m| !is_profane(&m.bio),
        "Please keep your bio free of inappropriate language",
    ),
];

const THEME_RULES: &[Rule] = &[(
    |m| {
        m.theme != Theme::Custom
            || matches!(
                (&m.custom_theme_from, &m.custom_theme_to),
                (Some(from), Some(to)) if is_hex_color(from) && is_hex_color(to)
            )
    },
    "Please pick both custom gradient colors",
)];

const TECH_RULES: &[Rule] = &[
    (|m| !m.tech.is_empty(), "Please select at least one technology"),
    (
        |m| {
            Category::ALL
                .iter()
                .all(|c| m.tech.get(*c).len() <= MAX_TECH_PER_CATEGORY)
        },
        "You can select up to 5 items per category",
    ),
];

const SOCIAL_RULES: &[Rule] = &[
    (
        |m| m.socials.website.as_deref().is_none_or(is_valid_website),
        "Please enter a valid website URL",
    ),
    (
        |m| {
            [&m.socials.github, &m.socials.twitter, &m.socials.linkedin]
                .into_iter()
                .flatten()
                .all(|v| !v.trim().contains(char::is_whitespace))
        },
        "Social handles cannot contain spaces",
    ),
];

const PREVIEW_RULES: &[Rule] = &[];

fn rules(step: Step) -> &'static [Rule] {
    match step {
        Step::Photo => PHOTO_RULES,
        Step::Identity => IDENTITY_RULES,
        Step::Theme => THEME_RULES,
        Step::TechStack => TECH_RULES,
        Step::Socials => SOCIAL_RULES,
        Step::Preview => PREVIEW_RULES,
    }
}

fn is_valid_website(value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() {
        return true;
    }
    let candidate = if value.contains("://") {
        value.to_string()
    } else {
        format!("https://{value}")
    };
    url::Url::parse(&candidate)
        .is_ok_and(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some_and(|h| h.contains('.')))
}

/// Validate one step against the card.
///
/// # Errors
///
/// Returns the message of the first failing rule.
pub fn validate_step(step: Step, model: &CardModel) -> Result<(), ValidationError> {
    match rules(step).iter().find(|(passes, _)| !passes(model)) {
        Some((_, message)) => Err(ValidationError::new(*message)),
        None => Ok(()),
    }
}

/// Validate every step, e.g. before saving a card submitted in one piece.
///
/// # Errors
///
/// Returns the message of the first failing rule, in step order.
pub fn validate_card(model: &CardModel) -> Result<(), ValidationError> {
    let mut step = Some(Step::FIRST);
    while let Some(current) = step {
        validate_step(current, model)?;
        step = current.next();
    }
    Ok(())
}

/// Linear wizard over the six steps.
#[derive(Debug, Clone)]
pub struct CardWizard {
    step: Step,
    highest_reached: Step,
    error: Option<String>,
    model: CardModel,
}

impl Default for CardWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl CardWizard {
    /// Start at step 1 with an empty card.
    #[must_use]
    pub fn new() -> Self {
        Self::with_model(CardModel::new())
    }

    /// Start at step 1 with an existing card.
    #[must_use]
    pub fn with_model(model: CardModel) -> Self {
        Self {
            step: Step::FIRST,
            highest_reached: Step::FIRST,
            error: None,
            model,
        }
    }

    /// Current step.
    #[must_use]
    pub fn step(&self) -> Step {
        self.step
    }

    /// Highest step reachable by jumping.
    #[must_use]
    pub fn highest_reached(&self) -> Step {
        self.highest_reached
    }

    /// Message of the last failed transition.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The card being built.
    #[must_use]
    pub fn model(&self) -> &CardModel {
        &self.model
    }

    /// Mutable access for field edits.
    pub fn model_mut(&mut self) -> &mut CardModel {
        &mut self.model
    }

    /// A copy of the card, e.g. to hand to an export.
    #[must_use]
    pub fn snapshot(&self) -> CardModel {
        self.model.clone()
    }

    /// Advance if the current step validates.
    ///
    /// # Errors
    ///
    /// Returns the validation error; the wizard stays on the current step and
    /// remembers the message.
    pub fn next(&mut self) -> Result<Step, ValidationError> {
        if let Err(e) = validate_step(self.step, &self.model) {
            tracing::debug!(step = self.step.number(), error = %e, "Step blocked");
            self.error = Some(e.message.clone());
            return Err(e);
        }
        self.error = None;
        if let Some(next) = self.step.next() {
            self.step = next;
            self.highest_reached = self.highest_reached.max(next);
        }
        Ok(self.step)
    }

    /// Go back one step. Always allowed; clears the error.
    pub fn back(&mut self) -> Step {
        self.error = None;
        if let Some(prev) = self.step.prev() {
            self.step = prev;
        }
        self.step
    }

    /// Jump to a step that has already been reached.
    ///
    /// # Errors
    ///
    /// Returns an error for steps beyond [`CardWizard::highest_reached`].
    pub fn go_to(&mut self, step: Step) -> Result<Step, ValidationError> {
        if step > self.highest_reached {
            return Err(ValidationError::new("Please complete the current step first"));
        }
        self.error = None;
        self.step = step;
        Ok(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::CroppedPhoto;

    fn photo() -> CroppedPhoto {
        CroppedPhoto::from_data_url("data:image/jpeg;base64,AAAA").expect("photo")
    }

    fn complete_model() -> CardModel {
        let mut model = CardModel::new();
        model.photo = Some(photo());
        model.name = "Ada".into();
        model.role = "Engineer".into();
        model.add_tech_by_id("rust").expect("rust");
        model
    }

    #[test]
    fn test_step_numbers() {
        assert_eq!(Step::try_from(1), Ok(Step::Photo));
        assert!(Step::try_from(0).is_err());
        assert!(Step::try_from(7).is_err());
        assert_eq!(Step::Preview.next(), None);
        assert_eq!(Step::Photo.prev(), None);
        assert_eq!(Step::Theme.prev(), Some(Step::Identity));
    }

    #[test]
    fn test_validate_card_reports_first_failing_step() {
        assert!(validate_card(&complete_model()).is_ok());

        let mut model = complete_model();
        model.photo = None;
        model.name.clear();
        let err = validate_card(&model).expect_err("no photo");
        assert_eq!(err.message, "Please upload and crop a photo");
    }

    #[test]
    fn test_profane_name_blocks_step_two() {
        let mut model = complete_model();
        model.name = "f***".into();
        let err = validate_step(Step::Identity, &model).expect_err("profane");
        assert!(err.message.contains("inappropriate"));

        let mut wizard = CardWizard::with_model(model);
        wizard.next().expect("photo step passes");
        assert!(wizard.next().is_err());
        assert_eq!(wizard.step(), Step::Identity);
        assert!(wizard.error().is_some());
    }

    #[test]
    fn test_rules_short_circuit_in_order() {
        let mut model = complete_model();
        model.name = String::new();
        model.bio = "x".repeat(MAX_BIO_LEN + 1);
        let err = validate_step(Step::Identity, &model).expect_err("invalid");
        assert_eq!(err.message, "Please enter your name");

        model.name = "Ada".into();
        let err = validate_step(Step::Identity, &model).expect_err("invalid");
        assert_eq!(err.message, "Bio must be 100 characters or less");
    }

    #[test]
    fn test_length_counts_chars_not_bytes() {
        let mut model = complete_model();
        model.name = "é".repeat(MAX_NAME_LEN);
        assert!(validate_step(Step::Identity, &model).is_ok());
        model.name.push('é');
        assert!(validate_step(Step::Identity, &model).is_err());
    }

    #[test]
    fn test_photo_required() {
        let model = CardModel::new();
        let mut wizard = CardWizard::with_model(model);
        assert_eq!(
            wizard.next().expect_err("no photo").message,
            "Please upload and crop a photo"
        );
        assert_eq!(wizard.step(), Step::Photo);
    }

    #[test]
    fn test_custom_theme_requires_colors() {
        let mut model = complete_model();
        model.theme = Theme::Custom;
        assert!(validate_step(Step::Theme, &model).is_err());
        model.set_custom_theme("#112233", "#445566").expect("colors");
        assert!(validate_step(Step::Theme, &model).is_ok());
    }

    #[test]
    fn test_tech_required() {
        let mut model = complete_model();
        model.remove_tech(Category::Languages, "rust");
        assert!(validate_step(Step::TechStack, &model).is_err());
    }

    #[test]
    fn test_socials() {
        let mut model = complete_model();
        model.socials.website = Some("example.dev".into());
        assert!(validate_step(Step::Socials, &model).is_ok());
        model.socials.website = Some("not a url".into());
        assert!(validate_step(Step::Socials, &model).is_err());
        model.socials.website = None;
        model.socials.github = Some("octo cat".into());
        assert!(validate_step(Step::Socials, &model).is_err());
    }

    #[test]
    fn test_full_walk_and_navigation() {
        let mut wizard = CardWizard::with_model(complete_model());
        for expected in [
            Step::Identity,
            Step::Theme,
            Step::TechStack,
            Step::Socials,
            Step::Preview,
        ] {
            assert_eq!(wizard.next().expect("valid"), expected);
        }
        // Last step stays put.
        assert_eq!(wizard.next().expect("valid"), Step::Preview);

        assert_eq!(wizard.go_to(Step::Theme), Ok(Step::Theme));
        assert_eq!(wizard.go_to(Step::Preview), Ok(Step::Preview));
    }

    #[test]
    fn test_back_clears_error_and_jump_is_bounded() {
        let mut model = complete_model();
        model.name = String::new();
        let mut wizard = CardWizard::with_model(model);
        wizard.next().expect("photo ok");
        assert!(wizard.next().is_err());
        assert!(wizard.error().is_some());

        assert_eq!(wizard.back(), Step::Photo);
        assert!(wizard.error().is_none());
        assert_eq!(wizard.back(), Step::Photo);

        assert!(wizard.go_to(Step::Theme).is_err());
        assert_eq!(wizard.go_to(Step::Identity), Ok(Step::Identity));
    }

    #[test]
    fn test_step_serializes_as_number() {
        assert_eq!(serde_json::to_string(&Step::TechStack).expect("ser"), "4");
        let step: Step = serde_json::from_str("2").expect("de");
        assert_eq!(step, Step::Identity);
        assert!(serde_json::from_str::<Step>("9").is_err());
    }
}
