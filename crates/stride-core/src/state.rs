//! Onboarding aggregate partitioned into named sections.

use crate::error::WizardError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;

/// Type-safe section key wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionKey(String);

impl SectionKey {
    /// Personal details: gender, age, name, contact email.
    pub const PERSONAL: &'static str = "personal";
    /// Objective and target weight.
    pub const GOALS: &'static str = "goals";
    /// Body measurements.
    pub const MEASUREMENTS: &'static str = "measurements";
    /// Training and diet preferences.
    pub const PREFERENCES: &'static str = "preferences";
    /// The subscription plan picked by the user.
    pub const PLAN: &'static str = "plan";
    /// The personalized plan computed during onboarding.
    pub const GENERATED_PLAN: &'static str = "generated_plan";
    /// The profile the generated plan was computed from.
    pub const PLAN_INPUTS: &'static str = "plan_inputs";

    /// Creates a new SectionKey.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SectionKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SectionKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for SectionKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for SectionKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// The data collected by a wizard session.
///
/// Every section is a JSON object. Steps write the keys they own through
/// [`merge`](Self::merge), which keeps keys the patch does not mention, so
/// two steps sharing a section never clobber each other.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use stride_core::OnboardingState;
///
/// let mut state = OnboardingState::new();
/// state.merge("measurements", json!({ "height_cm": 180 }))?;
/// state.merge("measurements", json!({ "weight_kg": 82.5 }))?;
///
/// assert_eq!(state.field("measurements", "height_cm"), Some(&json!(180)));
/// assert_eq!(state.field("measurements", "weight_kg"), Some(&json!(82.5)));
/// # Ok::<(), stride_core::WizardError>(())
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct OnboardingState {
    #[serde(flatten)]
    sections: BTreeMap<SectionKey, Map<String, Value>>,
    #[serde(skip, default = "Instant::now")]
    started_at: Instant,
}

impl fmt::Debug for OnboardingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnboardingState")
            .field("sections", &self.sections.keys().collect::<Vec<_>>())
            .field("started_at", &self.started_at)
            .finish()
    }
}

impl Default for OnboardingState {
    fn default() -> Self {
        Self::new()
    }
}

impl OnboardingState {
    /// Creates an empty state.
    pub fn new() -> Self {
        Self {
            sections: BTreeMap::new(),
            started_at: Instant::now(),
        }
    }

    /// Merges `partial` into the section named `key`.
    ///
    /// Top-level keys of `partial` overwrite, all others are kept. A missing
    /// section is created. Returns [`WizardError::InvalidPatch`] without
    /// touching the state when `partial` is not an object.
    pub fn merge(&mut self, key: impl Into<SectionKey>, partial: Value) -> Result<(), WizardError> {
        let key = key.into();
        let partial = match partial {
            Value::Object(map) => map,
            other => {
                return Err(WizardError::InvalidPatch {
                    details: format!("expected object, got {}", kind_of(&other)),
                    section: key,
                })
            }
        };
        let section = self.sections.entry(key).or_default();
        for (field, value) in partial {
            section.insert(field, value);
        }
        Ok(())
    }

    /// Serializes `partial` and merges it into the section named `key`.
    pub fn merge_typed<T: Serialize>(
        &mut self,
        key: impl Into<SectionKey>,
        partial: &T,
    ) -> Result<(), WizardError> {
        let key = key.into();
        let value = serde_json::to_value(partial).map_err(|e| WizardError::InvalidPatch {
            section: key.clone(),
            details: e.to_string(),
        })?;
        self.merge(key, value)
    }

    /// Replaces the section named `key` with the serialized `value`.
    pub fn insert<T: Serialize>(
        &mut self,
        key: impl Into<SectionKey>,
        value: &T,
    ) -> Result<(), WizardError> {
        let key = key.into();
        match serde_json::to_value(value) {
            Ok(Value::Object(map)) => {
                self.sections.insert(key, map);
                Ok(())
            }
            Ok(other) => Err(WizardError::InvalidPatch {
                details: format!("expected object, got {}", kind_of(&other)),
                section: key,
            }),
            Err(e) => Err(WizardError::InvalidPatch {
                section: key,
                details: e.to_string(),
            }),
        }
    }

    /// Returns the section named `key` deserialized into `T`.
    ///
    /// Returns `None` if the section doesn't exist or doesn't fit `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.sections
            .get(key)
            .and_then(|map| serde_json::from_value(Value::Object(map.clone())).ok())
    }

    /// Returns the raw section named `key`.
    pub fn section(&self, key: &str) -> Option<&Map<String, Value>> {
        self.sections.get(key)
    }

    /// Returns a single field of a section, treating JSON `null` as absent.
    pub fn field(&self, key: &str, field: &str) -> Option<&Value> {
        self.sections
            .get(key)
            .and_then(|map| map.get(field))
            .filter(|v| !v.is_null())
    }

    /// Returns a single field of a section deserialized into `T`.
    ///
    /// Unlike [`get`](Self::get), a malformed sibling field does not hide
    /// this one.
    pub fn field_as<T: DeserializeOwned>(&self, key: &str, field: &str) -> Option<T> {
        self.field(key, field)
            .and_then(|value| T::deserialize(value).ok())
    }

    /// Removes a section and returns it.
    pub fn remove(&mut self, key: &str) -> Option<Map<String, Value>> {
        self.sections.remove(key)
    }

    /// Returns `true` if the state contains the section.
    pub fn contains_key(&self, key: &str) -> bool {
        self.sections.contains_key(key)
    }

    /// Returns an iterator over all section keys, in order.
    pub fn keys(&self) -> impl Iterator<Item = &SectionKey> {
        self.sections.keys()
    }

    /// Returns the number of sections.
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Returns `true` if no section has been written.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Removes all sections.
    pub fn clear(&mut self) {
        self.sections.clear();
    }

    /// Returns a copy of the aggregate for handoff to a collaborator.
    pub fn snapshot(&self) -> OnboardingState {
        self.clone()
    }

    /// Returns the time elapsed since the session started.
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
