//! Wire types exchanged with the reasoning service.
//!
//! Responses are decoded leniently: `null` for any optional field becomes its
//! empty default, a single string is accepted where a list is expected,
//! `age` may arrive as a number, and `relations` is accepted as an alias of
//! `relationships`. Anything structurally wrong fails to decode and is
//! reported as a malformed response.

use serde::{Deserialize, Deserializer, Serialize, de::Error as _};
use serde_with::{DefaultOnNull, OneOrMany, formats::PreferMany, serde_as};
use validator::Validate;

use crate::models::{Mention, Profile};

#[derive(Debug, Serialize)]
pub struct OracleRequest<'a, T: Serialize> {
    pub model: &'a str,
    pub temperature: f32,
    #[serde(flatten)]
    pub payload: T,
}

#[derive(Debug, Serialize)]
pub struct DetectRequest<'a> {
    pub text: &'a str,
}

#[derive(Debug, Serialize)]
pub struct SummarizeRequest<'a> {
    pub text: &'a str,
    pub names: &'a [String],
}

#[derive(Debug, Serialize)]
pub struct MergeRequest<'a> {
    pub text: &'a str,
    pub profiles: &'a [ProfilePayload],
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterPayload {
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub name: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub hint: String,
}

impl From<CharacterPayload> for Mention {
    fn from(c: CharacterPayload) -> Self {
        Mention::new(c.name, c.hint)
    }
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectResponse {
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub characters: Vec<CharacterPayload>,
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct SummaryResponse {
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    #[validate(length(min = 1))]
    pub summary: String,
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ProfilePayload {
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    #[validate(length(min = 1))]
    pub id: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub name: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub hint: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub age: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub role: String,
    #[serde_as(deserialize_as = "DefaultOnNull<OneOrMany<_, PreferMany>>")]
    #[serde(default)]
    pub physical_characteristics: Vec<String>,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub personality: String,
    #[serde_as(deserialize_as = "DefaultOnNull<OneOrMany<_, PreferMany>>")]
    #[serde(default)]
    pub events: Vec<String>,
    #[serde_as(deserialize_as = "DefaultOnNull<OneOrMany<_, PreferMany>>")]
    #[serde(default, alias = "relations")]
    pub relationships: Vec<String>,
    #[serde_as(deserialize_as = "DefaultOnNull<OneOrMany<_, PreferMany>>")]
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl From<&Profile> for ProfilePayload {
    fn from(p: &Profile) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            hint: p.hint.clone(),
            age: p.age.clone(),
            role: p.role.clone(),
            physical_characteristics: p.physical_characteristics.clone(),
            personality: p.personality.clone(),
            events: p.events.clone(),
            relationships: p.relationships.clone(),
            aliases: p.aliases.clone(),
        }
    }
}

impl From<ProfilePayload> for Profile {
    fn from(p: ProfilePayload) -> Self {
        Self {
            id: p.id,
            name: p.name,
            hint: p.hint,
            age: p.age,
            role: p.role,
            physical_characteristics: p.physical_characteristics,
            personality: p.personality,
            events: p.events,
            relationships: p.relationships,
            aliases: p.aliases,
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct MergeResponse {
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    #[validate(nested)]
    pub profiles: Vec<ProfilePayload>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(String::new()),
        Some(serde_json::Value::String(s)) => Ok(s),
        Some(serde_json::Value::Number(n)) => Ok(n.to_string()),
        Some(other) => Err(D::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}
