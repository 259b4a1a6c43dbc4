use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// World-space point (unscaled, unpanned). For teams this is the top-left corner of the box.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// True when either axis differs by more than `tolerance`.
    pub fn differs_from(&self, other: &Position, tolerance: f32) -> bool {
        (self.x - other.x).abs() > tolerance || (self.y - other.y).abs() > tolerance
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(from = "String", into = "String")]
pub enum TeamType {
    StreamAligned,
    Platform,
    Enabling,
    ComplicatedSubsystem,
    #[default]
    Undefined,
}

impl TeamType {
    pub const ALL: [TeamType; 5] = [
        TeamType::StreamAligned,
        TeamType::Platform,
        TeamType::Enabling,
        TeamType::ComplicatedSubsystem,
        TeamType::Undefined,
    ];

    pub fn from_token(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "stream-aligned" | "stream_aligned" => Self::StreamAligned,
            "platform" => Self::Platform,
            "enabling" => Self::Enabling,
            "complicated-subsystem" | "complicated_subsystem" => Self::ComplicatedSubsystem,
            _ => Self::Undefined,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StreamAligned => "stream-aligned",
            Self::Platform => "platform",
            Self::Enabling => "enabling",
            Self::ComplicatedSubsystem => "complicated-subsystem",
            Self::Undefined => "undefined",
        }
    }
}

impl From<String> for TeamType {
    fn from(value: String) -> Self {
        Self::from_token(&value)
    }
}

impl From<TeamType> for String {
    fn from(value: TeamType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for TeamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InteractionMode {
    Collaboration,
    XAsAService,
    Facilitating,
    Other(String),
}

impl InteractionMode {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Collaboration => "collaboration",
            Self::XAsAService => "x-as-a-service",
            Self::Facilitating => "facilitating",
            Self::Other(raw) => raw.as_str(),
        }
    }
}

impl From<String> for InteractionMode {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "collaboration" => Self::Collaboration,
            "x-as-a-service" | "x_as_a_service" | "xaas" => Self::XAsAService,
            "facilitating" => Self::Facilitating,
            _ => Self::Other(value),
        }
    }
}

impl From<InteractionMode> for String {
    fn from(value: InteractionMode) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HorizontalHint {
    Left,
    Center,
    Right,
}

impl HorizontalHint {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim() {
            "left" => Some(Self::Left),
            "center" => Some(Self::Center),
            "right" => Some(Self::Right),
            _ => None,
        }
    }

    /// Offset into a grouping's content width.
    pub fn fraction(self) -> f32 {
        match self {
            Self::Left => 0.0,
            Self::Center => 0.35,
            Self::Right => 0.7,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalHint {
    Top,
    Bottom,
}

impl VerticalHint {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim() {
            "top" => Some(Self::Top),
            "bottom" => Some(Self::Bottom),
            _ => None,
        }
    }
}

/// Diagram flavour. Changes box dimensions and which alignment applies.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum ViewMode {
    /// Organization-chart rendering ("current" / "hierarchy" / "baseline").
    #[default]
    #[serde(rename = "current", alias = "hierarchy", alias = "baseline")]
    Current,
    /// Value-stream / platform-grouping rendering ("tt" / "design").
    #[serde(rename = "tt", alias = "design")]
    Design,
}

impl ViewMode {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim() {
            "current" | "hierarchy" | "baseline" => Some(Self::Current),
            "tt" | "design" => Some(Self::Design),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::Design => "tt",
        }
    }
}

/// Team records from the API may carry `null` for list and map fields.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub team_type: TeamType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_stream: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_grouping: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_stream_inner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_grouping_inner: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dependencies: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub interaction_modes: BTreeMap<String, InteractionMode>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: BTreeMap<String, Value>,
}

impl Team {
    pub fn new(name: impl Into<String>, team_type: TeamType) -> Self {
        Self {
            name: name.into(),
            team_type,
            ..Default::default()
        }
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.position = Some(Position::new(x, y));
        self
    }

    pub fn in_value_stream(mut self, name: impl Into<String>) -> Self {
        self.value_stream = Some(name.into());
        self
    }

    pub fn in_platform_grouping(mut self, name: impl Into<String>) -> Self {
        self.platform_grouping = Some(name.into());
        self
    }

    pub fn with_metadata(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        self.dependencies.push(name.into());
        self
    }

    pub fn interacts_with(mut self, name: impl Into<String>, mode: InteractionMode) -> Self {
        self.interaction_modes.insert(name.into(), mode);
        self
    }

    /// Current position, `{0,0}` when the record has none.
    pub fn pos(&self) -> Position {
        self.position.unwrap_or_default()
    }

    pub fn set_pos(&mut self, position: Position) {
        self.position = Some(position);
    }

    fn keyed<'a>(&'a self, field: &'a Option<String>, key: &str) -> Option<&'a str> {
        field
            .as_deref()
            .filter(|value| !value.is_empty())
            .or_else(|| self.metadata_str(key))
    }

    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata
            .get(key)
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
    }

    pub fn value_stream(&self) -> Option<&str> {
        self.keyed(&self.value_stream, "value_stream")
    }

    pub fn platform_grouping(&self) -> Option<&str> {
        self.keyed(&self.platform_grouping, "platform_grouping")
    }

    pub fn value_stream_inner(&self) -> Option<&str> {
        self.keyed(&self.value_stream_inner, "value_stream_inner")
    }

    pub fn platform_grouping_inner(&self) -> Option<&str> {
        self.keyed(&self.platform_grouping_inner, "platform_grouping_inner")
    }

    pub fn is_grouped(&self) -> bool {
        self.value_stream().is_some() || self.platform_grouping().is_some()
    }

    pub fn hint_x(&self) -> Option<HorizontalHint> {
        self.metadata_str("align_hint_x")
            .and_then(HorizontalHint::from_token)
    }

    pub fn hint_y(&self) -> Option<VerticalHint> {
        self.metadata_str("align_hint_y").and_then(VerticalHint::from_token)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrganizationHierarchy {
    #[serde(default)]
    pub company: Option<CompanyNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyNode {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub children: Vec<DepartmentNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DepartmentNode {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_managers: Option<Vec<SubManagerNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regions: Option<Vec<SubManagerNode>>,
}

impl DepartmentNode {
    /// Line managers and regions are interchangeable; `line_managers` wins when both keys exist.
    pub fn sub_managers(&self) -> &[SubManagerNode] {
        self.line_managers
            .as_deref()
            .or(self.regions.as_deref())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubManagerNode {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub teams: Vec<String>,
}
