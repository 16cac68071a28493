use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One control request. Only `cmd` is required on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub cmd: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

impl Request {
    pub fn new(cmd: Command) -> Self {
        Self {
            cmd: cmd.as_str().to_string(),
            ..Self::default()
        }
    }

    pub fn set_limit(app: &str, name: Option<&str>, limit: i64) -> Self {
        Self {
            cmd: Command::SetLimit.as_str().to_string(),
            app: Some(app.to_string()),
            name: name.map(str::to_string),
            limit: Some(limit),
        }
    }

    pub fn command(&self) -> Option<Command> {
        Command::from_str(&self.cmd)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    GetLimits,
    SetLimit,
    GetTimers,
}

impl Command {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GetLimits => "getLimits",
            Self::SetLimit => "setLimit",
            Self::GetTimers => "getTimers",
        }
    }

    #[allow(clippy::should_implement_trait, reason = "unknown names map to None, not an error type")]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "getLimits" => Some(Self::GetLimits),
            "setLimit" => Some(Self::SetLimit),
            "getTimers" => Some(Self::GetTimers),
            _ => None,
        }
    }
}

/// One control response. `data` is left out of the encoding when absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
}

impl Response {
    pub fn ok() -> Self {
        Self {
            success: true,
            data: None,
        }
    }

    /// The uniform answer for malformed requests and commands that are not understood.
    pub fn failure() -> Self {
        Self::default()
    }

    /// Successful response carrying a single keyed payload.
    pub fn with_data(key: &str, value: Value) -> Self {
        let mut data = Map::new();
        data.insert(key.to_string(), value);
        Self {
            success: true,
            data: Some(data),
        }
    }

    pub fn payload(&self, key: &str) -> Option<&Value> {
        self.data.as_ref()?.get(key)
    }
}
