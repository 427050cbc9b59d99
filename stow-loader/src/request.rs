// Module requests as handed over by the host on a load miss

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Culture name the host uses for the invariant culture
pub const NEUTRAL_CULTURE: &str = "neutral";

/// A failed managed module load the resolver is asked to satisfy.
///
/// Identity (for caching) is the full name string given by the host;
/// probing only uses the simple name and the culture.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleRequest {
    name: String,
    culture: String,
    full_name: String,
}

impl ModuleRequest {
    /// Request for a non-localized module; the full name is the simple name
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            full_name: name.clone(),
            name,
            culture: String::new(),
        }
    }

    /// Attach a culture; "neutral" and "" mean the default culture
    pub fn with_culture(mut self, culture: impl Into<String>) -> Self {
        let culture = normalize_culture(culture.into());
        self.full_name = if culture.is_empty() {
            self.name.clone()
        } else {
            format!("{}, Culture={}", self.name, culture)
        };
        self.culture = culture;
        self
    }

    /// Override the identity string
    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = full_name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Culture tag, empty for the default culture
    pub fn culture(&self) -> &str {
        &self.culture
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn is_localized(&self) -> bool {
        !self.culture.is_empty()
    }
}

fn normalize_culture(culture: String) -> String {
    let trimmed = culture.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(NEUTRAL_CULTURE) {
        String::new()
    } else {
        trimmed.to_string()
    }
}

/// Parse a host display name: `Name[, Key=Value]*`.
///
/// Only `Culture` is interpreted; the whole trimmed string becomes the full name.
impl FromStr for ModuleRequest {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let full_name = s.trim();
        let mut parts = full_name.split(',');
        let name = parts.next().unwrap_or("").trim();

        let culture = parts
            .filter_map(|part| part.split_once('='))
            .find(|(key, _)| key.trim().eq_ignore_ascii_case("culture"))
            .map(|(_, value)| value.trim().to_string())
            .unwrap_or_default();

        Ok(ModuleRequest::new(name)
            .with_culture(culture)
            .with_full_name(full_name))
    }
}

impl fmt::Display for ModuleRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_name)
    }
}
