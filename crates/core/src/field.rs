use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Canonical fields
// ---------------------------------------------------------------------------

/// Column role, independent of the header wording used by a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Code,
    NameText,
    Indicator,
    Description,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 4] = [
        Self::Code,
        Self::NameText,
        Self::Indicator,
        Self::Description,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::NameText => "name_text",
            Self::Indicator => "indicator",
            Self::Description => "description",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CanonicalField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "unknown canonical field '{s}' (expected one of: {})",
                    Self::ALL.map(|f| f.as_str()).join(", ")
                )
            })
    }
}

// ---------------------------------------------------------------------------
// Subject
// ---------------------------------------------------------------------------

/// Which kind of strategic element a table lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    /// Institutional strategic objectives (OEI).
    Objective,
    /// Institutional strategic actions (AEI).
    Action,
}

impl Subject {
    pub const ALL: [Subject; 2] = [Self::Objective, Self::Action];

    /// Short code used in element codes and sheet names.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Objective => "OEI",
            Self::Action => "AEI",
        }
    }

    /// Phrases whose presence anywhere in a table tags it with this subject.
    /// Already normalized.
    pub fn detection_keywords(&self) -> &'static [&'static str] {
        match self {
            Self::Objective => &[
                "oei0",
                "objetivos estrategicos institucionales",
                "objetivo estrategico",
            ],
            Self::Action => &[
                "aei0",
                "acciones estrategicas institucionales",
                "accion estrategica",
                "accion",
            ],
        }
    }

    /// Terms that raise a header candidate's score. Already normalized.
    pub fn header_keywords(&self) -> &'static [&'static str] {
        match self {
            Self::Objective => &["denominacion", "objetivo", "oei", "indicador", "meta"],
            Self::Action => &["denominacion", "accion", "aei", "indicador", "meta"],
        }
    }
}

/// Keywords for the single-row fallback header heuristic.
pub const FALLBACK_HEADER_KEYWORDS: &[&str] =
    &["denominacion", "accion", "objetivo", "indicador", "meta"];

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Subject {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "oei" | "objective" | "objectives" => Ok(Self::Objective),
            "aei" | "action" | "actions" => Ok(Self::Action),
            other => Err(format!("unknown subject '{other}' (expected oei or aei)")),
        }
    }
}
