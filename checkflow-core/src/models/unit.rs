//! Organizational unit data model

use crate::models::ids::UnitId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Level of a unit in the organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnitType {
    HeadOffice,
    Zone,
    Region,
    Branch,
    Other,
}

impl UnitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitType::HeadOffice => "HEAD_OFFICE",
            UnitType::Zone => "ZONE",
            UnitType::Region => "REGION",
            UnitType::Branch => "BRANCH",
            UnitType::Other => "OTHER",
        }
    }
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnitType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "HEAD_OFFICE" | "HO" => Ok(UnitType::HeadOffice),
            "ZONE" => Ok(UnitType::Zone),
            "REGION" => Ok(UnitType::Region),
            "BRANCH" | "BR" => Ok(UnitType::Branch),
            "OTHER" => Ok(UnitType::Other),
            other => Err(format!("unknown unit type: {}", other)),
        }
    }
}

/// Node in the organizational tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    /// Unique short code, e.g. "BR-012"
    pub code: String,
    pub name: String,
    pub unit_type: UnitType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<UnitId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for a new unit
#[derive(Debug, Clone, Deserialize)]
pub struct NewUnit {
    pub code: String,
    pub name: String,
    pub unit_type: UnitType,
    #[serde(default)]
    pub parent: Option<UnitId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_type_parse() {
        assert_eq!("ho".parse::<UnitType>().unwrap(), UnitType::HeadOffice);
        assert_eq!("Branch".parse::<UnitType>().unwrap(), UnitType::Branch);
        assert!("planet".parse::<UnitType>().is_err());
        assert_eq!(
            serde_json::to_string(&UnitType::HeadOffice).unwrap(),
            "\"HEAD_OFFICE\""
        );
    }
}
