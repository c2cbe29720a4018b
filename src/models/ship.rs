use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShipType {
    Scout,
    Fighter,
    Trader,
    Explorer,
}

impl fmt::Display for ShipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShipType::Scout => "scout",
            ShipType::Fighter => "fighter",
            ShipType::Trader => "trader",
            ShipType::Explorer => "explorer",
        };
        f.write_str(name)
    }
}

impl FromStr for ShipType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "scout" => Ok(ShipType::Scout),
            "fighter" => Ok(ShipType::Fighter),
            "trader" => Ok(ShipType::Trader),
            "explorer" => Ok(ShipType::Explorer),
            other => Err(format!("unknown ship type: {}", other)),
        }
    }
}

/// Point-bounded stat allocation, forwarded as-is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipStats {
    pub hull_strength: u8,
    pub shield_capacity: u8,
    pub speed: u8,
    pub cargo_space: u8,
    pub sensors: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ship {
    pub id: String,
    pub owner_id: String,
    pub ship_type: ShipType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub hull_points: u32,
    pub hull_max: u32,
    pub shield_points: u32,
    pub shield_max: u32,
    pub cargo_capacity: u32,
    pub location_sector: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stat_allocation: Option<ShipStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateShipRequest {
    pub owner_id: String,
    pub ship_type: ShipType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub stat_allocation: ShipStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ship_type_wire_format() {
        assert_eq!(serde_json::to_string(&ShipType::Explorer).unwrap(), "\"explorer\"");
        let parsed: ShipType = serde_json::from_str("\"fighter\"").unwrap();
        assert_eq!(parsed, ShipType::Fighter);
    }

    #[test]
    fn test_ship_type_from_str_case_insensitive() {
        assert_eq!("Scout".parse::<ShipType>().unwrap(), ShipType::Scout);
        assert_eq!("TRADER".parse::<ShipType>().unwrap(), ShipType::Trader);
        assert!("cruiser".parse::<ShipType>().is_err());
    }

    #[test]
    fn test_create_ship_request_omits_missing_name() {
        let request = CreateShipRequest {
            owner_id: "c1".to_string(),
            ship_type: ShipType::Scout,
            name: None,
            stat_allocation: ShipStats {
                hull_strength: 6,
                shield_capacity: 6,
                speed: 6,
                cargo_space: 6,
                sensors: 6,
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("name").is_none());
        assert_eq!(json["ship_type"], "scout");
        assert_eq!(json["stat_allocation"]["sensors"], 6);
    }
}
