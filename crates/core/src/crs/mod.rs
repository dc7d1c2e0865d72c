//! Coordinate reference system tags carried alongside rasters and layers
//!
//! Nothing here reprojects. A `CRS` only records which system a grid or a
//! layer is expressed in so that mismatched inputs can be rejected before
//! they are combined.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Coordinate reference system, identified by EPSG code and/or WKT
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CRS {
    epsg: Option<u32>,
    wkt: Option<String>,
}

impl CRS {
    pub fn from_epsg(code: u32) -> Self {
        Self { epsg: Some(code), wkt: None }
    }

    pub fn from_wkt(wkt: impl Into<String>) -> Self {
        Self { epsg: None, wkt: Some(wkt.into()) }
    }

    /// Swiss CH1903+ / LV95 (EPSG:2056), the grid of the reference DEM tiles
    pub fn lv95() -> Self {
        Self::from_epsg(2056)
    }

    pub fn epsg(&self) -> Option<u32> {
        self.epsg
    }

    pub fn wkt(&self) -> Option<&str> {
        self.wkt.as_deref()
    }

    /// Two systems are equivalent when their EPSG codes match, or failing
    /// that when their WKT strings are identical.
    pub fn is_equivalent(&self, other: &CRS) -> bool {
        match (self.epsg, other.epsg) {
            (Some(a), Some(b)) => a == b,
            _ => matches!((&self.wkt, &other.wkt), (Some(a), Some(b)) if a == b),
        }
    }
}

impl fmt::Display for CRS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.epsg, &self.wkt) {
            (Some(code), _) => write!(f, "EPSG:{}", code),
            (None, Some(wkt)) => write!(f, "WKT:{}", wkt.chars().take(40).collect::<String>()),
            (None, None) => f.write_str("unknown"),
        }
    }
}

impl FromStr for CRS {
    type Err = Error;

    /// Accepts `EPSG:<code>`, a bare code, or a WKT string
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let code = s
            .strip_prefix("EPSG:")
            .or_else(|| s.strip_prefix("epsg:"))
            .unwrap_or(s);
        if let Ok(code) = code.parse::<u32>() {
            return Ok(Self::from_epsg(code));
        }
        if s.contains('[') {
            return Ok(Self::from_wkt(s));
        }
        Err(Error::InvalidParameter {
            name: "crs",
            value: s.to_string(),
            reason: "expected EPSG:<code> or WKT".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_epsg() {
        let crs: CRS = "EPSG:2056".parse().unwrap();
        assert_eq!(crs.epsg(), Some(2056));
        assert_eq!(crs.to_string(), "EPSG:2056");
        assert!(crs.is_equivalent(&CRS::lv95()));
        assert_eq!("21781".parse::<CRS>().unwrap().epsg(), Some(21781));
        assert!("lv95".parse::<CRS>().is_err());
    }

    #[test]
    fn test_equivalence_without_common_identifier() {
        let a = CRS::from_epsg(2056);
        let b = CRS::from_wkt("PROJCS[\"CH1903+ / LV95\"]");
        assert!(!a.is_equivalent(&b));
        assert!(b.is_equivalent(&b.clone()));
    }
}
