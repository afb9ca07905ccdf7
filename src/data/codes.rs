//! WMO weather-code vocabulary: human-readable descriptions, the coarse sky
//! categories used by the agreement scorer, and compass octant conversion.

use serde::Serialize;

/// Human-readable description for a WMO weather code.
///
/// Unknown codes fall back to echoing the raw number instead of failing, so
/// malformed upstream data degrades to an ugly label rather than an error.
pub fn describe(code: u16) -> String {
    let label = match code {
        0 => "Clear",
        1 => "Mostly Clear",
        2 => "Partly Cloudy",
        3 => "Overcast",
        45 => "Fog",
        51 => "Light Drizzle",
        53 => "Drizzle",
        55 => "Dense Drizzle",
        61 => "Light Rain",
        63 => "Rain",
        65 => "Heavy Rain",
        80 => "Light Showers",
        81 => "Showers",
        82 => "Heavy Showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm with Hail",
        99 => "Heavy Thunderstorm",
        other => return format!("Code {}", other),
    };
    label.to_string()
}

/// Coarse condition family used for cross-source agreement.
///
/// Everything from drizzle upward (code >= 51, thunderstorms included) is the
/// precipitation family; overcast/fog codes are cloudy; 0 and 1 are clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SkyCategory {
    Clear,
    Cloudy,
    Precipitation,
}

impl SkyCategory {
    pub fn from_code(code: u16) -> Self {
        if code >= 51 {
            SkyCategory::Precipitation
        } else if code >= 2 {
            SkyCategory::Cloudy
        } else {
            SkyCategory::Clear
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SkyCategory::Clear => "clear",
            SkyCategory::Cloudy => "cloudy",
            SkyCategory::Precipitation => "rain/storm",
        }
    }
}

/// Eight compass octants, clockwise from north.
pub const OCTANTS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

/// Map a wind direction in degrees to its compass octant.
///
/// Truncating division keeps 0 degrees in the north sector; the sector
/// boundaries sit at 22.5, 67.5, ... degrees.
pub fn compass_octant(degrees: f64) -> &'static str {
    let idx = (((degrees + 22.5) / 45.0).floor() as i64).rem_euclid(8) as usize;
    OCTANTS[idx]
}
