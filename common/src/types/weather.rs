//! Weather categories derived from the `HourlyPresentWeatherType` field of NOAA Local
//! Climatological Data.

use itertools::Itertools;
use std::fmt;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum HourlyWeather {
    Rain,
    RainMist,
    RainFog,
    Mist,
    Haze,
    HazeSmoke,
    Fog,
    Snow,
    SnowMist,
    SnowFog,
    HeavySnow,
    SnowFreezingFog,
    /// No precipitation was measured in that hour
    Sunny,
    Unknown,
}

/// Representative weather of a day. Variants are ordered by priority: a day with any snow
/// observation is a snow day, otherwise any rain makes it a rain day.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum DailyWeather {
    Other,
    Rain,
    Snow,
}

/// Present weather codes as they appear in the LCD files, with whitespace collapsed
const WEATHER_CODES: [(&str, HourlyWeather); 27] = [
    ("-RA:02 |RA |RA", HourlyWeather::Rain),
    ("RA:02 |RA |RA", HourlyWeather::Rain),
    ("+RA:02 |RA |RA", HourlyWeather::Rain),
    ("|RA |", HourlyWeather::Rain),
    ("-RA:02 ||", HourlyWeather::Rain),
    ("+RA:02 BR:1 |RA |RA", HourlyWeather::Rain),
    ("-RA:02 BR:1 |RA |RA", HourlyWeather::RainMist),
    ("RA:02 BR:1 |RA |RA", HourlyWeather::RainMist),
    ("+RA:02 FG:2 |FG RA |RA", HourlyWeather::RainFog),
    ("RA:02 FG:2 |FG RA |RA", HourlyWeather::RainFog),
    ("-RA:02 FG:2 |FG RA |RA", HourlyWeather::RainFog),
    ("BR:1 ||", HourlyWeather::Mist),
    ("UP:09 BR:1 ||", HourlyWeather::Mist),
    ("HZ:7 |FU |HZ", HourlyWeather::HazeSmoke),
    ("HZ:7 ||HZ", HourlyWeather::Haze),
    ("FG:2 |FG |", HourlyWeather::Fog),
    ("-SN:03 |SN |", HourlyWeather::Snow),
    ("|SN |", HourlyWeather::Snow),
    ("SN:03 |SN s |s", HourlyWeather::Snow),
    ("-SN:03 BR:1 |SN |", HourlyWeather::SnowMist),
    ("-SN:03 FG:2 |FG SN |", HourlyWeather::SnowFog),
    ("SN:03 FG:2 |FG SN |", HourlyWeather::SnowFog),
    ("+SN:03 |SN s |", HourlyWeather::HeavySnow),
    ("+SN:03 FZ:8 FG:2 |FG SN |", HourlyWeather::SnowFreezingFog),
    ("-SN:03 FZ:8 FG:2 |FG SN |", HourlyWeather::SnowFreezingFog),
    ("SN:03 FZ:8 FG:2 |FG SN |", HourlyWeather::SnowFreezingFog),
    ("UP:09 ||", HourlyWeather::Unknown),
];

impl HourlyWeather {
    /// Looks up a raw present weather code. Codes that are not in the table yield `None`, the
    /// caller decides on the fallback category.
    pub fn from_code(raw: &str) -> Option<Self> {
        let code = normalize_code(raw);
        WEATHER_CODES.iter()
            .find(|(known, _)| *known == code)
            .map(|(_, category)| *category)
    }

    /// Category of one hourly observation. Zero precipitation overrides whatever code was
    /// reported, unknown or missing codes fall back to [`HourlyWeather::Unknown`].
    pub fn classify(code: Option<&str>, precipitation: Option<f64>) -> Self {
        if precipitation == Some(0.0) {
            return HourlyWeather::Sunny;
        }
        code.and_then(HourlyWeather::from_code).unwrap_or(HourlyWeather::Unknown)
    }

    /// `None` if nothing is known about the weather in that hour
    pub fn is_severe(&self) -> Option<bool> {
        match self {
            HourlyWeather::Unknown => None,
            HourlyWeather::Rain
            | HourlyWeather::RainFog
            | HourlyWeather::Snow
            | HourlyWeather::SnowMist
            | HourlyWeather::SnowFog
            | HourlyWeather::HeavySnow
            | HourlyWeather::SnowFreezingFog => Some(true),
            _ => Some(false),
        }
    }

    pub fn daily(&self) -> DailyWeather {
        match self {
            HourlyWeather::Rain | HourlyWeather::RainMist | HourlyWeather::RainFog => DailyWeather::Rain,
            HourlyWeather::Snow
            | HourlyWeather::SnowMist
            | HourlyWeather::SnowFog
            | HourlyWeather::HeavySnow
            | HourlyWeather::SnowFreezingFog => DailyWeather::Snow,
            _ => DailyWeather::Other,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HourlyWeather::Rain => "rain",
            HourlyWeather::RainMist => "rain/mist",
            HourlyWeather::RainFog => "rain/fog",
            HourlyWeather::Mist => "mist",
            HourlyWeather::Haze => "haze",
            HourlyWeather::HazeSmoke => "haze/smoke",
            HourlyWeather::Fog => "fog",
            HourlyWeather::Snow => "snow",
            HourlyWeather::SnowMist => "snow/mist",
            HourlyWeather::SnowFog => "snow/fog",
            HourlyWeather::HeavySnow => "heavy snow",
            HourlyWeather::SnowFreezingFog => "snow/freezing/fog",
            HourlyWeather::Sunny => "sunny",
            HourlyWeather::Unknown => "unknown",
        }
    }
}

impl DailyWeather {
    /// Daily class of a raw code. Unknown codes count as [`DailyWeather::Other`].
    pub fn from_code(raw: Option<&str>) -> Self {
        raw.and_then(HourlyWeather::from_code)
            .map_or(DailyWeather::Other, |category| category.daily())
    }

    pub fn label(&self) -> &'static str {
        match self {
            DailyWeather::Other => "other",
            DailyWeather::Rain => "rain",
            DailyWeather::Snow => "snow",
        }
    }
}

impl Display for HourlyWeather {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl Display for DailyWeather {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

fn normalize_code(raw: &str) -> String {
    raw.split_whitespace().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;

    #[test]
    fn test_code_table_is_unambiguous() {
        assert!(WEATHER_CODES.iter().map(|(code, _)| normalize_code(code)).all_unique());
        assert!(WEATHER_CODES.iter().all(|(code, _)| normalize_code(code) == *code));
        assert!(WEATHER_CODES.iter().all(|(_, category)| *category != HourlyWeather::Sunny));
    }

    #[test]
    fn test_lookup_ignores_whitespace_noise() {
        assert_eq!(Some(HourlyWeather::SnowMist), HourlyWeather::from_code("  -SN:03   BR:1 |SN | "));
        assert_eq!(None, HourlyWeather::from_code("TS:7 |TS |"));
    }

    #[test]
    fn test_zero_precipitation_is_sunny() {
        assert_eq!(HourlyWeather::Sunny, HourlyWeather::classify(Some("+SN:03 |SN s |"), Some(0.0)));
        assert_eq!(HourlyWeather::HeavySnow, HourlyWeather::classify(Some("+SN:03 |SN s |"), Some(0.3)));
        assert_eq!(HourlyWeather::Unknown, HourlyWeather::classify(None, None));
        assert_eq!(HourlyWeather::Unknown, HourlyWeather::classify(Some("TS:7 |TS |"), Some(0.1)));
    }

    #[test]
    fn test_severity() {
        assert_eq!(None, HourlyWeather::Unknown.is_severe());
        assert_eq!(Some(false), HourlyWeather::Sunny.is_severe());
        assert_eq!(Some(false), HourlyWeather::Mist.is_severe());
        assert_eq!(Some(true), HourlyWeather::HeavySnow.is_severe());
    }

    #[test]
    fn test_daily_priority() {
        assert!(DailyWeather::Snow > DailyWeather::Rain);
        assert!(DailyWeather::Rain > DailyWeather::Other);
        assert_eq!(DailyWeather::Other, DailyWeather::from_code(Some("UP:09 ||")));
        assert_eq!(DailyWeather::Other, DailyWeather::from_code(None));
        assert_eq!(DailyWeather::Rain, DailyWeather::from_code(Some("-RA:02 BR:1 |RA |RA")));
        assert_eq!(DailyWeather::Snow, DailyWeather::from_code(Some("SN:03 FZ:8 FG:2 |FG SN |")));
    }
}
