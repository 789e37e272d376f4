use regex::{Captures, Regex};
use std::{fmt, str::FromStr, sync::LazyLock};

use crate::model::WeatherRecord;

/// Template used when none is configured.
pub const DEFAULT_TEMPLATE: &str = "$tempF$°F";

/// How a record becomes the display string. Exactly one strategy is active.
#[derive(Clone)]
pub enum Formatter {
    /// `$name$` substitution, see [`render`].
    Template(String),
    /// Caller-supplied conversion; the template machinery is bypassed entirely.
    Custom(fn(&WeatherRecord) -> String),
}

impl Formatter {
    pub fn format(&self, record: &WeatherRecord) -> String {
        match self {
            Formatter::Template(template) => render(template, record),
            Formatter::Custom(f) => f(record),
        }
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Formatter::Template(DEFAULT_TEMPLATE.to_string())
    }
}

impl fmt::Debug for Formatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Formatter::Template(t) => f.debug_tuple("Template").field(t).finish(),
            Formatter::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// The template vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    StationPlace,
    StationState,
    Year,
    Month,
    Day,
    Hour,
    Wind,
    Visibility,
    SkyCondition,
    TempC,
    TempF,
    DewPoint,
    Humidity,
    Pressure,
}

impl Placeholder {
    pub const ALL: [Placeholder; 14] = [
        Placeholder::StationPlace,
        Placeholder::StationState,
        Placeholder::Year,
        Placeholder::Month,
        Placeholder::Day,
        Placeholder::Hour,
        Placeholder::Wind,
        Placeholder::Visibility,
        Placeholder::SkyCondition,
        Placeholder::TempC,
        Placeholder::TempF,
        Placeholder::DewPoint,
        Placeholder::Humidity,
        Placeholder::Pressure,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Placeholder::StationPlace => "stationPlace",
            Placeholder::StationState => "stationState",
            Placeholder::Year => "year",
            Placeholder::Month => "month",
            Placeholder::Day => "day",
            Placeholder::Hour => "hour",
            Placeholder::Wind => "wind",
            Placeholder::Visibility => "visibility",
            Placeholder::SkyCondition => "skyCondition",
            Placeholder::TempC => "tempC",
            Placeholder::TempF => "tempF",
            Placeholder::DewPoint => "dewPoint",
            Placeholder::Humidity => "humidity",
            Placeholder::Pressure => "pressure",
        }
    }

    /// The record's value for this placeholder.
    pub fn value(&self, record: &WeatherRecord) -> String {
        match self {
            Placeholder::StationPlace => record.station_place.clone(),
            Placeholder::StationState => record.station_state.clone(),
            Placeholder::Year => record.year.clone(),
            Placeholder::Month => record.month.clone(),
            Placeholder::Day => record.day.clone(),
            Placeholder::Hour => record.hour.clone(),
            Placeholder::Wind => record.wind.clone(),
            Placeholder::Visibility => record.visibility.clone(),
            Placeholder::SkyCondition => record.sky_condition.clone(),
            Placeholder::TempC => record.temp_c.to_string(),
            Placeholder::TempF => record.temp_f.to_string(),
            Placeholder::DewPoint => record.dew_point.clone(),
            Placeholder::Humidity => record.humidity.to_string(),
            Placeholder::Pressure => record.pressure.to_string(),
        }
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Placeholder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Placeholder::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("Unknown placeholder '{s}'"))
    }
}

/// Matches `$name$` for vocabulary names only, so unknown names and stray `$` stay literal.
static PLACEHOLDER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    let names: Vec<&str> = Placeholder::ALL.iter().map(Placeholder::as_str).collect();
    Regex::new(&format!(r"\$({})\$", names.join("|"))).unwrap()
});

/// Substitute every `$name$` from the vocabulary with the record's value.
///
/// Unknown names are copied through with both dollar signs, and the closing `$`
/// of such a pair may still open the next placeholder. A `$` with no partner is literal.
pub fn render(template: &str, record: &WeatherRecord) -> String {
    PLACEHOLDER_PATTERN
        .replace_all(template, |caps: &Captures| match caps[1].parse::<Placeholder>() {
            Ok(placeholder) => placeholder.value(record),
            Err(_) => caps[0].to_string(),
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> WeatherRecord {
        WeatherRecord {
            station_place: "Ithaca".into(),
            station_state: "NY".into(),
            year: "2024".into(),
            month: "01".into(),
            day: "05".into(),
            hour: "09:53".into(),
            wind: "Calm:0".into(),
            visibility: "10 mile(s):0".into(),
            sky_condition: "overcast".into(),
            temp_c: 5,
            temp_f: 41,
            dew_point: "35.1 F (1.7 C)".into(),
            humidity: 60,
            pressure: 1021,
        }
    }

    #[test]
    fn substitutes_numeric_fields() {
        assert_eq!(render("$tempC$ C @ $humidity$", &record()), "5 C @ 60");
    }

    #[test]
    fn substitutes_every_placeholder() {
        let template: String = Placeholder::ALL
            .iter()
            .map(|p| format!("${p}$"))
            .collect::<Vec<_>>()
            .join("|");

        assert_eq!(
            render(&template, &record()),
            "Ithaca|NY|2024|01|05|09:53|Calm:0|10 mile(s):0|overcast|5|41|35.1 F (1.7 C)|60|1021"
        );
    }

    #[test]
    fn unknown_placeholder_passes_through() {
        assert_eq!(render("$bogus$", &record()), "$bogus$");
        assert_eq!(render("a $bogus$ b", &record()), "a $bogus$ b");
    }

    #[test]
    fn closing_dollar_of_unknown_name_can_open_a_placeholder() {
        assert_eq!(render("5$ and $tempF$", &record()), "5$ and 41");
    }

    #[test]
    fn unknown_name_between_placeholders_is_kept() {
        assert_eq!(render("$bogus$tempF$", &record()), "$bogus41");
        assert_eq!(render("$tempC$$tempF$", &record()), "541");
    }

    #[test]
    fn unterminated_dollar_is_literal() {
        assert_eq!(render("$tempF$ costs $", &record()), "41 costs $");
        assert_eq!(render("$tempF", &record()), "$tempF");
    }

    #[test]
    fn empty_name_is_literal() {
        assert_eq!(render("$$tempF$", &record()), "$41");
    }

    #[test]
    fn names_are_case_sensitive() {
        assert_eq!(render("$TEMPF$", &record()), "$TEMPF$");
    }

    #[test]
    fn template_without_placeholders_is_unchanged() {
        assert_eq!(render("no weather today", &record()), "no weather today");
        assert_eq!(render("", &record()), "");
    }

    #[test]
    fn default_formatter_shows_fahrenheit() {
        assert_eq!(Formatter::default().format(&record()), "41°F");
    }

    #[test]
    fn custom_formatter_bypasses_template() {
        fn short(r: &WeatherRecord) -> String {
            format!("{}/{}", r.temp_c, r.pressure)
        }

        assert_eq!(Formatter::Custom(short).format(&record()), "5/1021");
    }

    #[test]
    fn placeholder_names_round_trip() {
        for p in Placeholder::ALL {
            assert_eq!(p.as_str().parse::<Placeholder>(), Ok(p));
        }
        assert!("bogus".parse::<Placeholder>().is_err());
    }
}
