//! Parser for decoded METAR bulletins, e.g.
//!
//! ```text
//! SAN FRANCISCO INTERNATIONAL AIRPORT, CA, United States (KSFO) 37-37N 122-22W 3M
//! Jun 27, 2012 - 05:56 PM EDT / 2012.06.27 2156 UTC
//! Wind: from the WNW (290 degrees) at 20 MPH (17 KT):0
//! Visibility: 10 mile(s):0
//! Sky conditions: mostly clear
//! Temperature: 64.0 F (17.8 C)
//! Dew Point: 53.1 F (11.7 C)
//! Relative Humidity: 67%
//! Pressure (altimeter): 29.95 in. Hg (1014 hPa)
//! ob: KSFO 272156Z 29017KT 10SM FEW008 18/12 A2995 RMK AO2 SLP141 T01780117
//! cycle: 22
//! ```
//!
//! The layout varies between stations, so the descriptive sections (wind,
//! visibility, sky, dew point) fall back to a placeholder when absent. The
//! header, timestamp and the numeric sections are mandatory.

use thiserror::Error;

use crate::model::{WeatherRecord, floor_to_i32};

pub const WIND: &str = "Wind: ";
pub const VISIBILITY: &str = "Visibility: ";
pub const SKY_CONDITIONS: &str = "Sky conditions: ";
pub const TEMPERATURE: &str = "Temperature: ";
pub const DEW_POINT: &str = "Dew Point: ";
pub const RELATIVE_HUMIDITY: &str = "Relative Humidity: ";
pub const PRESSURE: &str = "Pressure (altimeter): ";

/// Hard parse failure, positioned at the offending character (1-based).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}, column {column}: expected {expected}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub expected: String,
}

/// Placeholder stored in a descriptive field whose label never appears.
pub fn not_found(label: &str) -> String {
    format!("<{label} not found!>")
}

/// Parse a decoded report into a complete record.
pub fn parse(raw: &str) -> Result<WeatherRecord, ParseError> {
    let mut s = Scanner::new(raw);

    let (station_place, station_state) = header(&mut s)?;
    let stamp = timestamp(&mut s)?;

    let wind = s.labelled_line(WIND);
    let visibility = s.labelled_line(VISIBILITY);
    let sky_condition = s.labelled_line(SKY_CONDITIONS);
    let (temp_f, temp_c) = temperature(&mut s)?;
    let dew_point = s.labelled_line(DEW_POINT);
    let humidity = humidity(&mut s)?;
    let pressure = pressure(&mut s)?;

    Ok(WeatherRecord {
        station_place,
        station_state,
        year: stamp.year,
        month: stamp.month,
        day: stamp.day,
        hour: stamp.hour,
        wind: wind.unwrap_or_else(|| not_found(WIND)),
        visibility: visibility.unwrap_or_else(|| not_found(VISIBILITY)),
        sky_condition: sky_condition.unwrap_or_else(|| not_found(SKY_CONDITIONS)),
        temp_c,
        temp_f,
        dew_point: dew_point.unwrap_or_else(|| not_found(DEW_POINT)),
        humidity,
        pressure,
    })
}

struct Timestamp {
    year: String,
    month: String,
    day: String,
    hour: String,
}

fn header(s: &mut Scanner<'_>) -> Result<(String, String), ParseError> {
    let place = s.take_until_in_line(',', "a comma after the station name")?;
    s.eat(',');
    s.eat(' ');
    let state = s.take_until_in_line('(', "'(' before the station code")?;
    s.skip_line();
    Ok((place.to_string(), state.to_string()))
}

fn timestamp(s: &mut Scanner<'_>) -> Result<Timestamp, ParseError> {
    s.skip_past('/', "'/' before the UTC timestamp")?;
    s.take_while(char::is_whitespace);

    let year = s.digits("a year")?;
    s.expect('.', "'.' after the year")?;
    let month = s.digits("a month")?;
    s.expect('.', "'.' after the month")?;
    let day = s.digits("a day")?;
    s.expect(' ', "a space after the day")?;
    let hours = s.fixed_digits(2, "two hour digits")?;
    let minutes = s.fixed_digits(2, "two minute digits")?;
    s.expect(' ', "a space after the time")?;

    Ok(Timestamp {
        year: year.to_string(),
        month: month.to_string(),
        day: day.to_string(),
        hour: format!("{hours}:{minutes}"),
    })
}

/// Returns `(fahrenheit, celsius)`.
fn temperature(s: &mut Scanner<'_>) -> Result<(i32, i32), ParseError> {
    s.require_label(TEMPERATURE)?;
    let fahrenheit = s.decimal("Fahrenheit temperature")?;
    s.skip_past_in_line('(', "'(' before the Celsius temperature")?;
    let celsius = s.decimal("Celsius temperature")?;
    s.skip_line();
    Ok((fahrenheit, celsius))
}

fn humidity(s: &mut Scanner<'_>) -> Result<u8, ParseError> {
    s.require_label(RELATIVE_HUMIDITY)?;
    let start = s.pos;
    let digits = s.take_while(|c| c.is_ascii_digit());
    if !(s.eat('%') || s.eat('.')) {
        return Err(s.error("'%' or '.' after the relative humidity"));
    }
    let humidity = digits
        .parse()
        .map_err(|_| s.error_at(start, "a relative humidity percentage"))?;
    s.skip_line();
    Ok(humidity)
}

fn pressure(s: &mut Scanner<'_>) -> Result<i32, ParseError> {
    s.require_label(PRESSURE)?;
    s.skip_past_in_line('(', "'(' before the pressure in hPa")?;
    let start = s.pos;
    let digits = s.take_while(|c| c.is_ascii_digit());
    s.expect(' ', "a space after the pressure")?;
    let pressure = digits
        .parse()
        .map_err(|_| s.error_at(start, "an integer pressure"))?;
    s.skip_line();
    Ok(pressure)
}

/// Cursor over the raw text. Delimiters and labels are ASCII, so byte offsets
/// always land on character boundaries.
struct Scanner<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn error(&self, expected: impl Into<String>) -> ParseError {
        self.error_at(self.pos, expected)
    }

    fn error_at(&self, offset: usize, expected: impl Into<String>) -> ParseError {
        let before = &self.text[..offset];
        let line = before.matches('\n').count() + 1;
        let column = before.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
        ParseError {
            line,
            column,
            expected: expected.into(),
        }
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char, expected: &str) -> Result<(), ParseError> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(expected))
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let len = rest.find(|c: char| !pred(c)).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    fn digits(&mut self, expected: &str) -> Result<&'a str, ParseError> {
        let digits = self.take_while(|c| c.is_ascii_digit());
        if digits.is_empty() {
            Err(self.error(expected))
        } else {
            Ok(digits)
        }
    }

    fn fixed_digits(&mut self, count: usize, expected: &str) -> Result<&'a str, ParseError> {
        let rest = self.rest();
        let ok = rest.len() >= count && rest.as_bytes()[..count].iter().all(u8::is_ascii_digit);
        if !ok {
            return Err(self.error(expected));
        }
        self.pos += count;
        Ok(&rest[..count])
    }

    /// Numeric text made of digits, `-` and `.`, terminated by a space, floored to an integer.
    fn decimal(&mut self, what: &str) -> Result<i32, ParseError> {
        let start = self.pos;
        let text = self.take_while(|c| c.is_ascii_digit() || c == '-' || c == '.');
        self.expect(' ', &format!("a space after the {what}"))?;
        text.parse::<f64>()
            .ok()
            .and_then(floor_to_i32)
            .ok_or_else(|| self.error_at(start, format!("a numeric {what}")))
    }

    fn line_end(&self) -> usize {
        self.rest().find('\n').unwrap_or(self.rest().len())
    }

    fn take_until_in_line(&mut self, delim: char, expected: &str) -> Result<&'a str, ParseError> {
        let rest = self.rest();
        let line_end = self.line_end();
        match rest[..line_end].find(delim) {
            Some(i) => {
                self.pos += i;
                Ok(&rest[..i])
            }
            None => Err(self.error_at(self.pos + line_end, expected)),
        }
    }

    fn skip_past_in_line(&mut self, delim: char, expected: &str) -> Result<(), ParseError> {
        self.take_until_in_line(delim, expected)?;
        self.pos += delim.len_utf8();
        Ok(())
    }

    fn skip_past(&mut self, delim: char, expected: &str) -> Result<(), ParseError> {
        match self.rest().find(delim) {
            Some(i) => {
                self.pos += i + delim.len_utf8();
                Ok(())
            }
            None => Err(self.error_at(self.text.len(), expected)),
        }
    }

    fn skip_line(&mut self) {
        self.pos += match self.rest().find('\n') {
            Some(i) => i + 1,
            None => self.rest().len(),
        };
    }

    /// Moves the cursor just past `label` on the first line, from here on, that
    /// starts with it. The cursor does not move when no line matches.
    fn seek_label(&mut self, label: &str) -> bool {
        let mut start = self.pos;
        loop {
            let rest = &self.text[start..];
            if rest.starts_with(label) {
                self.pos = start + label.len();
                return true;
            }
            match rest.find('\n') {
                Some(i) => start += i + 1,
                None => return false,
            }
        }
    }

    fn require_label(&mut self, label: &str) -> Result<(), ParseError> {
        if self.seek_label(label) {
            Ok(())
        } else {
            Err(self.error(format!("a line starting with {label:?}")))
        }
    }

    /// Tolerant capture of the text following `label`, up to the end of its line.
    fn labelled_line(&mut self, label: &str) -> Option<String> {
        if !self.seek_label(label) {
            return None;
        }
        let line = self.take_while(|c| c != '\n');
        self.skip_line();
        Some(line.strip_suffix('\r').unwrap_or(line).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KSFO: &str = "\
SAN FRANCISCO INTERNATIONAL AIRPORT, CA, United States (KSFO) 37-37N 122-22W 3M\n\
Jun 27, 2012 - 05:56 PM EDT / 2012.06.27 2156 UTC\n\
Wind: from the WNW (290 degrees) at 20 MPH (17 KT):0\n\
Visibility: 10 mile(s):0\n\
Sky conditions: mostly clear\n\
Temperature: 64.0 F (17.8 C)\n\
Dew Point: 53.1 F (11.7 C)\n\
Relative Humidity: 67%\n\
Pressure (altimeter): 29.95 in. Hg (1014 hPa)\n\
ob: KSFO 272156Z 29017KT 10SM FEW008 18/12 A2995 RMK AO2 SLP141 T01780117\n\
cycle: 22\n";

    fn without_line(prefix: &str) -> String {
        KSFO.lines()
            .filter(|l| !l.starts_with(prefix))
            .map(|l| format!("{l}\n"))
            .collect()
    }

    fn with_line(prefix: &str, replacement: &str) -> String {
        KSFO.lines()
            .map(|l| if l.starts_with(prefix) { replacement } else { l })
            .map(|l| format!("{l}\n"))
            .collect()
    }

    #[test]
    fn parses_full_report() {
        let record = parse(KSFO).expect("report should parse");

        assert_eq!(record.station_place, "SAN FRANCISCO INTERNATIONAL AIRPORT");
        assert_eq!(record.station_state, "CA, United States ");
        assert_eq!(record.year, "2012");
        assert_eq!(record.month, "06");
        assert_eq!(record.day, "27");
        assert_eq!(record.hour, "21:56");
        assert_eq!(record.wind, "from the WNW (290 degrees) at 20 MPH (17 KT):0");
        assert_eq!(record.visibility, "10 mile(s):0");
        assert_eq!(record.sky_condition, "mostly clear");
        assert_eq!(record.temp_f, 64);
        assert_eq!(record.temp_c, 17);
        assert_eq!(record.dew_point, "53.1 F (11.7 C)");
        assert_eq!(record.humidity, 67);
        assert_eq!(record.pressure, 1014);
    }

    #[test]
    fn temperatures_are_floored() {
        let report = with_line(TEMPERATURE, "Temperature: 32.9 F (-0.5 C)");
        let record = parse(&report).expect("report should parse");

        assert_eq!(record.temp_f, 32);
        assert_eq!(record.temp_c, -1);
    }

    #[test]
    fn missing_wind_degrades_to_placeholder() {
        let record = parse(&without_line(WIND)).expect("wind is optional");

        assert_eq!(record.wind, "<Wind:  not found!>");
        assert_eq!(record.visibility, "10 mile(s):0");
        assert_eq!(record.temp_f, 64);
    }

    #[test]
    fn all_descriptive_sections_are_optional() {
        let mut report = KSFO.to_string();
        for label in [WIND, VISIBILITY, SKY_CONDITIONS, DEW_POINT] {
            report = report
                .lines()
                .filter(|l| !l.starts_with(label))
                .map(|l| format!("{l}\n"))
                .collect();
        }

        let record = parse(&report).expect("descriptive sections are optional");
        assert_eq!(record.sky_condition, "<Sky conditions:  not found!>");
        assert_eq!(record.dew_point, "<Dew Point:  not found!>");
        assert_eq!(record.humidity, 67);
    }

    #[test]
    fn missing_temperature_is_a_hard_failure() {
        let err = parse(&without_line(TEMPERATURE)).unwrap_err();

        assert!(err.expected.contains("Temperature: "));
        assert_eq!((err.line, err.column), (6, 1));
    }

    #[test]
    fn missing_pressure_is_a_hard_failure() {
        let err = parse(&without_line(PRESSURE)).unwrap_err();
        assert!(err.expected.contains("Pressure (altimeter): "));
    }

    #[test]
    fn header_without_comma_fails_on_first_line() {
        let report = with_line("SAN FRANCISCO", "SAN FRANCISCO INTERNATIONAL AIRPORT (KSFO)");
        let err = parse(&report).unwrap_err();

        assert_eq!(err.line, 1);
        assert!(err.expected.contains("comma"));
    }

    #[test]
    fn malformed_timestamp_fails() {
        let report = with_line("Jun 27", "Jun 27, 2012 - 05:56 PM EDT / 2012-06-27 2156 UTC");
        let err = parse(&report).unwrap_err();

        assert_eq!(err.line, 2);
        assert_eq!(err.expected, "'.' after the year");
    }

    #[test]
    fn non_numeric_temperature_fails_at_the_value() {
        let report = with_line(TEMPERATURE, "Temperature: 6-4 F (17.8 C)");
        let err = parse(&report).unwrap_err();

        assert_eq!((err.line, err.column), (6, 14));
        assert_eq!(err.expected, "a numeric Fahrenheit temperature");
    }

    #[test]
    fn missing_humidity_is_a_hard_failure() {
        let err = parse(&without_line(RELATIVE_HUMIDITY)).unwrap_err();

        assert!(err.expected.contains("Relative Humidity: "));
        assert_eq!((err.line, err.column), (8, 1));
    }

    #[test]
    fn humidity_without_terminator_fails() {
        let report = with_line(RELATIVE_HUMIDITY, "Relative Humidity: 67");
        let err = parse(&report).unwrap_err();

        assert_eq!(err.expected, "'%' or '.' after the relative humidity");
        assert_eq!((err.line, err.column), (8, 22));
    }

    #[test]
    fn humidity_may_end_with_a_period() {
        let report = with_line(RELATIVE_HUMIDITY, "Relative Humidity: 100.");
        assert_eq!(parse(&report).expect("should parse").humidity, 100);
    }

    #[test]
    fn accepts_crlf_line_endings() {
        let report = KSFO.replace('\n', "\r\n");
        let record = parse(&report).expect("CRLF report should parse");

        assert_eq!(record.sky_condition, "mostly clear");
        assert_eq!(record.temp_c, 17);
        assert_eq!(record.pressure, 1014);
    }

    #[test]
    fn error_display_includes_position() {
        let err = parse("no comma here").unwrap_err();
        assert_eq!(
            err.to_string(),
            "line 1, column 14: expected a comma after the station name"
        );
    }
}
