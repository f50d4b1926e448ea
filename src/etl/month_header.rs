/// Month header parsing for the row-2 column headers
///
/// Headers are free text ("TRX 3/24", "Jan-24", "Realisasi Maret 2024 03/2024").
/// The header is split on whitespace and each token is tried in order; the first
/// token that yields a month wins. Per token:
/// 1. `M/YY` or `M/YYYY` (two-digit years map to 2000 + YY)
/// 2. the ordered patterns: month name + year, `MM/YYYY`, `MM-YYYY`, `MM-YY`, `MMM-YY`
/// 3. month name + year spread over the token and the one after it ("Jan 2024")
///
/// A header with no recognisable token falls back to the month of the parser's
/// `today` date. That fallback is deliberate and silent (no run warning).
use chrono::{Local, Month, NaiveDate};
use regex::Regex;
use tracing::debug;

use crate::etl::models::CalendarMonth;

#[derive(Debug, Clone, Copy)]
enum PatternKind {
    /// "January 2024", "Jan 2024"
    MonthNameYear,
    /// "03/2024", "3/2024", "03-2024", "3-2024"
    NumericMonthYear,
    /// "03-24", "3-24"
    NumericMonthShortYear,
    /// "Jan-24"
    MonthNameShortYear,
}

#[derive(Debug, Clone)]
struct HeaderPattern {
    regex: Regex,
    kind: PatternKind,
}

#[derive(Debug, Clone)]
pub struct MonthHeaderParser {
    today: NaiveDate,
    patterns: Vec<HeaderPattern>,
}

impl MonthHeaderParser {
    /// Parser whose fallback month is `today`'s month
    pub fn new(today: NaiveDate) -> Self {
        let pattern = |re: &str, kind| HeaderPattern {
            // Patterns are literals; a failure here is a programming error caught by the tests
            regex: Regex::new(re).unwrap_or_else(|e| panic!("invalid month pattern {re}: {e}")),
            kind,
        };

        Self {
            today,
            patterns: vec![
                pattern(r"^([A-Za-z]{3,})\s+(\d{4})$", PatternKind::MonthNameYear),
                pattern(r"^(\d{1,2})[/-](\d{4})$", PatternKind::NumericMonthYear),
                pattern(r"^(\d{1,2})-(\d{2})$", PatternKind::NumericMonthShortYear),
                pattern(r"^([A-Za-z]{3})-(\d{2})$", PatternKind::MonthNameShortYear),
            ],
        }
    }

    /// Parser whose fallback month is the current local month
    pub fn from_clock() -> Self {
        Self::new(Local::now().date_naive())
    }

    /// Parse a header into its calendar month, falling back to `today`'s month
    pub fn parse(&self, header: &str) -> CalendarMonth {
        match self.try_parse(header) {
            Some(month) => month,
            None => self.fallback_month(header),
        }
    }

    /// Like [`parse`](Self::parse) but `None` instead of the fallback month
    pub fn try_parse(&self, header: &str) -> Option<CalendarMonth> {
        let tokens: Vec<&str> = header.split_whitespace().collect();
        tokens.iter().enumerate().find_map(|(idx, token)| {
            self.parse_token(token).or_else(|| {
                tokens
                    .get(idx + 1)
                    .and_then(|next| self.parse_candidate(&format!("{token} {next}")))
            })
        })
    }

    fn parse_token(&self, token: &str) -> Option<CalendarMonth> {
        parse_slash_month(token).or_else(|| self.parse_candidate(token))
    }

    fn parse_candidate(&self, candidate: &str) -> Option<CalendarMonth> {
        self.patterns.iter().find_map(|pattern| {
            let caps = pattern.regex.captures(candidate)?;
            let first = caps.get(1)?.as_str();
            let second = caps.get(2)?.as_str();

            match pattern.kind {
                PatternKind::MonthNameYear => {
                    CalendarMonth::new(second.parse().ok()?, month_from_name(first)?)
                }
                PatternKind::NumericMonthYear => {
                    CalendarMonth::new(second.parse().ok()?, first.parse().ok()?)
                }
                PatternKind::NumericMonthShortYear => {
                    CalendarMonth::new(2000 + second.parse::<i32>().ok()?, first.parse().ok()?)
                }
                PatternKind::MonthNameShortYear => CalendarMonth::new(
                    2000 + second.parse::<i32>().ok()?,
                    month_from_name(first)?,
                ),
            }
        })
    }

    fn fallback_month(&self, header: &str) -> CalendarMonth {
        let month = CalendarMonth::from(self.today);
        debug!(
            "No month token in header '{}', falling back to {}",
            header, month
        );
        month
    }
}

impl Default for MonthHeaderParser {
    fn default() -> Self {
        Self::from_clock()
    }
}

/// `M/YY` or `M/YYYY`: exactly two numeric parts separated by one slash
fn parse_slash_month(token: &str) -> Option<CalendarMonth> {
    let (month, year) = token.split_once('/')?;
    if month.is_empty()
        || year.is_empty()
        || !month.bytes().all(|b| b.is_ascii_digit())
        || !year.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }

    let month: u32 = month.parse().ok()?;
    let year: i32 = year.parse().ok()?;
    let year = if year < 100 { 2000 + year } else { year };
    CalendarMonth::new(year, month)
}

/// English month name, full or three-letter, any case
fn month_from_name(name: &str) -> Option<u32> {
    name.parse::<Month>().ok().map(|m| m.number_from_month())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> MonthHeaderParser {
        MonthHeaderParser::new(NaiveDate::from_ymd_opt(2025, 7, 19).unwrap())
    }

    fn month(year: i32, month: u32) -> CalendarMonth {
        CalendarMonth::new(year, month).unwrap()
    }

    #[test]
    fn test_slash_two_digit_year() {
        assert_eq!(parser().parse("3/24"), month(2024, 3));
        assert_eq!(parser().parse("12/99"), month(2099, 12));
        assert_eq!(parser().parse("1/00"), month(2000, 1));
    }

    #[test]
    fn test_slash_four_digit_year() {
        assert_eq!(parser().parse("03/2023"), month(2023, 3));
        assert_eq!(parser().parse("11/2024"), month(2024, 11));
    }

    #[test]
    fn test_dash_patterns() {
        assert_eq!(parser().parse("03-2024"), month(2024, 3));
        assert_eq!(parser().parse("3-2024"), month(2024, 3));
        assert_eq!(parser().parse("03-24"), month(2024, 3));
        assert_eq!(parser().parse("7-23"), month(2023, 7));
        assert_eq!(parser().parse("Jan-24"), month(2024, 1));
        assert_eq!(parser().parse("dec-23"), month(2023, 12));
    }

    #[test]
    fn test_two_digit_dash_years_have_no_century_window() {
        assert_eq!(parser().parse("03-99"), month(2099, 3));
        assert_eq!(parser().parse("Mar-99"), month(2099, 3));
    }

    #[test]
    fn test_month_name_and_year_across_tokens() {
        assert_eq!(parser().parse("January 2024"), month(2024, 1));
        assert_eq!(parser().parse("Sep 2023"), month(2023, 9));
        assert_eq!(parser().parse("TRX OCTOBER 2022"), month(2022, 10));
    }

    #[test]
    fn test_first_matching_token_wins() {
        assert_eq!(parser().parse("TRX 3/24 4/24"), month(2024, 3));
        assert_eq!(parser().parse("Realisasi 02/2024 Jan-24"), month(2024, 2));
    }

    #[test]
    fn test_invalid_slash_month_is_not_a_match() {
        // 13/24 is not a month; the next token still gets a chance
        assert_eq!(parser().parse("13/24 5/24"), month(2024, 5));
    }

    #[test]
    fn test_unparseable_header_falls_back_to_today() {
        assert_eq!(parser().parse("Keterangan"), month(2025, 7));
        assert_eq!(parser().parse("Bulan ke-3"), month(2025, 7));
        assert_eq!(parser().parse(""), month(2025, 7));
    }

    #[test]
    fn test_fallback_follows_injected_date() {
        let fixed = MonthHeaderParser::new(NaiveDate::from_ymd_opt(2019, 2, 28).unwrap());
        assert_eq!(fixed.parse("no month here"), month(2019, 2));
    }

    #[test]
    fn test_try_parse_has_no_fallback() {
        assert_eq!(parser().try_parse("Total"), None);
        assert_eq!(parser().try_parse("Mar-24"), Some(month(2024, 3)));
    }

    #[test]
    fn test_non_month_names_are_rejected() {
        assert_eq!(parser().try_parse("Foo 2024"), None);
        assert_eq!(parser().try_parse("Janu 2024"), None);
    }
}
