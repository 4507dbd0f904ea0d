//! Date filter values: `day.month.year` in, ISO predicates out.

use chrono::NaiveDate;

use super::error::QueryError;
use crate::record::ISO_DATE_FORMAT;

const COMPARISON_CHARS: [char; 3] = ['<', '>', '='];

/// Converts `d.m.yy` or `d.m.yyyy` into `yyyy-mm-dd`.
///
/// Two-digit years are read as 20yy.
pub(crate) fn normalize_date(text: &str) -> Option<String> {
    let mut parts = text.trim().split('.');
    let day = parts.next()?.parse::<u32>().ok()?;
    let month = parts.next()?.parse::<u32>().ok()?;
    let year_text = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    let year = match year_text.len() {
        2 => 2000 + year_text.parse::<i32>().ok()?,
        4 => year_text.parse::<i32>().ok()?,
        _ => return None,
    };
    NaiveDate::from_ymd_opt(year, month, day).map(|date| date.format(ISO_DATE_FORMAT).to_string())
}

/// Builds the predicate for a date filter on `column`.
///
/// `=V`, `<V`, `<=V`, `>V`, `>=V` compare, `A-B` is an inclusive range, and a
/// bare value is an equality test.
pub(crate) fn date_predicate(token: &str, column: &str, value: &str) -> Result<String, QueryError> {
    let normalize = |text: &str| {
        normalize_date(text).ok_or_else(|| QueryError::invalid_date(token, text))
    };

    if value.contains(COMPARISON_CHARS) {
        let split = if value.get(1..2).is_some_and(|c| c.contains(COMPARISON_CHARS)) {
            2
        } else {
            1
        };
        let (operator, operand) = value
            .split_at_checked(split)
            .ok_or_else(|| QueryError::invalid_date(token, value))?;
        let date = normalize(operand)?;
        return Ok(format!("({column} {operator} '{date}')"));
    }

    if let Some((start, end)) = value.split_once('-') {
        let start = normalize(start)?;
        let end = normalize(end)?;
        return Ok(format!("({column} >= '{start}' and {column} <= '{end}')"));
    }

    let date = normalize(value)?;
    Ok(format!("({column} = '{date}')"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_two_digit_year_is_2000s() {
        assert_eq!(normalize_date("1.2.23").unwrap(), "2023-02-01");
        assert_eq!(normalize_date("31.12.99").unwrap(), "2099-12-31");
    }

    #[test]
    fn test_normalize_four_digit_year_and_padding() {
        assert_eq!(normalize_date("05.07.2021").unwrap(), "2021-07-05");
        assert_eq!(normalize_date("5.7.2021").unwrap(), "2021-07-05");
    }

    #[test]
    fn test_normalize_rejects_malformed() {
        assert!(normalize_date("").is_none());
        assert!(normalize_date("1.2").is_none());
        assert!(normalize_date("1.2.3.4").is_none());
        assert!(normalize_date("a.b.cc").is_none());
        assert!(normalize_date("1.2.123").is_none());
        assert!(normalize_date("31.2.23").is_none());
    }

    #[test]
    fn test_comparison_operators() {
        assert_eq!(
            date_predicate("datum:>=1.1.23", "date", ">=1.1.23").unwrap(),
            "(date >= '2023-01-01')"
        );
        assert_eq!(
            date_predicate("datum:<1.1.23", "date", "<1.1.23").unwrap(),
            "(date < '2023-01-01')"
        );
        assert_eq!(
            date_predicate("datum:=1.1.23", "date", "=1.1.23").unwrap(),
            "(date = '2023-01-01')"
        );
    }

    #[test]
    fn test_range() {
        assert_eq!(
            date_predicate("datum:01.01.23-31.01.23", "date", "01.01.23-31.01.23").unwrap(),
            "(date >= '2023-01-01' and date <= '2023-01-31')"
        );
    }

    #[test]
    fn test_bare_value_is_equality() {
        assert_eq!(
            date_predicate("date:24.12.2022", "date", "24.12.2022").unwrap(),
            "(date = '2022-12-24')"
        );
    }

    #[test]
    fn test_malformed_value_reports_token() {
        let error = date_predicate("datum:>=gestern", "date", ">=gestern").unwrap_err();
        assert_eq!(error, QueryError::invalid_date("datum:>=gestern", "gestern"));
    }

    #[test]
    fn test_operator_without_date_is_rejected() {
        assert!(date_predicate("datum:>", "date", ">").is_err());
    }
}
