//! Domain models and form types

pub mod book;
pub mod user;

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer};

/// Deserialize an optional form field, treating an empty or blank submission
/// as absent. HTML forms always post every field, so "" is the only way a
/// browser can express "no value".
pub(crate) fn empty_string_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse::<T>().map(Some).map_err(de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "super::empty_string_as_none")]
        year: Option<i64>,
        #[serde(default, deserialize_with = "super::empty_string_as_none")]
        author: Option<String>,
    }

    #[test]
    fn blank_fields_become_none() {
        let probe: Probe = serde_urlencoded::from_str("year=&author=").unwrap();
        assert_eq!(probe.year, None);
        assert_eq!(probe.author, None);
    }

    #[test]
    fn present_fields_parse() {
        let probe: Probe = serde_urlencoded::from_str("year=1984&author=Orwell").unwrap();
        assert_eq!(probe.year, Some(1984));
        assert_eq!(probe.author.as_deref(), Some("Orwell"));
    }

    #[test]
    fn non_numeric_year_is_rejected() {
        assert!(serde_urlencoded::from_str::<Probe>("year=abc&author=").is_err());
    }
}
