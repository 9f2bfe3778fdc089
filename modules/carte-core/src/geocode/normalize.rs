use std::sync::LazyLock;

use regex::Regex;

use super::departments::department_name;

pub const DEFAULT_COUNTRY: &str = "France";

/// "<city> (<code>)" where code is a 2-digit department, 2A/2B, or 97x.
static RE_CITY_DEPT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<city>.+?)\s*\(\s*(?P<code>2[ABab]|97[1-6]|\d{2})\s*\)$")
        .expect("valid city/department regex")
});

/// Normalize free text into the query sent to the geocoder and used as the
/// cache key. Returns `None` for blank input.
pub fn normalize_query(text: &str) -> Option<String> {
    normalize_query_for(text, DEFAULT_COUNTRY)
}

pub fn normalize_query_for(text: &str, country: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Some(caps) = RE_CITY_DEPT.captures(text) {
        let city = caps["city"].trim();
        let code = &caps["code"];
        let department = department_name(code).unwrap_or(code);
        return Some(format!("{city}, {department}, {country}"));
    }

    Some(format!("{text}, {country}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_address_gets_country_suffix() {
        assert_eq!(
            normalize_query("1 Place Vendôme").as_deref(),
            Some("1 Place Vendôme, France")
        );
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        assert_eq!(normalize_query("  Lyon ").as_deref(), Some("Lyon, France"));
    }

    #[test]
    fn blank_is_none() {
        assert_eq!(normalize_query(""), None);
        assert_eq!(normalize_query("   "), None);
    }

    #[test]
    fn known_department_code_is_expanded() {
        assert_eq!(
            normalize_query("Rodez (12)").as_deref(),
            Some("Rodez, Aveyron, France")
        );
        assert_eq!(
            normalize_query("Saint-Malo ( 35 )").as_deref(),
            Some("Saint-Malo, Ille-et-Vilaine, France")
        );
        assert_eq!(
            normalize_query("Ajaccio (2A)").as_deref(),
            Some("Ajaccio, Corse-du-Sud, France")
        );
        assert_eq!(
            normalize_query("Saint-Denis (974)").as_deref(),
            Some("Saint-Denis, La Réunion, France")
        );
    }

    #[test]
    fn unknown_department_code_is_kept_verbatim() {
        assert_eq!(
            normalize_query("Quelquepart (99)").as_deref(),
            Some("Quelquepart, 99, France")
        );
        assert_eq!(
            normalize_query("Bastia (20)").as_deref(),
            Some("Bastia, 20, France")
        );
    }

    #[test]
    fn non_matching_parentheses_are_left_alone() {
        assert_eq!(
            normalize_query("Gîte (ancienne ferme)").as_deref(),
            Some("Gîte (ancienne ferme), France")
        );
        assert_eq!(
            normalize_query("Zone (123)").as_deref(),
            Some("Zone (123), France")
        );
    }

    #[test]
    fn country_is_configurable() {
        assert_eq!(
            normalize_query_for("Bruxelles", "Belgique").as_deref(),
            Some("Bruxelles, Belgique")
        );
        assert_eq!(
            normalize_query_for("Lille (59)", "France").as_deref(),
            Some("Lille, Nord, France")
        );
    }
}
