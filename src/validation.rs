use lazy_static::lazy_static;
use regex::Regex;

use crate::error::TrackerDbError;

/// Longest accepted name, login or real name, in characters.
pub const MAX_NAME_LENGTH: usize = 127;

/// Inactivity timeouts are whole minutes below one hour.
pub const MAX_INACTIVITY_TIMEOUT: u32 = 60 * 60;

lazy_static! {
    static ref EMAIL_ADDRESS: Regex = Regex::new(concat!(
        r#"^(?:[a-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[a-z0-9!#$%&'*+/=?^_`{|}~-]+)*"#,
        r#"|"(?:[\x01-\x08\x0b\x0c\x0e-\x1f\x21\x23-\x5b\x5d-\x7f]|\\[\x01-\x09\x0b\x0c\x0e-\x7f])*")"#,
        r"@(?:(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+[a-z0-9](?:[a-z0-9-]*[a-z0-9])?",
        r"|\[(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\])$",
    ))
    .unwrap_or_else(|err| panic!("e-mail pattern failed to compile: {err}"));
}

/// Printable: no control characters and no DEL.
fn is_printable(c: char) -> bool {
    !c.is_control()
}

/// Rules for single-line names: non-empty, trimmed, printable, bounded.
#[must_use]
pub fn is_valid_name(value: &str) -> bool {
    !value.is_empty()
        && value.trim() == value
        && value.chars().count() <= MAX_NAME_LENGTH
        && value.chars().all(is_printable)
}

/// Free text: printable, plus newlines and tabs.
#[must_use]
pub fn is_valid_description(value: &str) -> bool {
    value
        .chars()
        .all(|c| is_printable(c) || c == '\n' || c == '\t')
}

#[must_use]
pub fn is_valid_email_address(value: &str) -> bool {
    EMAIL_ADDRESS.is_match(value)
}

/// Checks property values of one object type before they reach the engine.
pub trait Validator {
    const TYPE_NAME: &'static str;

    /// Turn a failed check into `TrackerDbError::InvalidProperty`.
    ///
    /// # Errors
    /// Returns `TrackerDbError::InvalidProperty` when `valid` is false.
    fn check(valid: bool, property: &'static str, value: impl ToString) -> Result<(), TrackerDbError> {
        if valid {
            Ok(())
        } else {
            Err(TrackerDbError::InvalidProperty {
                type_name: Self::TYPE_NAME,
                property,
                value: value.to_string(),
            })
        }
    }
}

pub struct ActivityTypeValidator;

impl Validator for ActivityTypeValidator {
    const TYPE_NAME: &'static str = "ActivityType";
}

impl ActivityTypeValidator {
    /// # Errors
    /// Returns `TrackerDbError::InvalidProperty` for an invalid name.
    pub fn name(name: &str) -> Result<(), TrackerDbError> {
        Self::check(is_valid_name(name), "name", name)
    }

    /// # Errors
    /// Returns `TrackerDbError::InvalidProperty` for an invalid description.
    pub fn description(description: &str) -> Result<(), TrackerDbError> {
        Self::check(is_valid_description(description), "description", description)
    }
}

pub struct UserValidator;

impl Validator for UserValidator {
    const TYPE_NAME: &'static str = "User";
}

impl UserValidator {
    /// # Errors
    /// Returns `TrackerDbError::InvalidProperty` for an invalid real name.
    pub fn real_name(real_name: &str) -> Result<(), TrackerDbError> {
        Self::check(is_valid_name(real_name), "real_name", real_name)
    }

    /// # Errors
    /// Returns `TrackerDbError::InvalidProperty` outside `1..3600`.
    pub fn inactivity_timeout(timeout: Option<u32>) -> Result<(), TrackerDbError> {
        let valid = timeout.is_none_or(|t| (1..MAX_INACTIVITY_TIMEOUT).contains(&t));
        Self::check(valid, "inactivity_timeout", format!("{timeout:?}"))
    }

    /// # Errors
    /// Returns `TrackerDbError::InvalidProperty` naming the first bad address.
    pub fn email_addresses(addresses: &[String]) -> Result<(), TrackerDbError> {
        addresses
            .iter()
            .try_for_each(|a| Self::check(is_valid_email_address(a), "email_addresses", a))
    }
}

pub struct AccountValidator;

impl Validator for AccountValidator {
    const TYPE_NAME: &'static str = "Account";
}

impl AccountValidator {
    /// # Errors
    /// Returns `TrackerDbError::InvalidProperty` for an invalid login.
    pub fn login(login: &str) -> Result<(), TrackerDbError> {
        Self::check(is_valid_name(login), "login", login)
    }

    /// # Errors
    /// Returns `TrackerDbError::InvalidProperty` naming the first bad address.
    pub fn email_addresses(addresses: &[String]) -> Result<(), TrackerDbError> {
        addresses
            .iter()
            .try_for_each(|a| Self::check(is_valid_email_address(a), "email_addresses", a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names() {
        assert!(is_valid_name("Design review"));
        assert!(is_valid_name(&"x".repeat(127)));
        assert!(!is_valid_name(&"x".repeat(128)));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name(" padded"));
        assert!(!is_valid_name("tab\there"));
        assert!(!is_valid_name("del\u{7f}"));
    }

    #[test]
    fn descriptions_allow_newlines_and_tabs() {
        assert!(is_valid_description(""));
        assert!(is_valid_description("line one\n\tline two"));
        assert!(!is_valid_description("bell\u{7}"));
        assert!(!is_valid_description("cr\r"));
    }

    #[test]
    fn email_addresses() {
        assert!(is_valid_email_address("ann@example.com"));
        assert!(is_valid_email_address("first.last+tag@mail.example.org"));
        assert!(is_valid_email_address("x@[192.168.0.1]"));
        assert!(!is_valid_email_address("no-at-sign"));
        assert!(!is_valid_email_address("trailing@example."));
        assert!(!is_valid_email_address("a@b.com extra"));
    }

    #[test]
    fn inactivity_timeout_range() {
        assert!(UserValidator::inactivity_timeout(None).is_ok());
        assert!(UserValidator::inactivity_timeout(Some(1)).is_ok());
        assert!(UserValidator::inactivity_timeout(Some(3599)).is_ok());
        let err = UserValidator::inactivity_timeout(Some(0)).unwrap_err();
        assert!(matches!(
            err,
            TrackerDbError::InvalidProperty { type_name: "User", property: "inactivity_timeout", .. }
        ));
        assert!(UserValidator::inactivity_timeout(Some(3600)).is_err());
    }

    #[test]
    fn validator_reports_offending_value() {
        match ActivityTypeValidator::name(" bad") {
            Err(TrackerDbError::InvalidProperty { type_name, property, value }) => {
                assert_eq!((type_name, property, value.as_str()), ("ActivityType", "name", " bad"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn account_logins_follow_name_rules() {
        assert!(AccountValidator::login("admin").is_ok());
        assert!(matches!(
            AccountValidator::login(""),
            Err(TrackerDbError::InvalidProperty { type_name: "Account", property: "login", .. })
        ));
        assert!(AccountValidator::login(&"a".repeat(128)).is_err());
        assert!(AccountValidator::email_addresses(&["ops@example.com".into()]).is_ok());
        assert!(AccountValidator::email_addresses(&["ops".into()]).is_err());
    }
}
