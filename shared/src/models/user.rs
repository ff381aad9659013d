use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => f.write_str("admin"),
            Role::User => f.write_str("user"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    #[serde(default)]
    pub newsletter: bool,
    #[serde(default = "default_true")]
    pub notifications: bool,
    #[serde(default)]
    pub language: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            newsletter: false,
            notifications: true,
            language: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub dni: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub birth_date: NaiveDate,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub preferences: UserPreferences,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Admins count as staff for every staff-gated action.
    pub fn is_staff_or_admin(&self) -> bool {
        self.is_staff || self.is_admin()
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Age in whole years on `on`.
    pub fn age_on(&self, on: NaiveDate) -> u32 {
        age_on(self.birth_date, on)
    }
}

pub fn age_on(birth_date: NaiveDate, on: NaiveDate) -> u32 {
    if on < birth_date {
        return 0;
    }
    let mut years = on.year() - birth_date.year();
    if (on.month(), on.day()) < (birth_date.month(), birth_date.day()) {
        years -= 1;
    }
    years.max(0) as u32
}

const DNI_LETTERS: &[u8; 23] = b"TRWAGMYFPDXBNJZSQVHLCKE";

/// Validates a Spanish DNI (`12345678Z`) or NIE (`X1234567L`) including its
/// control letter.
pub fn is_valid_dni(dni: &str) -> bool {
    let dni = dni.trim().to_ascii_uppercase();
    if dni.len() != 9 || !dni.is_ascii() {
        return false;
    }

    let (body, letter) = dni.split_at(8);
    let digits = match body.as_bytes()[0] {
        b'X' => format!("0{}", &body[1..]),
        b'Y' => format!("1{}", &body[1..]),
        b'Z' => format!("2{}", &body[1..]),
        _ => body.to_string(),
    };

    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }

    let Ok(number) = digits.parse::<u32>() else {
        return false;
    };

    letter.as_bytes()[0] == DNI_LETTERS[(number % 23) as usize]
}

/// Accepts 9-digit Spanish numbers, optionally prefixed with `+34`; spaces
/// and dashes are ignored.
pub fn is_valid_phone(phone: &str) -> bool {
    let compact: String = phone
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();
    let national = compact.strip_prefix("+34").unwrap_or(&compact);
    national.len() == 9 && national.bytes().all(|b| b.is_ascii_digit())
}

pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && domain.contains('.')
                && !email.contains(char::is_whitespace)
                && !domain.contains('@')
        }
        None => false,
    }
}

/// A device registered for Expo push notifications.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PushToken {
    pub user_id: String,
    pub push_token: String,
    pub platform: String,
    pub updated_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dni_validation() {
        assert!(is_valid_dni("12345678Z"));
        assert!(is_valid_dni("12345678z"));
        assert!(is_valid_dni("00000000T"));
        assert!(!is_valid_dni("12345678A"));
        assert!(!is_valid_dni("1234567Z"));
        assert!(!is_valid_dni("ABCDEFGHZ"));
        // NIE: X -> 0
        assert!(is_valid_dni("X1234567L"));
        assert!(!is_valid_dni("X1234567A"));
    }

    #[test]
    fn test_phone_validation() {
        assert!(is_valid_phone("612345678"));
        assert!(is_valid_phone("+34 612 345 678"));
        assert!(is_valid_phone("612-34-56-78"));
        assert!(!is_valid_phone("12345"));
        assert!(!is_valid_phone("61234567a"));
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("ana@example.com"));
        assert!(!is_valid_email("ana.example.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("ana@example"));
        assert!(!is_valid_email("ana @example.com"));
    }

    #[test]
    fn test_age_on() {
        let birth = NaiveDate::from_ymd_opt(2000, 6, 15).unwrap();
        assert_eq!(age_on(birth, NaiveDate::from_ymd_opt(2018, 6, 14).unwrap()), 17);
        assert_eq!(age_on(birth, NaiveDate::from_ymd_opt(2018, 6, 15).unwrap()), 18);
        assert_eq!(age_on(birth, NaiveDate::from_ymd_opt(1999, 1, 1).unwrap()), 0);
    }
}
