//! Input validation utilities
//!
//! Structural rules for usernames and passwords, and a heuristic password
//! strength scorer. The scorer is a simple additive heuristic over length and
//! character classes; it is not an entropy estimate and gives no
//! cryptographic guarantee.

use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::OnceLock;

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 20;
pub const PASSWORD_MIN_LEN: usize = 8;
/// Inclusive, so a 24-character password is accepted
pub const PASSWORD_MAX_LEN: usize = 24;

/// Characters that count as "special" in passwords
pub const SPECIAL_CHARACTERS: &str = "!@#$%^&*()-_=+[]{};:'\",.<>/?\\|`~";

/// Passwords rejected by the strength scorer regardless of structure
const BUILTIN_COMMON_PASSWORDS: &[&str] = &[
    "password",
    "Password1",
    "Password1!",
    "Password123",
    "Password123!",
    "P@ssw0rd",
    "P@ssword1",
    "Passw0rd!",
    "123456",
    "12345678",
    "123456789",
    "1234567890",
    "qwerty",
    "Qwerty123!",
    "qwerty123",
    "abc123",
    "111111",
    "123123",
    "iloveyou",
    "letmein",
    "Letmein1!",
    "welcome",
    "Welcome1!",
    "Welcome123!",
    "admin",
    "Admin123!",
    "monkey",
    "dragon",
    "football",
    "sunshine",
];

fn is_special(c: char) -> bool {
    SPECIAL_CHARACTERS.contains(c)
}

/// Validate username
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username is required".to_string());
    }

    let len = username.chars().count();
    if len < USERNAME_MIN_LEN {
        return Err(format!(
            "Username must be at least {} characters long",
            USERNAME_MIN_LEN
        ));
    }

    if len > USERNAME_MAX_LEN {
        return Err(format!(
            "Username must be at most {} characters long",
            USERNAME_MAX_LEN
        ));
    }

    static USERNAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = USERNAME_REGEX
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9]+$").expect("Failed to compile username regex"));

    if !regex.is_match(username) {
        return Err("Username can only contain letters and numbers".to_string());
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    let len = password.chars().count();
    if len < PASSWORD_MIN_LEN {
        return Err(format!(
            "Password must be at least {} characters long",
            PASSWORD_MIN_LEN
        ));
    }

    if len > PASSWORD_MAX_LEN {
        return Err(format!(
            "Password must be at most {} characters long",
            PASSWORD_MAX_LEN
        ));
    }

    let mut has_upper = false;
    let mut has_lower = false;
    let mut has_digit = false;
    let mut has_special = false;

    for c in password.chars() {
        if c.is_ascii_uppercase() {
            has_upper = true;
        } else if c.is_ascii_lowercase() {
            has_lower = true;
        } else if c.is_ascii_digit() {
            has_digit = true;
        } else if is_special(c) {
            has_special = true;
        }
    }

    if !has_upper {
        return Err("Password must contain at least one uppercase letter".to_string());
    }

    if !has_lower {
        return Err("Password must contain at least one lowercase letter".to_string());
    }

    if !has_digit {
        return Err("Password must contain at least one digit".to_string());
    }

    if !has_special {
        return Err(format!(
            "Password must contain at least one special character ({})",
            SPECIAL_CHARACTERS
        ));
    }

    Ok(())
}

/// 3 to 20 ASCII letters or digits
pub fn valid_username(username: &str) -> bool {
    validate_username(username).is_ok()
}

/// 8 to 24 characters with upper, lower, digit and special character
pub fn valid_password(password: &str) -> bool {
    validate_password(password).is_ok()
}

/// Denylist of known weak passwords
#[derive(Debug, Clone)]
pub struct CommonPasswords {
    entries: HashSet<String>,
}

impl CommonPasswords {
    /// Built-in list only
    pub fn builtin() -> Self {
        Self::with_extra(std::iter::empty::<String>())
    }

    /// Built-in list extended with configured entries
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut entries: HashSet<String> = BUILTIN_COMMON_PASSWORDS
            .iter()
            .map(|p| p.to_string())
            .collect();
        for password in extra {
            let password: String = password.into();
            if !password.is_empty() {
                entries.insert(password);
            }
        }
        Self { entries }
    }

    pub fn contains(&self, password: &str) -> bool {
        self.entries.contains(password)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CommonPasswords {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Outcome of the strength heuristic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PasswordStrength {
    Weak,
    Medium,
    Strong,
    /// Exact match in the denylist
    CommonlyUsed,
}

impl PasswordStrength {
    pub fn message(&self) -> &'static str {
        match self {
            PasswordStrength::Weak => "Weak password.",
            PasswordStrength::Medium => "Medium password.",
            PasswordStrength::Strong => "Strong password.",
            PasswordStrength::CommonlyUsed => {
                "This password is commonly used. Please choose another one."
            }
        }
    }
}

/// Additive score: length bonus plus character-class bonuses
pub fn score(password: &str) -> u32 {
    let len = password.chars().count();
    let mut score = if len > 20 {
        10
    } else if len > 16 {
        5
    } else {
        0
    };

    let digits = password.chars().filter(|c| c.is_ascii_digit()).count();
    let specials = password.chars().filter(|c| is_special(*c)).count();
    let uppers = password.chars().filter(|c| c.is_ascii_uppercase()).count();

    if digits > 2 {
        score += 10;
    }
    if specials > 1 {
        score += 10;
    }
    if uppers > 2 {
        score += 10;
    }

    score
}

/// Rate a password; denylisted passwords short-circuit to `CommonlyUsed`
pub fn strength_score(password: &str, common: &CommonPasswords) -> PasswordStrength {
    if common.contains(password) {
        return PasswordStrength::CommonlyUsed;
    }

    match score(password) {
        s if s >= 25 => PasswordStrength::Strong,
        s if s >= 10 => PasswordStrength::Medium,
        _ => PasswordStrength::Weak,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_length_bounds() {
        assert!(!valid_username("ab"));
        assert!(valid_username("abc"));
        assert!(valid_username(&"a".repeat(20)));
        assert!(!valid_username(&"a".repeat(21)));
    }

    #[test]
    fn test_username_rejects_non_alphanumeric() {
        assert!(valid_username("Alice123"));
        assert!(!valid_username("alice_123"));
        assert!(!valid_username("alice 123"));
        assert!(!valid_username("alice-123"));
        assert!(!valid_username("alice¡123"));
        assert!(!valid_username(""));
    }

    #[test]
    fn test_password_examples() {
        assert!(!valid_password("short1!"));
        assert!(valid_password("Abcdef1!"));
        assert!(!valid_password("alllowercase1!"));
        assert!(!valid_password("NOLOWER123!"));
        assert!(!valid_password("NoDigitsHere!"));
        assert!(!valid_password("NoSpecial123"));
    }

    #[test]
    fn test_password_upper_bound_is_inclusive() {
        let twenty_four = format!("Aa1!{}", "x".repeat(20));
        let twenty_five = format!("Aa1!{}", "x".repeat(21));
        assert_eq!(twenty_four.chars().count(), 24);

        assert!(valid_password(&twenty_four));
        assert!(!valid_password(&twenty_five));
    }

    #[test]
    fn test_validate_password_explains_first_violation() {
        assert_eq!(
            validate_password("NoSpecial123").unwrap_err(),
            format!(
                "Password must contain at least one special character ({})",
                SPECIAL_CHARACTERS
            )
        );
        assert_eq!(
            validate_password("").unwrap_err(),
            "Password is required".to_string()
        );
    }

    #[test]
    fn test_denylisted_password_short_circuits() {
        let common = CommonPasswords::builtin();
        assert!(valid_password("Password1!"));
        assert_eq!(
            strength_score("Password1!", &common),
            PasswordStrength::CommonlyUsed
        );
    }

    #[test]
    fn test_configured_entries_extend_denylist() {
        let common = CommonPasswords::with_extra(["Summer2024!"]);
        assert!(common.contains("Summer2024!"));
        assert!(common.contains("Password1!"));
        assert_eq!(common.len(), CommonPasswords::builtin().len() + 1);
    }

    #[test]
    fn test_length_bonus_is_not_cumulative() {
        assert_eq!(score("abcdefghijklmnop"), 0);
        assert_eq!(score("abcdefghijklmnopq"), 5);
        assert_eq!(score("abcdefghijklmnopqrst"), 5);
        assert_eq!(score("abcdefghijklmnopqrstu"), 10);
    }

    #[test]
    fn test_class_bonuses_need_more_than_threshold() {
        assert_eq!(score("ab12"), 0);
        assert_eq!(score("ab123"), 10);
        assert_eq!(score("ab!"), 0);
        assert_eq!(score("ab!?"), 10);
        assert_eq!(score("ABc"), 0);
        assert_eq!(score("ABCd"), 10);
    }

    #[test]
    fn test_strength_bands() {
        let common = CommonPasswords::builtin();
        assert_eq!(strength_score("Abcdef1!", &common), PasswordStrength::Weak);
        assert_eq!(strength_score("Abcdef123!", &common), PasswordStrength::Medium);
        assert_eq!(strength_score("ABCdef123!?", &common), PasswordStrength::Strong);
        assert_eq!(
            strength_score("Abcdefghijklmnopqrst1!", &common),
            PasswordStrength::Medium
        );
    }
}
