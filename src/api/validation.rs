//! Purpose: Client-side input validation, mirroring the backend's rules.
//! Exports: `validate_email`, `validate_password`, `validate_username`,
//! `validate_isbn`, `MAX_SEARCH_TAGS`.
//! Role: Catch bad input before a request is built; the backend re-validates.
//! Invariants: Rules stay at least as strict as the deployed backend's.
#![allow(clippy::result_large_err)]

use crate::error::{Error, ErrorKind};

/// The search endpoint caps tag filters at three; enforced client-side.
pub const MAX_SEARCH_TAGS: usize = 3;

const PASSWORD_SPECIALS: &str = "!@#$%^&*";

/// Shape check only: something@something.tld with no whitespace.
pub fn validate_email(email: &str) -> Result<(), Error> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
                && !domain.contains('@')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(Error::new(ErrorKind::Usage).with_message("invalid email address"))
    }
}

/// At least 8 chars with a letter, a digit, and one of `!@#$%^&*`; no spaces.
pub fn validate_password(password: &str) -> Result<(), Error> {
    if password.contains(' ') {
        return Err(Error::new(ErrorKind::Usage).with_message("password must not contain spaces"));
    }
    if password.chars().count() < 8 {
        return Err(
            Error::new(ErrorKind::Usage).with_message("password must be at least 8 characters")
        );
    }
    if !password.chars().any(|c| c.is_ascii_alphabetic()) {
        return Err(Error::new(ErrorKind::Usage).with_message("password must contain a letter"));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(Error::new(ErrorKind::Usage).with_message("password must contain a digit"));
    }
    if !password.chars().any(|c| PASSWORD_SPECIALS.contains(c)) {
        return Err(Error::new(ErrorKind::Usage)
            .with_message(format!("password must contain one of {PASSWORD_SPECIALS}")));
    }
    Ok(())
}

/// 2 to 20 chars: ASCII alphanumeric, Hangul syllables, or underscore.
pub fn validate_username(username: &str) -> Result<(), Error> {
    let count = username.chars().count();
    if !(2..=20).contains(&count) {
        return Err(
            Error::new(ErrorKind::Usage).with_message("username must be 2 to 20 characters")
        );
    }
    let allowed = username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || ('\u{AC00}'..='\u{D7A3}').contains(&c));
    if allowed {
        Ok(())
    } else {
        Err(Error::new(ErrorKind::Usage)
            .with_message("username may only contain letters, Hangul, digits, and underscores"))
    }
}

/// 10 or 13 digits, no hyphens.
pub fn validate_isbn(isbn: &str) -> Result<(), Error> {
    if !(isbn.len() == 10 || isbn.len() == 13) {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("isbn must be 10 or 13 digits without hyphens"));
    }
    if !isbn.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::new(ErrorKind::Usage).with_message("isbn must contain only digits"));
    }
    Ok(())
}
