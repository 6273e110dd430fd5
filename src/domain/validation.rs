use std::sync::LazyLock;

use regex::Regex;

use crate::domain::{AccountNumber, Error, Money};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("static email pattern")
});

pub fn validate_account_number(number: AccountNumber) -> Result<(), Error> {
    if number == 0 {
        return Err(Error::InvalidInput(
            "Account number must be positive".to_string(),
        ));
    }
    Ok(())
}

/// Returns the trimmed name.
pub fn validate_holder_name(name: &str) -> Result<String, Error> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::InvalidInput("Name cannot be empty".to_string()));
    }
    Ok(name.to_string())
}

/// Returns the trimmed address.
pub fn validate_email(email: &str) -> Result<String, Error> {
    let email = email.trim();
    if !EMAIL_RE.is_match(email) {
        return Err(Error::InvalidEmail(format!(
            "{email:?} does not match local@domain.tld"
        )));
    }
    Ok(email.to_string())
}

pub fn validate_amount(amount: Money) -> Result<(), Error> {
    if !amount.is_positive() {
        return Err(Error::InvalidAmount(format!(
            "Amount must be positive, got {amount}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_addresses() {
        for email in ["a@x.com", "first.last+tag@mail.example.org", " j-d_1@host.io "] {
            assert!(validate_email(email).is_ok(), "{email}");
        }
        assert_eq!(validate_email(" a@x.com ").unwrap(), "a@x.com");
    }

    #[test]
    fn rejects_malformed_addresses() {
        for email in ["", "a@x", "@x.com", "a@.c", "a x@y.com", "a@x.c", "a@@x.com"] {
            assert!(
                matches!(validate_email(email), Err(Error::InvalidEmail(_))),
                "{email}"
            );
        }
    }

    #[test]
    fn holder_name_is_trimmed_and_required() {
        assert_eq!(validate_holder_name("  Asha ").unwrap(), "Asha");
        assert!(matches!(validate_holder_name("   "), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn zero_is_not_an_account_number() {
        assert!(validate_account_number(1001).is_ok());
        assert!(matches!(validate_account_number(0), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn amounts_must_be_positive() {
        assert!(validate_amount(Money(1)).is_ok());
        assert!(matches!(validate_amount(Money::zero()), Err(Error::InvalidAmount(_))));
    }
}
