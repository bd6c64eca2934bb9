//! Shipping-form validation.
//!
//! Pure, synchronous, and side-effect free: the checkout flow refuses to make
//! any network call until this passes. All violated fields are reported
//! together so the UI can show the full error list at once.

use lazy_static::lazy_static;
use regex::Regex;
use validator::Validate;

use crate::errors::FieldErrors;
use crate::models::ShippingDetails;

lazy_static! {
    /// Personal names: Unicode letters, spaces, apostrophes, hyphens.
    pub static ref RE_NAME: Regex = Regex::new(r"^[\p{L} '\-]+$").expect("name regex");
    /// City names additionally allow periods (e.g. "St. Louis").
    pub static ref RE_CITY: Regex = Regex::new(r"^[\p{L} .'\-]+$").expect("city regex");
    /// Two-letter US state postal abbreviation.
    pub static ref RE_STATE: Regex = Regex::new(r"^[A-Za-z]{2}$").expect("state regex");
    /// 5-digit or 5+4 US ZIP.
    pub static ref RE_ZIP: Regex = Regex::new(r"^\d{5}(-\d{4})?$").expect("zip regex");
    /// Phone: 7-20 characters of digits, spaces, +, - and parentheses.
    pub static ref RE_PHONE: Regex = Regex::new(r"^[0-9 ()+\-]{7,20}$").expect("phone regex");
}

/// Validates the shipping form. Returns the complete per-field error map on
/// failure; the first message per field wins when several rules are violated.
pub fn validate_shipping(details: &ShippingDetails) -> Result<(), FieldErrors> {
    match details.validate() {
        Ok(()) => Ok(()),
        Err(violations) => {
            let mut errors = FieldErrors::new();
            for (field, failures) in violations.field_errors() {
                let message = failures
                    .iter()
                    .find_map(|failure| failure.message.as_ref().map(|m| m.to_string()))
                    .unwrap_or_else(|| format!("{} is invalid", field));
                errors.insert(field, message);
            }
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_details() -> ShippingDetails {
        ShippingDetails {
            first_name: "Jane".to_string(),
            last_name: "O'Brien-Smith".to_string(),
            email: "jane@example.com".to_string(),
            address: "123 Main Street".to_string(),
            city: "St. Louis".to_string(),
            state: "MO".to_string(),
            zip_code: "63101".to_string(),
            phone: "+1 (314) 555-0100".to_string(),
        }
    }

    #[test]
    fn accepts_well_formed_details() {
        assert!(validate_shipping(&valid_details()).is_ok());
    }

    #[test]
    fn accepts_zip_plus_four_and_unicode_names() {
        let mut details = valid_details();
        details.first_name = "Zoë".to_string();
        details.zip_code = "63101-4321".to_string();
        assert!(validate_shipping(&details).is_ok());
    }

    #[test]
    fn reports_every_violated_field_not_just_the_first() {
        let mut details = valid_details();
        details.city = String::new();
        details.state = "MOO".to_string();
        details.zip_code = "ABCDE".to_string();

        let errors = validate_shipping(&details).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.get("city").is_some());
        assert!(errors.get("state").is_some());
        assert!(errors.get("zip_code").is_some());
        // untouched fields stay clean
        assert!(errors.get("email").is_none());
    }

    #[test]
    fn rejects_single_character_names() {
        let mut details = valid_details();
        details.first_name = "J".to_string();
        let errors = validate_shipping(&details).unwrap_err();
        assert!(errors.get("first_name").is_some());
    }

    #[test]
    fn rejects_numbers_in_names_and_cities() {
        let mut details = valid_details();
        details.last_name = "Sm1th".to_string();
        details.city = "C1ty".to_string();
        let errors = validate_shipping(&details).unwrap_err();
        assert!(errors.get("last_name").is_some());
        assert!(errors.get("city").is_some());
    }

    #[test]
    fn rejects_malformed_email_and_phone() {
        let mut details = valid_details();
        details.email = "not-an-email".to_string();
        details.phone = "555".to_string();
        let errors = validate_shipping(&details).unwrap_err();
        assert!(errors.get("email").is_some());
        assert!(errors.get("phone").is_some());
    }

    #[test]
    fn rejects_short_address_and_empty_fields() {
        let details = ShippingDetails::default();
        let errors = validate_shipping(&details).unwrap_err();
        // every field of the empty form is reported
        assert_eq!(errors.len(), 8);
    }
}
