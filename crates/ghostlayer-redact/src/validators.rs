//! Identifier validators
//!
//! Pure predicates used to drop digit-pattern matches that cannot be real
//! identifiers. Every validator accepts the raw matched text, formatting
//! included, and strips non-digits itself.

use serde::{Deserialize, Serialize};

/// Signature shared by every validator wired into the pattern catalog
pub type Validator = fn(&str) -> bool;

/// Country whose identifier rules apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountryProfile {
    Kazakhstan,
    Russia,
    UnitedStates,
}

const INN10_COEFFICIENTS: [u32; 9] = [2, 4, 10, 3, 5, 9, 4, 6, 8];
const INN11_COEFFICIENTS: [u32; 10] = [7, 2, 4, 10, 3, 5, 9, 4, 6, 8];
const INN12_COEFFICIENTS: [u32; 11] = [3, 7, 2, 4, 10, 3, 5, 9, 4, 6, 8];

fn digits(text: &str) -> Vec<u32> {
    text.chars().filter_map(|c| c.to_digit(10)).collect()
}

/// Validate a card number with the Luhn algorithm
pub fn is_valid_card_number(number: &str) -> bool {
    let digits = digits(number);

    if digits.len() < 13 {
        return false;
    }

    let checksum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();

    checksum.is_multiple_of(10)
}

/// Validate a national identity number for the given country
///
/// - Kazakhstan: IIN structure (embedded birth date and century digit)
/// - United States: SSN area/group/serial ranges
/// - Russia: internal passport shape (4-digit series + 6-digit number)
pub fn is_valid_national_id(id: &str, profile: CountryProfile) -> bool {
    match profile {
        CountryProfile::Kazakhstan => is_valid_kz_iin(id),
        CountryProfile::UnitedStates => is_valid_us_ssn(id),
        CountryProfile::Russia => digits(id).len() == 10,
    }
}

/// Validate a taxpayer number for the given country
///
/// - Russia: INN check digits (10 or 12 digits)
/// - Kazakhstan: the IIN doubles as the individual tax number
/// - United States: EIN shape (9 digits, prefix other than 00)
pub fn is_valid_tax_id(id: &str, profile: CountryProfile) -> bool {
    match profile {
        CountryProfile::Russia => is_valid_ru_inn(id),
        CountryProfile::Kazakhstan => is_valid_kz_iin(id),
        CountryProfile::UnitedStates => {
            let digits = digits(id);
            digits.len() == 9 && !(digits[0] == 0 && digits[1] == 0)
        }
    }
}

/// Kazakhstan IIN/BIN structural check
///
/// Only plausibility is checked: 12 digits, month 1-12, day 1-31 and a
/// century digit 1-6. The trailing check digit is not verified.
pub fn is_valid_kz_iin(iin: &str) -> bool {
    let d = digits(iin);
    if d.len() != 12 {
        return false;
    }

    let month = d[2] * 10 + d[3];
    let day = d[4] * 10 + d[5];
    let century = d[6];

    (1..=12).contains(&month) && (1..=31).contains(&day) && (1..=6).contains(&century)
}

/// Russian INN weighted-sum check
pub fn is_valid_ru_inn(inn: &str) -> bool {
    let d = digits(inn);

    match d.len() {
        10 => inn_check_digit(&d, &INN10_COEFFICIENTS) == d[9],
        12 => {
            inn_check_digit(&d, &INN11_COEFFICIENTS) == d[10]
                && inn_check_digit(&d, &INN12_COEFFICIENTS) == d[11]
        }
        _ => false,
    }
}

fn inn_check_digit(digits: &[u32], coefficients: &[u32]) -> u32 {
    let sum: u32 = coefficients
        .iter()
        .zip(digits)
        .map(|(c, d)| c * d)
        .sum();
    (sum % 11) % 10
}

/// US SSN range check
pub fn is_valid_us_ssn(ssn: &str) -> bool {
    let digits: String = ssn.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.len() != 9 {
        return false;
    }

    // All zeros in any group
    if digits.starts_with("000") || digits[3..5] == *"00" || digits[5..9] == *"0000" {
        return false;
    }

    // 666 and 9xx areas are never issued
    if digits.starts_with("666") || digits.starts_with('9') {
        return false;
    }

    true
}
