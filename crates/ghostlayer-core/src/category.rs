//! Redaction categories
//!
//! Categories form a closed set. Each one carries static metadata: the wire
//! name used inside replacement tags, a display label and a style token for
//! whatever surface renders the matches.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Category of a detected span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    /// Phrase taught by the user
    #[serde(rename = "MEMORY", alias = "USER_MEMORY")]
    UserMemory,
    /// Match from a user-authored regular expression
    Custom,
    /// Phrase that must never be redacted
    Whitelist,
    Email,
    Phone,
    Url,
    CreditCard,
    Date,

    // Russia
    RfPassport,
    Snils,
    Inn,

    // Kazakhstan
    KzIin,
    KzId,
    KzPassport,
    KzPhone,
    KzVehicle,
    KzAddress,
    KzLegalCase,
    KzIban,

    // International
    Iban,
    BankAccount,
    PostalCode,
    LicensePlate,
    GovBody,
    Company,
    Address,

    // United States
    Ssn,
    Ein,
    RoutingNumber,
    DriverLicense,

    PersonName,
    ContractNumber,
    IdDocument,
    Bic,
}

/// Static metadata attached to a category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryMeta {
    /// Uppercase name used in replacement tags, e.g. `EMAIL` in `[EMAIL_1]`
    pub wire_name: &'static str,
    /// Human readable label
    pub label: &'static str,
    /// Style token for rendering surfaces
    pub style: &'static str,
}

impl Category {
    /// Every category, in declaration order
    pub const ALL: [Category; 34] = [
        Category::UserMemory,
        Category::Custom,
        Category::Whitelist,
        Category::Email,
        Category::Phone,
        Category::Url,
        Category::CreditCard,
        Category::Date,
        Category::RfPassport,
        Category::Snils,
        Category::Inn,
        Category::KzIin,
        Category::KzId,
        Category::KzPassport,
        Category::KzPhone,
        Category::KzVehicle,
        Category::KzAddress,
        Category::KzLegalCase,
        Category::KzIban,
        Category::Iban,
        Category::BankAccount,
        Category::PostalCode,
        Category::LicensePlate,
        Category::GovBody,
        Category::Company,
        Category::Address,
        Category::Ssn,
        Category::Ein,
        Category::RoutingNumber,
        Category::DriverLicense,
        Category::PersonName,
        Category::ContractNumber,
        Category::IdDocument,
        Category::Bic,
    ];

    /// Metadata table entry for this category
    pub const fn meta(self) -> CategoryMeta {
        let (wire_name, label, style) = match self {
            Category::UserMemory => ("MEMORY", "Memory", "teal"),
            Category::Custom => ("CUSTOM", "Custom Pattern", "pink"),
            Category::Whitelist => ("WHITELIST", "Whitelist", "slate"),
            Category::Email => ("EMAIL", "Email Address", "orange"),
            Category::Phone => ("PHONE", "Phone Number", "green"),
            Category::Url => ("URL", "URL / Website", "blue"),
            Category::CreditCard => ("CREDIT_CARD", "Credit Card", "red"),
            Category::Date => ("DATE", "Date", "yellow"),
            Category::RfPassport => ("RF_PASSPORT", "RF Passport", "purple"),
            Category::Snils => ("SNILS", "SNILS", "indigo"),
            Category::Inn => ("INN", "INN (RU)", "violet"),
            Category::KzIin => ("KZ_IIN", "IIN / BIN", "cyan"),
            Category::KzId => ("KZ_ID", "KZ ID Card", "sky"),
            Category::KzPassport => ("KZ_PASSPORT", "KZ Passport", "fuchsia"),
            Category::KzPhone => ("KZ_PHONE", "Phone (KZ)", "emerald"),
            Category::KzVehicle => ("KZ_VEHICLE", "Vehicle Plate (KZ)", "slate"),
            Category::KzAddress => ("KZ_ADDRESS", "Address (KZ)", "amber"),
            Category::KzLegalCase => ("KZ_LEGAL_CASE", "Legal Case (KZ)", "rose"),
            Category::KzIban => ("KZ_IBAN", "IBAN (KZ)", "teal"),
            Category::Iban => ("IBAN", "IBAN", "cyan"),
            Category::BankAccount => ("BANK_ACCOUNT", "Bank Account", "emerald"),
            Category::PostalCode => ("POSTAL_CODE", "Postal Code", "stone"),
            Category::LicensePlate => ("LICENSE_PLATE", "License Plate", "gray"),
            Category::GovBody => ("GOV_BODY", "Government Body", "amber"),
            Category::Company => ("COMPANY", "Company", "blue"),
            Category::Address => ("ADDRESS", "Address", "violet"),
            Category::Ssn => ("SSN", "SSN (US)", "indigo"),
            Category::Ein => ("EIN", "EIN (US)", "violet"),
            Category::RoutingNumber => ("ROUTING_NUMBER", "Routing Number", "cyan"),
            Category::DriverLicense => ("DRIVER_LICENSE", "Driver License", "red"),
            Category::PersonName => ("PERSON_NAME", "Person Name", "lime"),
            Category::ContractNumber => ("CONTRACT_NUMBER", "Contract Number", "orange"),
            Category::IdDocument => ("ID_DOCUMENT", "ID Document", "red"),
            Category::Bic => ("BIC", "BIC / SWIFT", "indigo"),
        };

        CategoryMeta {
            wire_name,
            label,
            style,
        }
    }

    /// Uppercase name used in replacement tags
    pub const fn wire_name(self) -> &'static str {
        self.meta().wire_name
    }

    /// Display label
    pub const fn label(self) -> &'static str {
        self.meta().label
    }

    /// Build the replacement tag for the `index`-th entity of this category
    pub fn tag(self, index: usize) -> String {
        format!("[{}_{}]", self.wire_name(), index)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for Category {
    type Err = Error;

    /// Parses a wire name case-insensitively. `USER_MEMORY` is accepted as an
    /// alias of `MEMORY`.
    fn from_str(s: &str) -> Result<Self> {
        let upper = s.trim().to_ascii_uppercase();
        if upper == "USER_MEMORY" {
            return Ok(Category::UserMemory);
        }

        Category::ALL
            .iter()
            .copied()
            .find(|c| c.wire_name() == upper)
            .ok_or_else(|| Error::NotFound(format!("Unknown category: {}", s)))
    }
}
