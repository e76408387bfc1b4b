//! Pattern library
//!
//! The ordered catalog of built-in detection rules and the generator that
//! turns a literal learned phrase into a boundary-aware regular expression.
//!
//! Catalog order matters only for determinism: overlap resolution ranks
//! candidates by span length, so contextual rules ("BIN: 123...") beat the
//! bare identifier they contain simply by being longer.

use ghostlayer_core::Category;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::error;

use crate::validators::{
    is_valid_card_number, is_valid_kz_iin, is_valid_ru_inn, is_valid_us_ssn, Validator,
};

/// Inspects the text that follows a match; the match is dropped when it
/// returns false
pub type TrailingGuard = fn(&str) -> bool;

/// A compiled built-in detection rule
#[derive(Debug)]
pub struct SystemPattern {
    /// Stable rule id, reported as `Match::rule_id`
    pub id: &'static str,

    /// Display label
    pub label: &'static str,

    pub category: Category,

    pub regex: Regex,

    /// Drops candidates that fail a structural or checksum test
    pub validator: Option<Validator>,

    /// Context check on the text after the match
    pub trailing_guard: Option<TrailingGuard>,
}

impl SystemPattern {
    /// Whether a raw regex hit should become a candidate
    pub fn accepts(&self, matched: &str, rest: &str) -> bool {
        self.validator.is_none_or(|validate| validate(matched))
            && self.trailing_guard.is_none_or(|guard| guard(rest))
    }
}

struct PatternSpec {
    id: &'static str,
    label: &'static str,
    category: Category,
    source: &'static str,
    validator: Option<Validator>,
    trailing_guard: Option<TrailingGuard>,
}

const fn spec(
    id: &'static str,
    label: &'static str,
    category: Category,
    source: &'static str,
) -> PatternSpec {
    PatternSpec {
        id,
        label,
        category,
        source,
        validator: None,
        trailing_guard: None,
    }
}

const fn validated(
    id: &'static str,
    label: &'static str,
    category: Category,
    source: &'static str,
    validator: Validator,
) -> PatternSpec {
    PatternSpec {
        id,
        label,
        category,
        source,
        validator: Some(validator),
        trailing_guard: None,
    }
}

// Plain credit-card, RF passport, EIN, IBAN and date rules are pure shape
// matches with no checksum and will flag coincidental digit runs.
const CATALOG: &[PatternSpec] = &[
    // Contextual anchors
    spec(
        "contract_number_en",
        "Contract/Agreement No (EN)",
        Category::ContractNumber,
        r"(?i)(?:Agreement|Contract|Policy|Reference)\s*(?:No\.?|Number|#)?\s*:?\s*[A-Z0-9]{2,10}[-/][A-Z0-9\-/]+",
    ),
    spec(
        "contract_number",
        "Contract Number",
        Category::ContractNumber,
        r"(?i)№\s*[\dА-Яа-яA-Za-z\-/]+(?:\s+от\s+\d{1,2}[.\s]+[а-яА-Я]+\s+\d{4})?",
    ),
    spec(
        "id_document",
        "ID Document Number",
        Category::IdDocument,
        r"(?i)(?:Удостоверение\s+личности|паспорт|документ)\s*:?\s*№?\s*\d{6,12}",
    ),
    spec(
        "bic_code",
        "BIC/SWIFT Code",
        Category::Bic,
        r"(?i)(?:БИК|BIC|SWIFT)\s*:?\s*[A-Z]{4}[A-Z]{2}[A-Z0-9]{2}(?:[A-Z0-9]{3})?",
    ),
    spec(
        "date_text_ru",
        "Date (Text RU)",
        Category::Date,
        r"(?i)\b\d{1,2}\s+(?:января|февраля|марта|апреля|мая|июня|июля|августа|сентября|октября|ноября|декабря)\s+\d{4}(?:\s+года?)?\b",
    ),
    spec(
        "context_bin",
        "BIN/IIN (Context)",
        Category::KzIin,
        r"(?i)(?:БИН|BIN|ИИН|IIN)\s*:?\s*\d{12}\b",
    ),
    spec(
        "context_person",
        "Person (Context)",
        Category::UserMemory,
        r"(?:Генеральный\s+директор|Финансовый\s+директор|Директор|Сотрудник|Гр\.|Гражданин|Заявитель|Истец|Ответчик|Signed by|Employee|Manager|Контактное\s+лицо(?:\s+по\s+договору)?)\s*:?\s+(?:[А-ЯЁ][а-яёА-ЯЁ]+\s+){1,2}[А-ЯЁ][а-яёА-ЯЁ]+",
    ),
    spec(
        "context_person_en",
        "Person (Context EN)",
        Category::PersonName,
        r"(?:Represented\s+by|Project\s+Lead|Manager|CEO|Officer|Partner|Secretary|Contact|Name|Witnessed\s+By)\s*:?\s+(?:[A-Z][a-z]+\s+){1,3}[A-Z][a-z]+",
    ),
    spec(
        "ip_person",
        "Individual Entrepreneur",
        Category::UserMemory,
        r"(?:ИП|Индивидуальный\s+предприниматель)\s+[А-ЯЁ][а-яёА-ЯЁ]+\s+(?:[А-ЯЁ][а-яёА-ЯЁ]+\s+[А-ЯЁ][а-яёА-ЯЁ]+|[А-ЯЁ]\.[А-ЯЁ]?\.?)",
    ),
    // Surname, given name, patronymic, including declined forms
    spec(
        "fio_patronymic",
        "Full Name (Patronymic)",
        Category::PersonName,
        r"\b[А-ЯЁ][а-яёА-ЯЁ]+\s+[А-ЯЁ][а-яёА-ЯЁ]+\s+[А-ЯЁ][а-яёА-ЯЁ]*(?:вич|вна|ович|овна|евич|евна|ич|ична)(?:а|у|ем|ом|ой|е)?\b",
    ),
    spec(
        "fio_short",
        "Name (Short)",
        Category::PersonName,
        r"\b[А-ЯЁ][а-яёА-ЯЁ]+\s+[А-ЯЁ]\.[А-ЯЁ]?\.",
    ),
    spec(
        "name_honorific",
        "Name (Honorific)",
        Category::PersonName,
        r"\b(?:Mr\.|Mrs\.|Ms\.|Dr\.|Prof\.)\s+[A-Z][a-z]+(?:\s+[A-Z][a-z]+){1,2}\b",
    ),
    spec(
        "company_quoted",
        "Company (Quoted)",
        Category::Company,
        r#"(?i)(?:ТОО|ООО|АО|ИП|LLP|LLC|JSC)\s+["«'‘“][^"»'’”]+["»'’”]"#,
    ),
    spec(
        "company_en",
        "Company (EN)",
        Category::Company,
        r"\b(?:[A-Z][a-zA-Z0-9&]+\s+)+(?:(?:Inc\.|Ltd\.|Co\.|Corp\.)|(?:LLC|Corporation|Limited|Company|Bank)\b)",
    ),
    spec(
        "address_full",
        "Address (Full)",
        Category::Address,
        r"(?i)\d{6},?\s+г\.\s*[А-ЯЁ][а-яёА-ЯЁ\-]+(?:,\s+(?:ул\.|улица|мкр\.|микрорайон|пр\.|проспект)\s+[А-Яа-яЁё0-9\-.]+(?:[-\s]*\d+)?)?(?:,\s*(?:д\.|дом)\s*\d+[а-яА-Я]?)?",
    ),
    PatternSpec {
        id: "address_city_only",
        label: "Address (City)",
        category: Category::Address,
        source: r"(?i)(?:город|г\.)\s+[А-ЯЁ][а-яёА-ЯЁ\-]{2,}",
        validator: None,
        trailing_guard: Some(city_terminator),
    },
    spec(
        "address_us_full",
        "Address (US Full)",
        Category::Address,
        r"\b\d+\s+[A-Z][a-z0-9\s]+(?:Street|St|Avenue|Ave|Drive|Dr|Road|Rd|Blvd|Lane|Ln|Way|Plaza|Sq)\b(?:.{1,50}?)?,\s*[A-Z][a-zA-Z\s]+,\s*[A-Z]{2}\s+\d{5}(?:-\d{4})?",
    ),
    // General data
    validated(
        "us_ssn",
        "SSN (US)",
        Category::Ssn,
        r"\b\d{3}-\d{2}-\d{4}\b",
        is_valid_us_ssn,
    ),
    spec("us_ein", "EIN (US)", Category::Ein, r"\b\d{2}-\d{7}\b"),
    spec(
        "us_routing",
        "Routing Number (US)",
        Category::RoutingNumber,
        r"(?i)\b(?:Routing\s+Number|ABA)\s*:?\s*(\d{9})\b",
    ),
    spec(
        "bank_account_context",
        "Bank Account (Context)",
        Category::BankAccount,
        r"(?i)\b(?:Account\s+Number|Account\s+No\.?|ACC)\s*:?\s*(\d{6,17})\b",
    ),
    spec(
        "driver_license_context",
        "Driver License (Context)",
        Category::DriverLicense,
        r"(?i)\b(?:Driver'?s\s+License|DL|Lic)\s*:?\s*([A-Z0-9-]{5,20})\b",
    ),
    spec(
        "email",
        "Email Address",
        Category::Email,
        r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b",
    ),
    spec(
        "phone_intl",
        "Phone (International)",
        Category::Phone,
        r"(?:\+?\d{1,3}[-. ]*)?(?:\(\d{3}\)|\d{3})[-. ]*\d{3}[-. ]*\d{4}(?: *x\d+)?",
    ),
    spec(
        "url",
        "URL / Website",
        Category::Url,
        r"https?://(www\.)?[-a-zA-Z0-9@:%._+~#=]{1,256}\.[a-zA-Z0-9()]{1,6}\b([-a-zA-Z0-9()@:%_+.~#?&/=]*)",
    ),
    validated(
        "credit_card",
        "Credit Card",
        Category::CreditCard,
        r"\b(?:\d[ -]*?){13,16}\b",
        is_valid_card_number,
    ),
    // Kazakhstan
    validated(
        "kz_iin",
        "IIN / BIN (Raw)",
        Category::KzIin,
        r"\b\d{12}\b",
        is_valid_kz_iin,
    ),
    spec(
        "kz_phone",
        "Phone (KZ)",
        Category::KzPhone,
        r"(?:\+7|8)\s*\(?7\d{2}\)?\s*\d{3}[-\s]*\d{2}[-\s]*\d{2}",
    ),
    // Russia
    spec(
        "rf_passport",
        "RF Passport",
        Category::RfPassport,
        r"\b\d{4}\s?\d{6}\b",
    ),
    validated(
        "inn",
        "INN (RU)",
        Category::Inn,
        r"\b\d{10}\b|\b\d{12}\b",
        is_valid_ru_inn,
    ),
    // Other
    spec(
        "date",
        "Date",
        Category::Date,
        r"\b(?:0[1-9]|[12][0-9]|3[01])[./-](?:0[1-9]|1[0-2])[./-](?:19|20)\d{2}\b",
    ),
    spec(
        "iban",
        "IBAN",
        Category::Iban,
        r"\b[A-Z]{2}\d{2}[A-Z0-9]{12,30}\b",
    ),
    spec(
        "date_text_en",
        "Date (Text EN)",
        Category::Date,
        r"(?i)\b(?:January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{1,2},?\s+\d{4}\b",
    ),
];

/// Compiled catalog, in evaluation order
pub static SYSTEM_PATTERNS: Lazy<Vec<SystemPattern>> = Lazy::new(|| {
    CATALOG
        .iter()
        .filter_map(|spec| match Regex::new(spec.source) {
            Ok(regex) => Some(SystemPattern {
                id: spec.id,
                label: spec.label,
                category: spec.category,
                regex,
                validator: spec.validator,
                trailing_guard: spec.trailing_guard,
            }),
            Err(e) => {
                error!("System pattern '{}' failed to compile: {}", spec.id, e);
                None
            }
        })
        .collect()
});

/// Look up a compiled system pattern by id
pub fn system_pattern(id: &str) -> Option<&'static SystemPattern> {
    SYSTEM_PATTERNS.iter().find(|p| p.id == id)
}

/// A city name must be followed by punctuation, a line break, a lowercase
/// continuation word or the end of the text; this keeps "г. 2024" style
/// abbreviations from being read as an address.
fn city_terminator(rest: &str) -> bool {
    let trimmed = rest.trim_start();
    let skipped = &rest[..rest.len() - trimmed.len()];

    match trimmed.chars().next() {
        None => true,
        Some(',' | '.' | '\n') => true,
        Some(c) if !skipped.is_empty() && is_cyrillic_letter(c) => true,
        Some(_) => skipped.contains('\n'),
    }
}

fn is_cyrillic_letter(c: char) -> bool {
    matches!(c, 'а'..='я' | 'А'..='Я' | 'ё' | 'Ё')
}

/// Letters tolerated after a learned stem (Russian and Kazakh inflections)
const SUFFIX_CLASS: &str = "[а-яА-Яa-zA-ZәіңғүұқөһӘІҢҒҮҰҚӨҺ]{0,4}";

/// Trailing vowels and soft signs dropped to form a stem
const STEM_ENDINGS: &[char] = &['а', 'я', 'о', 'е', 'и', 'ы', 'ь', 'й', 'А', 'Я', 'О', 'Е', 'И', 'Ы', 'Ь', 'Й'];

/// Maximum whitespace run accepted between the words of a phrase
const MAX_WORD_GAP: usize = 4;

/// Turn a learned phrase into a regex source
///
/// - Multi-word phrases: every word escaped, words joined by a bounded
///   whitespace run.
/// - Single words shorter than 4 characters: escaped literal.
/// - Longer single words: the final vowel is dropped and up to four letters
///   may follow, so a stored root still matches declined forms.
///
/// Word boundaries are added on each edge whose character is a word
/// character. The result always compiles; an empty phrase yields an empty
/// source, which callers skip.
pub fn generate_smart_pattern(phrase: &str) -> String {
    let clean = phrase.trim();
    if clean.is_empty() {
        return String::new();
    }

    if clean.chars().any(char::is_whitespace) {
        let gap = format!(r"\s{{1,{}}}", MAX_WORD_GAP);
        let body = clean
            .split_whitespace()
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(&gap);
        return wrap_boundaries(clean, &body);
    }

    if clean.chars().count() < 4 {
        return wrap_boundaries(clean, &regex::escape(clean));
    }

    let stem = clean.strip_suffix(STEM_ENDINGS).unwrap_or(clean);

    match stem.chars().last() {
        Some(last) if last.is_alphabetic() => {
            let leading = if starts_with_word_char(stem) { r"\b" } else { "" };
            format!(r"{}{}{}\b", leading, regex::escape(stem), SUFFIX_CLASS)
        }
        _ => wrap_boundaries(clean, &regex::escape(clean)),
    }
}

/// Literal, boundary-aware pattern for a phrase (used for whitelist phrases
/// and propagated entities)
pub fn literal_pattern(phrase: &str) -> String {
    wrap_boundaries(phrase, &regex::escape(phrase))
}

fn wrap_boundaries(raw: &str, body: &str) -> String {
    let leading = if starts_with_word_char(raw) { r"\b" } else { "" };
    let trailing = if ends_with_word_char(raw) { r"\b" } else { "" };
    format!("{}{}{}", leading, body, trailing)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn starts_with_word_char(s: &str) -> bool {
    s.chars().next().is_some_and(is_word_char)
}

fn ends_with_word_char(s: &str) -> bool {
    s.chars().last().is_some_and(is_word_char)
}

#[cfg(test)]
mod tests;
