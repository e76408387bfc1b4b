//! Tests for the pattern library

use super::*;
use crate::safety::validate_custom_pattern;

fn compile(source: &str) -> Regex {
    regex::RegexBuilder::new(source)
        .case_insensitive(true)
        .build()
        .unwrap()
}

#[test]
fn test_every_system_pattern_compiles() {
    for spec in CATALOG {
        assert!(
            Regex::new(spec.source).is_ok(),
            "system pattern {} does not compile",
            spec.id
        );
    }
    assert_eq!(SYSTEM_PATTERNS.len(), CATALOG.len());
}

#[test]
fn test_system_pattern_ids_are_unique() {
    let mut ids: Vec<_> = SYSTEM_PATTERNS.iter().map(|p| p.id).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), SYSTEM_PATTERNS.len());
}

#[test]
fn test_system_pattern_lookup() {
    let email = system_pattern("email").unwrap();
    assert_eq!(email.category, Category::Email);
    assert!(email.validator.is_none());

    let card = system_pattern("credit_card").unwrap();
    assert!(card.validator.is_some());

    assert!(system_pattern("nope").is_none());
}

#[test]
fn test_email_pattern() {
    let email = system_pattern("email").unwrap();
    let m = email.regex.find("Contact me at test@example.com").unwrap();
    assert_eq!(m.as_str(), "test@example.com");
}

#[test]
fn test_phone_pattern() {
    let phone = system_pattern("phone_intl").unwrap();
    let m = phone.regex.find("Call 555-123-4567 today").unwrap();
    assert_eq!(m.as_str(), "555-123-4567");
}

#[test]
fn test_contextual_bin_pattern() {
    let bin = system_pattern("context_bin").unwrap();
    let m = bin.regex.find("Реквизиты: БИН: 123456789012.").unwrap();
    assert_eq!(m.as_str(), "БИН: 123456789012");
    assert_eq!(bin.category, Category::KzIin);
}

#[test]
fn test_patronymic_name_pattern() {
    let fio = system_pattern("fio_patronymic").unwrap();
    let m = fio.regex.find("Договор подписал Иванов Иван Иванович вчера").unwrap();
    assert_eq!(m.as_str(), "Иванов Иван Иванович");
}

#[test]
fn test_credit_card_validator_is_applied() {
    let card = system_pattern("credit_card").unwrap();

    let valid = card.regex.find("4111-1111-1111-1111").unwrap();
    assert_eq!(valid.as_str(), "4111-1111-1111-1111");
    assert!(card.accepts(valid.as_str(), ""));

    let invalid = card.regex.find("4111-1111-1111-1112").unwrap();
    assert!(!card.accepts(invalid.as_str(), ""));
}

#[test]
fn test_ssn_exclusions_live_in_validator() {
    let ssn = system_pattern("us_ssn").unwrap();
    assert!(ssn.accepts("123-45-6789", ""));
    assert!(!ssn.accepts("666-45-6789", ""));
    assert!(!ssn.accepts("000-45-6789", ""));
}

#[test]
fn test_city_guard() {
    let city = system_pattern("address_city_only").unwrap();
    let m = city.regex.find("Адрес: г. Алматы, ул. Абая").unwrap();
    assert_eq!(m.as_str(), "г. Алматы");

    assert!(city.accepts("г. Алматы", ", ул. Абая"));
    assert!(city.accepts("г. Алматы", ""));
    assert!(city.accepts("г. Алматы", " расположен"));
    assert!(city.accepts("г. Алматы", "  \nдалее"));
    assert!(!city.accepts("г. Алматы", " 2024"));
    assert!(!city.accepts("г. Алматы", "-Ata"));
}

#[test]
fn test_smart_pattern_multi_word() {
    let source = generate_smart_pattern("John Smith");
    assert_eq!(source, r"\bJohn\s{1,4}Smith\b");

    let re = compile(&source);
    assert!(re.is_match("met john   smith today"));
    assert!(!re.is_match("JohnSmith"));
    assert!(!re.is_match("John          Smith"));
}

#[test]
fn test_smart_pattern_tolerates_inflection() {
    let re = compile(&generate_smart_pattern("Иванов"));
    assert!(re.is_match("письмо Иванову"));
    assert!(re.is_match("с Ивановым"));
    assert!(!re.is_match("Иван"));

    // Trailing vowel is dropped to form the stem
    let re = compile(&generate_smart_pattern("Алматы"));
    assert!(re.is_match("в Алматы"));
    assert!(re.is_match("из Алмату"));
    assert!(!re.is_match("Алматинский"));
}

#[test]
fn test_smart_pattern_short_word_is_literal() {
    let source = generate_smart_pattern("ТОО");
    assert_eq!(source, r"\bТОО\b");

    let re = compile(&source);
    assert!(re.is_match("ТОО Ромашка"));
    assert!(!re.is_match("ТООшка"));
}

#[test]
fn test_smart_pattern_escapes_metacharacters() {
    let re = compile(&generate_smart_pattern("a.b"));
    assert!(re.is_match("x a.b y"));
    assert!(!re.is_match("x axb y"));

    let re = compile(&generate_smart_pattern("C++"));
    assert!(re.is_match("write C++ code"));

    let re = compile(&generate_smart_pattern("(555) 010"));
    assert!(re.is_match("call (555) 010"));
}

#[test]
fn test_smart_pattern_empty_phrase() {
    assert_eq!(generate_smart_pattern(""), "");
    assert_eq!(generate_smart_pattern("   \t"), "");
}

#[test]
fn test_smart_patterns_pass_safety_gate() {
    let phrases = [
        "John Smith",
        "Иванов",
        "Алматы",
        "ТОО",
        "C++",
        "a.b|c*d+e",
        "(((nested)))",
        "ООО «Ромашка» и партнёры",
        "@handle",
        "x",
    ];

    for phrase in phrases {
        let source = generate_smart_pattern(phrase);
        assert!(
            validate_custom_pattern(&source).is_ok(),
            "generated pattern for {:?} rejected: {}",
            phrase,
            source
        );
    }
}

#[test]
fn test_literal_pattern_boundaries() {
    assert_eq!(literal_pattern("N/A"), r"\bN/A\b");
    assert_eq!(literal_pattern("@corp"), r"@corp\b");

    let re = compile(&literal_pattern("support@company.com"));
    assert!(re.is_match("Contact SUPPORT@company.com for help"));
    assert!(!re.is_match("xsupport@company.com"));
}
