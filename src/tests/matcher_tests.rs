use crate::{
    phonenumbermatcher::{Leniency, PhoneNumberMatcher},
    phonenumberutil::PHONE_NUMBER_UTIL,
    text_scanner,
};

use super::region_code::RegionCode;

fn national_numbers(text: &str, region: &str, leniency: Leniency) -> Vec<u64> {
    text_scanner(text, region, leniency)
        .map(|found| found.number().national_number())
        .collect()
}

#[test]
fn finds_multiple_numbers_in_order() {
    let text = "Call me at 202-555-0130 or 415-555-0198 for more info.";
    let matches: Vec<_> = text_scanner(text, RegionCode::us(), Leniency::Valid).collect();
    assert_eq!(2, matches.len());

    assert_eq!(2025550130, matches[0].number().national_number());
    assert_eq!("202-555-0130", matches[0].raw_string());
    assert_eq!(&text[matches[0].start()..matches[0].end()], matches[0].raw_string());

    assert_eq!(4155550198, matches[1].number().national_number());
    // Matches never overlap and arrive in text order.
    assert!(matches[0].end() <= matches[1].start());
}

#[test]
fn skips_invalid_candidates() {
    let text = "Try 12345 and then call 503-555-0110 or reach out at 999-000";
    assert_eq!(
        vec![5035550110],
        national_numbers(text, RegionCode::us(), Leniency::Valid)
    );
}

#[test]
fn rejects_slash_separated_dates() {
    let text = "Submitted on 10/12/2023 by phone";
    assert!(national_numbers(text, RegionCode::us(), Leniency::Valid).is_empty());
}

#[test]
fn rejects_time_stamps() {
    let text = "Deployed 2012-01-02 08:00 without issue";
    assert!(national_numbers(text, RegionCode::us(), Leniency::Valid).is_empty());
}

#[test]
fn rejects_numbers_surrounded_by_latin_letters() {
    assert!(national_numbers("abc4435550198def", RegionCode::us(), Leniency::Valid).is_empty());
    assert!(national_numbers("price: 4435550198%", RegionCode::us(), Leniency::Valid).is_empty());
    // At POSSIBLE leniency the context characters are not inspected.
    assert_eq!(
        vec![4435550198],
        national_numbers("abc4435550198def", RegionCode::us(), Leniency::Possible)
    );
}

#[test]
fn descends_into_inner_matches() {
    // Neither number is valid with the bracket soup around them, but the
    // parenthesised inner candidates are.
    let text = "(443) 555-0198 (202) 555-0130";
    let numbers = national_numbers(text, RegionCode::us(), Leniency::Valid);
    assert!(numbers.contains(&4435550198));
}

#[test]
fn possible_rejects_local_only_numbers() {
    // A 7-digit US number is dialable locally but not from abroad, so it is
    // not a possible number at any leniency level.
    let text = "my number is 253-0000";
    assert!(national_numbers(text, RegionCode::us(), Leniency::Possible).is_empty());
    assert!(national_numbers(text, RegionCode::us(), Leniency::Valid).is_empty());
}

#[test]
fn possible_accepts_invalid_but_possible_numbers() {
    // 1234567890 has a dialable length but matches no US descriptor: only
    // the POSSIBLE leniency accepts it.
    let text = "call 123-456-7890 now";
    assert_eq!(
        vec![1234567890],
        national_numbers(text, RegionCode::us(), Leniency::Possible)
    );
    assert!(national_numbers(text, RegionCode::us(), Leniency::Valid).is_empty());
}

#[test]
fn leniency_is_monotone() {
    let texts = [
        "Call 202-555-0130 today",
        "Call 2025550130 today",
        "Call 65 02 53 00 00 today",
        "Call 253-0000 today",
    ];
    for text in texts {
        let possible = national_numbers(text, RegionCode::us(), Leniency::Possible);
        let valid = national_numbers(text, RegionCode::us(), Leniency::Valid);
        let strict = national_numbers(text, RegionCode::us(), Leniency::StrictGrouping);
        let exact = national_numbers(text, RegionCode::us(), Leniency::ExactGrouping);
        for number in &exact {
            assert!(strict.contains(number), "EXACT ⊄ STRICT for {text}");
        }
        for number in &strict {
            assert!(valid.contains(number), "STRICT ⊄ VALID for {text}");
        }
        for number in &valid {
            assert!(possible.contains(number), "VALID ⊄ POSSIBLE for {text}");
        }
    }
}

#[test]
fn strict_grouping_rejects_regrouped_digits() {
    // 65 02 53 00 00 regroups the digits of the valid number 6502530000.
    assert!(national_numbers(
        "phone: 65 02 53 00 00",
        RegionCode::us(),
        Leniency::StrictGrouping
    )
    .is_empty());
    assert_eq!(
        vec![6502530000],
        national_numbers("phone: 650 253 0000", RegionCode::us(), Leniency::StrictGrouping)
    );
}

#[test]
fn exact_grouping_requires_the_formatted_groups() {
    assert_eq!(
        vec![6502530000],
        national_numbers("at 650 253 0000.", RegionCode::us(), Leniency::ExactGrouping)
    );
    // A single block is also accepted.
    assert_eq!(
        vec![6502530000],
        national_numbers("at 6502530000.", RegionCode::us(), Leniency::ExactGrouping)
    );
    assert!(national_numbers("at 650 2530000.", RegionCode::us(), Leniency::ExactGrouping)
        .is_empty());
}

#[test]
fn max_tries_bounds_the_search() {
    let text = "202-555-0130 and 415-555-0198";
    let matcher = PhoneNumberMatcher::with_leniency(
        &PHONE_NUMBER_UTIL,
        text,
        RegionCode::us(),
        Leniency::Valid,
        1,
    );
    // The single try is spent on the first candidate; the second is never
    // attempted.
    assert_eq!(1, matcher.count());
}

#[test]
fn state_machine_contract() {
    let mut matcher = PhoneNumberMatcher::new("call 202-555-0130 now", RegionCode::us());
    // has_next is idempotent while READY.
    assert!(matcher.has_next());
    assert!(matcher.has_next());
    let found = matcher.next().expect("a match should be ready");
    assert_eq!(2025550130, found.number().national_number());
    // Exhausted: DONE is terminal.
    assert!(!matcher.has_next());
    assert!(matcher.next().is_none());
    assert!(!matcher.has_next());
}

#[test]
fn empty_text_yields_nothing() {
    assert!(national_numbers("", RegionCode::us(), Leniency::Valid).is_empty());
    assert!(national_numbers("no digits here", RegionCode::us(), Leniency::Valid).is_empty());
}
