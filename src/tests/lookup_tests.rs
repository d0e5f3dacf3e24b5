use crate::{
    carrier::{get_carrier_for_number, get_carrier_with_prefix_for_number},
    geocoding::get_geocoding_for_number,
    phonenumberutil::PHONE_NUMBER_UTIL,
    proto_gen::phonenumber::PhoneNumber,
    timezone::{get_timezones_for_number, get_timezones_for_prefix, UNKNOWN_TIMEZONE},
};

use super::region_code::RegionCode;

fn parse(number: &str) -> PhoneNumber {
    PHONE_NUMBER_UTIL
        .parse(number, RegionCode::zz())
        .unwrap_or_else(|err| panic!("could not parse {number}: {err}"))
}

#[test]
fn timezones_for_prefix() {
    assert_eq!(
        vec!["Europe/London".to_string()],
        get_timezones_for_prefix("+442073238299")
    );
    assert_eq!(
        vec!["America/Los_Angeles".to_string()],
        get_timezones_for_prefix("+12065550100")
    );
    // Prefixes with no more specific entry fall back to the country code.
    assert_eq!(
        vec!["America/New_York".to_string()],
        get_timezones_for_prefix("+19175550100")
    );
    assert_eq!(
        vec![UNKNOWN_TIMEZONE.to_string()],
        get_timezones_for_prefix("0000000000")
    );
    assert_eq!(
        vec![UNKNOWN_TIMEZONE.to_string()],
        get_timezones_for_prefix("+9991234567")
    );
}

#[test]
fn timezones_for_number() {
    assert_eq!(
        vec!["Europe/Rome".to_string()],
        get_timezones_for_number(&parse("+390236618300"))
    );
    assert_eq!(
        vec!["Pacific/Auckland".to_string()],
        get_timezones_for_number(&parse("+6433316005"))
    );
}

#[test]
fn timezone_lists_are_sorted() {
    let timezones = get_timezones_for_prefix("+79261234567");
    assert_eq!(
        vec!["Asia/Yekaterinburg".to_string(), "Europe/Moscow".to_string()],
        timezones
    );
    let mut sorted = timezones.clone();
    sorted.sort();
    assert_eq!(sorted, timezones);
}

#[test]
fn carrier_for_number() {
    assert_eq!("Three", get_carrier_for_number(&parse("+447400123456"), "en"));
    assert_eq!("Vodafone", get_carrier_for_number(&parse("+447500123456"), "en"));
    assert_eq!("Telstra", get_carrier_for_number(&parse("+61412345678"), "en"));
    // An unknown language falls back to English.
    assert_eq!("Three", get_carrier_for_number(&parse("+447400123456"), "fr"));
    // Languages with their own table win over the fallback.
    assert_eq!(
        "Vivo Brasil",
        get_carrier_for_number(&parse("+5511990123456"), "pt")
    );
    assert_eq!("Vivo", get_carrier_for_number(&parse("+5511990123456"), "en"));
    // Fixed lines have no carrier entry.
    assert_eq!("", get_carrier_for_number(&parse("+14431234567"), "en"));
}

#[test]
fn carrier_with_prefix_for_number() {
    assert_eq!(
        ("Three".to_string(), 447400),
        get_carrier_with_prefix_for_number(&parse("+447400123456"), "en")
    );
    assert_eq!(
        ("".to_string(), 0),
        get_carrier_with_prefix_for_number(&parse("+14431234567"), "en")
    );
}

#[test]
fn geocoding_for_number() {
    assert_eq!(
        "Washington, D.C.",
        get_geocoding_for_number(&parse("+12025550123"), "en")
    );
    assert_eq!("Maryland", get_geocoding_for_number(&parse("+14435550123"), "en"));
    // The longest matching prefix wins.
    assert_eq!(
        "Weybridge, Surrey",
        get_geocoding_for_number(&parse("+441932869755"), "en")
    );
    assert_eq!("London", get_geocoding_for_number(&parse("+442087654321"), "en"));
    // Localized entries are preferred, with English fallback for gaps.
    assert_eq!("Berlin", get_geocoding_for_number(&parse("+493012345678"), "de"));
    assert_eq!("Maryland", get_geocoding_for_number(&parse("+14435550123"), "de"));
    // No table covers Argentina.
    assert_eq!("", get_geocoding_for_number(&parse("+5491161234567"), "en"));
}
