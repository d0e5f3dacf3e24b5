use crate::{
    metadata,
    phonenumberutil::{
        MatchType, ParseError, PhoneNumberFormat, PhoneNumberType, PhoneNumberUtil,
        ValidNumberLenType, ValidationResultErr, PHONE_NUMBER_UTIL,
    },
    proto_gen::phonenumber::{phone_number::CountryCodeSource, PhoneNumber},
};

use super::region_code::RegionCode;

static ONCE: std::sync::Once = std::sync::Once::new();

fn get_phone_util() -> PhoneNumberUtil {
    ONCE.call_once(|| {
        colog::default_builder()
            .filter_level(log::LevelFilter::Warn)
            .init()
    });

    let collection = metadata::load_number_metadata().expect("Metadata should be valid");
    PhoneNumberUtil::new_for_metadata(collection)
}

fn parse(number: &str, region: &str) -> PhoneNumber {
    get_phone_util()
        .parse(number, region)
        .unwrap_or_else(|err| panic!("could not parse {number}: {err}"))
}

#[test]
fn get_supported_regions() {
    let phone_util = get_phone_util();
    let regions = phone_util.get_supported_regions();
    assert!(regions.contains(&RegionCode::us()));
    assert!(regions.contains(&RegionCode::nz()));
    // The non-geographical entities are not regions.
    assert!(!regions.contains(&RegionCode::un001()));
}

#[test]
fn get_supported_global_network_calling_codes() {
    let phone_util = get_phone_util();
    let calling_codes = phone_util.get_supported_global_network_calling_codes();
    assert!(!calling_codes.is_empty());
    for &code in &calling_codes {
        assert!(code > 0);
        let region_code = phone_util.get_region_code_for_country_code(code);
        assert_eq!(RegionCode::un001(), region_code);
    }
    assert!(calling_codes.contains(&800));
    assert!(calling_codes.contains(&979));
}

#[test]
fn get_supported_calling_codes() {
    let phone_util = get_phone_util();
    let calling_codes = phone_util.get_supported_calling_codes();
    assert!(!calling_codes.is_empty());
    for &code in &calling_codes {
        assert!(code > 0);
        assert_ne!(RegionCode::zz(), phone_util.get_region_code_for_country_code(code));
    }
    let global_network_codes = phone_util.get_supported_global_network_calling_codes();
    assert!(calling_codes.len() > global_network_codes.len());
    assert!(calling_codes.contains(&979));
}

#[test]
fn get_supported_types_for_region() {
    let phone_util = get_phone_util();
    let types = phone_util
        .get_supported_types_for_region(RegionCode::us())
        .expect("region should exist");
    assert!(types.contains(&PhoneNumberType::FixedLine));
    assert!(types.contains(&PhoneNumberType::Mobile));
    assert!(types.contains(&PhoneNumberType::TollFree));
    assert!(!types.contains(&PhoneNumberType::FixedLineOrMobile));
    assert!(!types.contains(&PhoneNumberType::Unknown));

    assert!(phone_util.get_supported_types_for_region(RegionCode::zz()).is_none());
}

#[test]
fn get_supported_types_for_non_geo_entity() {
    let phone_util = get_phone_util();
    assert!(phone_util.get_supported_types_for_non_geo_entity(999).is_none());

    let types = phone_util
        .get_supported_types_for_non_geo_entity(979)
        .expect("code should exist");
    assert!(types.contains(&PhoneNumberType::PremiumRate));
    assert!(!types.contains(&PhoneNumberType::Mobile));
    assert!(!types.contains(&PhoneNumberType::Unknown));
}

#[test]
fn get_region_codes_for_country_calling_code() {
    let phone_util = get_phone_util();

    let regions = phone_util.get_region_codes_for_country_calling_code(1);
    assert!(regions.contains(&RegionCode::us()));
    assert!(regions.contains(&RegionCode::bs()));
    // The main country for the calling code is listed first.
    assert_eq!(regions.first(), Some(&RegionCode::us()));

    let regions = phone_util.get_region_codes_for_country_calling_code(44);
    assert!(regions.contains(&RegionCode::gb()));

    let regions = phone_util.get_region_codes_for_country_calling_code(800);
    assert!(regions.contains(&RegionCode::un001()));

    assert!(phone_util.get_region_codes_for_country_calling_code(2).is_empty());
}

#[test]
fn embedded_region_map_agrees_with_derived_one() {
    // The production singleton decodes the country-code map blob; the
    // test-constructed engine derives it from the descriptors. They must
    // order the shared calling code 1 the same way.
    assert_eq!(
        PHONE_NUMBER_UTIL.get_region_code_for_country_code(1),
        get_phone_util().get_region_code_for_country_code(1),
    );
    assert_eq!(PHONE_NUMBER_UTIL.get_region_code_for_country_code(64), "NZ");
}

#[test]
fn get_country_code_for_region() {
    let phone_util = get_phone_util();
    assert_eq!(1, phone_util.get_country_code_for_region(RegionCode::us()));
    assert_eq!(64, phone_util.get_country_code_for_region(RegionCode::nz()));
    assert_eq!(0, phone_util.get_country_code_for_region(RegionCode::zz()));
}

#[test]
fn get_ndd_prefix_for_region() {
    let phone_util = get_phone_util();
    assert_eq!(Some("1".to_string()), phone_util.get_ndd_prefix_for_region(RegionCode::us(), false));
    assert_eq!(Some("0".to_string()), phone_util.get_ndd_prefix_for_region(RegionCode::nz(), false));
    assert_eq!(None, phone_util.get_ndd_prefix_for_region(RegionCode::zz(), false));
}

#[test]
fn normalize_digits_only() {
    let phone_util = get_phone_util();
    assert_eq!("03456234", phone_util.normalize_digits_only("034-56&+a#234"));
    // Full-width and Arabic-Indic digits are converted to their ASCII value.
    assert_eq!("6", phone_util.normalize_digits_only("\u{FF16}"));
    assert_eq!("520", phone_util.normalize_digits_only("\u{0665}\u{0662}\u{0660}"));
    assert_eq!("520", phone_util.normalize_digits_only("\u{06F5}\u{06F2}\u{06F0}"));
    // Idempotence.
    let once = phone_util.normalize_digits_only("(443) 799-0238");
    assert_eq!(once, phone_util.normalize_digits_only(&once));
}

#[test]
fn normalize_strips_alpha_characters_for_vanity_numbers() {
    let phone_util = get_phone_util();
    // Has three or more alpha characters: the keypad mapping applies.
    assert_eq!("18002992883", phone_util.normalize("1800AWWCUTE"));
    // Fewer than three letters: they are dropped instead.
    assert_eq!("1800299", phone_util.normalize("1800-2-9-9ab"));
}

#[test]
fn normalize_diallable_chars_only() {
    let phone_util = get_phone_util();
    assert_eq!(
        "+14437990238",
        phone_util.normalize_diallable_chars_only("+1 (443) 799-0238")
    );
    assert_eq!("*911#", phone_util.normalize_diallable_chars_only("*9-1-1#"));
}

#[test]
fn convert_alpha_characters_in_number() {
    let phone_util = get_phone_util();
    assert_eq!(
        "1800-222-333",
        phone_util.convert_alpha_characters_in_number("1800-ABC-DEF")
    );
}

#[test]
fn extract_possible_number() {
    let phone_util = get_phone_util();
    // Leading junk is removed, trailing non-alphanumeric characters too.
    assert_eq!(
        "0800-345-600",
        phone_util.extract_possible_number("Tel:0800-345-600").unwrap()
    );
    assert_eq!(
        "0800 FOR PIZZA",
        phone_util.extract_possible_number("Tel:0800 FOR PIZZA").unwrap()
    );
    // A second number marked with "/x" is dropped.
    assert_eq!(
        "530) 583-6985 x302",
        phone_util
            .extract_possible_number("(530) 583-6985 x302/x2303")
            .unwrap()
    );
    assert!(phone_util.extract_possible_number("Num-....").is_err());
}

#[test]
fn is_viable_phone_number() {
    let phone_util = get_phone_util();
    assert!(phone_util.is_viable_phone_number("13"));
    assert!(phone_util.is_viable_phone_number("(443) 799-0238"));
    assert!(phone_util.is_viable_phone_number("+1 (650) 253 00 00"));
    assert!(!phone_util.is_viable_phone_number("1"));
    assert!(!phone_util.is_viable_phone_number("tel"));
    // A plus sign is only allowed at the start.
    assert!(!phone_util.is_viable_phone_number("190022+22222"));
}

#[test]
fn parse_us_numbers() {
    let phone_util = get_phone_util();
    let cases: &[(&str, u64)] = &[
        ("4437990238", 4437990238),
        ("(443) 799-0238", 4437990238),
        ("443-799-0238", 4437990238),
        ("1 443 799 0238", 4437990238),
        ("+1 443 799 0238", 4437990238),
        ("16502530000", 6502530000),
        ("1800AWWCUTE", 8002992883),
        ("45", 45),
        ("2530000", 2530000),
    ];
    for (input, expected) in cases {
        let number = phone_util
            .parse(input, RegionCode::us())
            .unwrap_or_else(|err| panic!("could not parse {input}: {err}"));
        assert_eq!(1, number.country_code(), "country code mismatch for {input}");
        assert_eq!(*expected, number.national_number(), "mismatch for {input}");
    }
}

#[test]
fn parse_national_number_nz() {
    let phone_util = get_phone_util();
    let inputs = [
        "033316005",
        "33316005",
        "03-331 6005",
        "03 331 6005",
        "tel:03-331-6005;phone-context=+64",
        "tel:331-6005;phone-context=+64-3",
        "tel:03-331-6005;phone-context=+64;a=%A1",
        "tel:03-331-6005;isub=12345;phone-context=+64",
        "03-331-6005;phone-context=+64",
        "0064 3 331 6005",
        "+64 3 331 6005",
        "+0064 3 331 6005",
        "+ 00 64 3 331 6005",
    ];
    for input in inputs {
        let number = phone_util
            .parse(input, RegionCode::nz())
            .unwrap_or_else(|err| panic!("could not parse {input}: {err}"));
        assert_eq!(64, number.country_code(), "country code mismatch for {input}");
        assert_eq!(33316005, number.national_number(), "mismatch for {input}");
    }
    // The same number dialled from the US with the US IDD.
    let number = parse("01164 3 331 6005", RegionCode::us());
    assert_eq!(64, number.country_code());
    assert_eq!(33316005, number.national_number());
    // A tel URI with a domain name phone-context keeps the local number.
    let number = parse("tel:253-0000;phone-context=www.google.com", RegionCode::us());
    assert_eq!(1, number.country_code());
    assert_eq!(2530000, number.national_number());
}

#[test]
fn parse_with_extension() {
    let phone_util = get_phone_util();
    let number = parse("03 331 6005 ext 1234", RegionCode::nz());
    assert_eq!(33316005, number.national_number());
    assert_eq!("1234", number.extension());

    let number = parse("(443) 799-0238 x 456", RegionCode::us());
    assert_eq!(4437990238, number.national_number());
    assert_eq!("456", number.extension());

    let number = parse("tel:+64-3-331-6005;ext=1234", RegionCode::nz());
    assert_eq!(33316005, number.national_number());
    assert_eq!("1234", number.extension());

    // ",," is used by auto-diallers before the extension.
    let number = parse("(443) 799-0238,,890", RegionCode::us());
    assert_eq!(4437990238, number.national_number());
    assert_eq!("890", number.extension());

    assert!(phone_util.parse("(443) 799-0238", RegionCode::us()).unwrap().extension.is_none());
}

#[test]
fn parse_argentinian_mobile_applies_transform_rule() {
    let phone_util = get_phone_util();
    // 0 + area code + 15 rewrites to the international mobile form 9 + area.
    let number = parse("+540111561234567", RegionCode::ar());
    assert_eq!(54, number.country_code());
    assert_eq!(91161234567, number.national_number());
    assert_eq!(
        "+5491161234567",
        phone_util.format(&number, PhoneNumberFormat::E164).unwrap()
    );

    let number = parse("+541151123456", RegionCode::ar());
    assert_eq!(1151123456, number.national_number());
    assert_eq!(
        "+541151123456",
        phone_util.format(&number, PhoneNumberFormat::E164).unwrap()
    );
    assert!(phone_util.is_valid_number(&number).unwrap());
}

#[test]
fn parse_keeps_italian_leading_zeros() {
    let phone_util = get_phone_util();
    let number = parse("0236618300", RegionCode::it());
    assert_eq!(39, number.country_code());
    assert_eq!(236618300, number.national_number());
    assert!(number.italian_leading_zero());
    assert_eq!(1, number.number_of_leading_zeros());
    assert_eq!(
        "0236618300",
        PhoneNumberUtil::get_national_significant_number(&number)
    );

    // Multiple leading zeros are counted, the last digit never is.
    let number = parse("00650", RegionCode::it());
    assert_eq!(650, number.national_number());
    assert!(number.italian_leading_zero());
    assert_eq!(2, number.number_of_leading_zeros());
    assert_eq!(
        "+3900650",
        phone_util.format(&number, PhoneNumberFormat::E164).unwrap()
    );
}

#[test]
fn parse_brazilian_carrier_code() {
    let phone_util = get_phone_util();
    // 0 + carrier selection code 31 + the number.
    let number = phone_util
        .parse_and_keep_raw_input("0 31 11 91234-5678", RegionCode::br())
        .unwrap();
    assert_eq!(55, number.country_code());
    assert_eq!(11912345678, number.national_number());
    assert_eq!("31", number.preferred_domestic_carrier_code());
}

#[test]
fn parse_failures() {
    let phone_util = get_phone_util();
    // Alpha soup pushes the normalized digits over the NSN maximum.
    assert_eq!(
        Err(ParseError::TooLongNsn),
        phone_util.parse("((443) 799-023asdfghjk8", RegionCode::us())
    );
    assert!(matches!(
        phone_util.parse("190022+22222", RegionCode::us()),
        Err(ParseError::NotANumber(_))
    ));
    assert!(matches!(
        phone_util.parse("This is not a phone number", RegionCode::us()),
        Err(ParseError::NotANumber(_))
    ));
    // No region and no international indicator.
    assert_eq!(
        Err(ParseError::InvalidCountryCode),
        phone_util.parse("2530000", "")
    );
    assert_eq!(
        Err(ParseError::InvalidCountryCode),
        phone_util.parse("0044-------1932869755", RegionCode::zz())
    );
    // IDD stripped, but not enough digits left.
    assert_eq!(
        Err(ParseError::TooShortAfterIdd),
        phone_util.parse("011", RegionCode::us())
    );
    // An unknown country calling code after a plus sign.
    assert_eq!(
        Err(ParseError::InvalidCountryCode),
        phone_util.parse("+210 3456 56789", RegionCode::nz())
    );
}

#[test]
fn parse_and_keep_raw_input() {
    let phone_util = get_phone_util();
    let number = phone_util
        .parse_and_keep_raw_input("+64 3 331 6005", RegionCode::nz())
        .unwrap();
    assert_eq!("+64 3 331 6005", number.raw_input());
    assert_eq!(
        CountryCodeSource::FROM_NUMBER_WITH_PLUS_SIGN,
        number.country_code_source()
    );

    let number = phone_util
        .parse_and_keep_raw_input("0064 3 331 6005", RegionCode::nz())
        .unwrap();
    assert_eq!(CountryCodeSource::FROM_NUMBER_WITH_IDD, number.country_code_source());

    let number = phone_util
        .parse_and_keep_raw_input("64 3 331 6005", RegionCode::nz())
        .unwrap();
    assert_eq!(
        CountryCodeSource::FROM_NUMBER_WITHOUT_PLUS_SIGN,
        number.country_code_source()
    );

    let number = phone_util
        .parse_and_keep_raw_input("03 331 6005", RegionCode::nz())
        .unwrap();
    assert_eq!(CountryCodeSource::FROM_DEFAULT_COUNTRY, number.country_code_source());

    // Numbers parsed without keeping the raw input leave the source unset.
    let number = parse("03 331 6005", RegionCode::nz());
    assert!(!number.has_country_code_source());
}

#[test]
fn parse_to_number_writes_into_the_supplied_buffer() {
    let phone_util = get_phone_util();
    let mut number = PhoneNumber::new();
    phone_util
        .parse_to_number("(443) 799-0238", RegionCode::us(), &mut number)
        .unwrap();
    assert_eq!(4437990238, number.national_number());
}

#[test]
fn is_possible_number_with_reason() {
    let phone_util = get_phone_util();
    let cases: &[(&str, &str, Result<ValidNumberLenType, ValidationResultErr>)] = &[
        ("16502530000", RegionCode::us(), Ok(ValidNumberLenType::IsPossible)),
        ("2530000", RegionCode::us(), Ok(ValidNumberLenType::IsPossibleLocalOnly)),
        ("65025300001", RegionCode::us(), Err(ValidationResultErr::TooLong)),
        ("253000", RegionCode::us(), Err(ValidationResultErr::TooShort)),
        ("800123456789", RegionCode::us(), Err(ValidationResultErr::TooLong)),
        ("+80012345678", RegionCode::zz(), Ok(ValidNumberLenType::IsPossible)),
    ];
    for (input, region, expected) in cases {
        let number = parse(input, region);
        assert_eq!(
            *expected,
            phone_util.is_possible_number_with_reason(&number),
            "mismatch for {input}"
        );
    }

    // An invalid country calling code.
    let mut number = PhoneNumber::new();
    number.set_country_code(2);
    number.set_national_number(6502530000);
    assert_eq!(
        Err(ValidationResultErr::InvalidCountryCode),
        phone_util.is_possible_number_with_reason(&number)
    );
}

#[test]
fn is_possible_number_for_type_with_reason() {
    let phone_util = get_phone_util();
    let number = parse("12345678", RegionCode::de());
    assert_eq!(
        Ok(ValidNumberLenType::IsPossible),
        phone_util.is_possible_number_for_type_with_reason(&number, PhoneNumberType::FixedLine)
    );
    // German mobile numbers are 10 or 11 digits, never 8.
    assert_eq!(
        Err(ValidationResultErr::TooShort),
        phone_util.is_possible_number_for_type_with_reason(&number, PhoneNumberType::Mobile)
    );
    // There are no premium rate numbers in the German table at all.
    assert_eq!(
        Err(ValidationResultErr::InvalidLength),
        phone_util.is_possible_number_for_type_with_reason(&number, PhoneNumberType::PremiumRate)
    );
}

#[test]
fn validity_implies_possibility() {
    let phone_util = get_phone_util();
    for input in ["+14437990238", "+441932869755", "+6433316005", "+5491161234567"] {
        let number = parse(input, RegionCode::zz());
        assert!(phone_util.is_valid_number(&number).unwrap(), "{input} should be valid");
        assert!(phone_util.is_possible_number(&number), "{input} should be possible");
    }
}

#[test]
fn is_valid_number() {
    let phone_util = get_phone_util();
    assert!(phone_util.is_valid_number(&parse("(443) 799-0238", RegionCode::us())).unwrap());
    assert!(phone_util.is_valid_number(&parse("+441932869755", RegionCode::gb())).unwrap());
    assert!(phone_util.is_valid_number(&parse("+80012345678", RegionCode::zz())).unwrap());

    // Possible, but does not match any type descriptor.
    let mut bogus = PhoneNumber::new();
    bogus.set_country_code(1);
    bogus.set_national_number(1234567890);
    assert!(!phone_util.is_valid_number(&bogus).unwrap());
}

#[test]
fn is_valid_number_for_region() {
    let phone_util = get_phone_util();
    // A Bahamian number is valid for BS and for the shared calling code, but
    // not for US.
    let bs_number = parse("+12423456789", RegionCode::zz());
    assert!(phone_util.is_valid_number(&bs_number).unwrap());
    assert!(phone_util
        .is_valid_number_for_region(&bs_number, RegionCode::bs())
        .unwrap());
    assert!(!phone_util
        .is_valid_number_for_region(&bs_number, RegionCode::us())
        .unwrap());

    let us_number = parse("+14437990238", RegionCode::zz());
    assert!(phone_util
        .is_valid_number_for_region(&us_number, RegionCode::us())
        .unwrap());
    assert!(!phone_util
        .is_valid_number_for_region(&us_number, RegionCode::bs())
        .unwrap());
}

#[test]
fn get_region_code_for_number() {
    let phone_util = get_phone_util();
    assert_eq!(
        RegionCode::us(),
        phone_util.get_region_code_for_number(&parse("+14437990238", RegionCode::zz())).unwrap()
    );
    assert_eq!(
        RegionCode::bs(),
        phone_util.get_region_code_for_number(&parse("+12423456789", RegionCode::zz())).unwrap()
    );
    assert_eq!(
        RegionCode::gb(),
        phone_util.get_region_code_for_number(&parse("+447400123456", RegionCode::zz())).unwrap()
    );
    assert_eq!(
        RegionCode::un001(),
        phone_util.get_region_code_for_number(&parse("+80012345678", RegionCode::zz())).unwrap()
    );
}

#[test]
fn get_number_type() {
    let phone_util = get_phone_util();
    let cases: &[(&str, &str, PhoneNumberType)] = &[
        ("(443) 799-0238", RegionCode::us(), PhoneNumberType::FixedLineOrMobile),
        ("8002345678", RegionCode::us(), PhoneNumberType::TollFree),
        ("9002345678", RegionCode::us(), PhoneNumberType::PremiumRate),
        ("5002345678", RegionCode::us(), PhoneNumberType::PersonalNumber),
        ("+447400123456", RegionCode::gb(), PhoneNumberType::Mobile),
        ("+441212345678", RegionCode::gb(), PhoneNumberType::FixedLine),
        ("0236618300", RegionCode::it(), PhoneNumberType::FixedLine),
        ("312345678", RegionCode::it(), PhoneNumberType::Mobile),
        ("+5491161234567", RegionCode::ar(), PhoneNumberType::Mobile),
        ("+80012345678", RegionCode::zz(), PhoneNumberType::TollFree),
        ("+979123456789", RegionCode::zz(), PhoneNumberType::PremiumRate),
        ("18012345", RegionCode::de(), PhoneNumberType::UAN),
    ];
    for (input, region, expected) in cases {
        let number = parse(input, region);
        assert_eq!(
            *expected,
            phone_util.get_number_type(&number).unwrap(),
            "mismatch for {input}"
        );
    }

    let mut unknown = PhoneNumber::new();
    unknown.set_country_code(1);
    unknown.set_national_number(1234567890);
    assert_eq!(PhoneNumberType::Unknown, phone_util.get_number_type(&unknown).unwrap());
}

#[test]
fn format_us_number() {
    let phone_util = get_phone_util();
    let number = parse("4431234567", RegionCode::us());
    assert_eq!("(443) 123-4567", phone_util.format(&number, PhoneNumberFormat::National).unwrap());
    assert_eq!("+1 443-123-4567", phone_util.format(&number, PhoneNumberFormat::International).unwrap());
    assert_eq!("+14431234567", phone_util.format(&number, PhoneNumberFormat::E164).unwrap());
    assert_eq!("tel:+1-443-123-4567", phone_util.format(&number, PhoneNumberFormat::RFC3966).unwrap());

    // A 7-digit local number uses the short format.
    let number = parse("2530000", RegionCode::us());
    assert_eq!("253-0000", phone_util.format(&number, PhoneNumberFormat::National).unwrap());
}

#[test]
fn format_gb_number() {
    let phone_util = get_phone_util();
    let number = parse("019 3286 9755", RegionCode::gb());
    assert_eq!("01932 869755", phone_util.format(&number, PhoneNumberFormat::National).unwrap());
    assert_eq!("+44 1932 869755", phone_util.format(&number, PhoneNumberFormat::International).unwrap());

    let number = parse("+44 (0) 1932 869755", RegionCode::gb());
    assert_eq!("+44 1932 869755", phone_util.format(&number, PhoneNumberFormat::International).unwrap());

    let number = parse("02087654321", RegionCode::gb());
    assert_eq!("020 8765 4321", phone_util.format(&number, PhoneNumberFormat::National).unwrap());
    let number = parse("07400123456", RegionCode::gb());
    assert_eq!("07400 123456", phone_util.format(&number, PhoneNumberFormat::National).unwrap());
}

#[test]
fn format_nz_number() {
    let phone_util = get_phone_util();
    let number = parse("03-331 6005", RegionCode::nz());
    assert_eq!("03-331 6005", phone_util.format(&number, PhoneNumberFormat::National).unwrap());
    assert_eq!("+64 3-331 6005", phone_util.format(&number, PhoneNumberFormat::International).unwrap());
    assert_eq!("tel:+64-3-331-6005", phone_util.format(&number, PhoneNumberFormat::RFC3966).unwrap());
}

#[test]
fn format_ar_mobile_number() {
    let phone_util = get_phone_util();
    let number = parse("+5491161234567", RegionCode::ar());
    assert_eq!("011 15-6123-4567", phone_util.format(&number, PhoneNumberFormat::National).unwrap());
    assert_eq!("+54 9 11 6123-4567", phone_util.format(&number, PhoneNumberFormat::International).unwrap());
    assert_eq!("+5491161234567", phone_util.format(&number, PhoneNumberFormat::E164).unwrap());
}

#[test]
fn format_non_geo_number() {
    let phone_util = get_phone_util();
    let number = parse("+80012345678", RegionCode::zz());
    assert_eq!("+800 1234 5678", phone_util.format(&number, PhoneNumberFormat::International).unwrap());
    assert_eq!("+80012345678", phone_util.format(&number, PhoneNumberFormat::E164).unwrap());
}

#[test]
fn format_with_extension() {
    let phone_util = get_phone_util();
    let number = parse("03-331 6005 ext 1234", RegionCode::nz());
    assert_eq!(
        "03-331 6005 ext. 1234",
        phone_util.format(&number, PhoneNumberFormat::National).unwrap()
    );
    assert_eq!(
        "tel:+64-3-331-6005;ext=1234",
        phone_util.format(&number, PhoneNumberFormat::RFC3966).unwrap()
    );
}

#[test]
fn format_by_pattern() {
    use crate::proto_gen::phonemetadata::NumberFormat;

    let phone_util = get_phone_util();
    let number = parse("4431234567", RegionCode::us());
    let mut user_format = NumberFormat::new();
    user_format.set_pattern("(\\d{3})(\\d{3})(\\d{4})".to_string());
    user_format.set_format("$1.$2.$3".to_string());
    assert_eq!(
        "443.123.4567",
        phone_util
            .format_by_pattern(&number, PhoneNumberFormat::National, &[user_format.clone()])
            .unwrap()
    );
    assert_eq!(
        "+1 443.123.4567",
        phone_util
            .format_by_pattern(&number, PhoneNumberFormat::International, &[user_format])
            .unwrap()
    );

    // $NP and $FG placeholders are substituted with the national prefix.
    let number = parse("01932869755", RegionCode::gb());
    let mut user_format = NumberFormat::new();
    user_format.set_pattern("(\\d{4})(\\d{6})".to_string());
    user_format.set_format("$1 $2".to_string());
    user_format.set_national_prefix_formatting_rule("($NP$FG)".to_string());
    assert_eq!(
        "(01932) 869755",
        phone_util
            .format_by_pattern(&number, PhoneNumberFormat::National, &[user_format])
            .unwrap()
    );
}

#[test]
fn format_out_of_country_calling_number() {
    let phone_util = get_phone_util();
    // From Germany, the international prefix 00 is dialled before the number.
    let us_number = parse("+14431234567", RegionCode::zz());
    assert_eq!(
        "00 1 443-123-4567",
        phone_util
            .format_out_of_country_calling_number(&us_number, RegionCode::de())
            .unwrap()
    );
    // From the US, the prefix is 011.
    let nz_number = parse("+6433316005", RegionCode::zz());
    assert_eq!(
        "011 64 3-331 6005",
        phone_util
            .format_out_of_country_calling_number(&nz_number, RegionCode::us())
            .unwrap()
    );
    // Within NANPA, the country code is dialled without a prefix.
    let bs_number = parse("+12423456789", RegionCode::zz());
    assert_eq!(
        "1 (242) 345-6789",
        phone_util
            .format_out_of_country_calling_number(&bs_number, RegionCode::us())
            .unwrap()
    );
    // Dialling a number from its own region just uses the national format.
    assert_eq!(
        "03-331 6005",
        phone_util
            .format_out_of_country_calling_number(&nz_number, RegionCode::nz())
            .unwrap()
    );
    // NZ has several international prefixes, so the preferred one is used.
    assert_eq!(
        "00 1 443-123-4567",
        phone_util
            .format_out_of_country_calling_number(&us_number, RegionCode::nz())
            .unwrap()
    );
}

#[test]
fn format_in_original_format() {
    let phone_util = get_phone_util();

    let number = phone_util
        .parse_and_keep_raw_input("+442087654321", RegionCode::gb())
        .unwrap();
    assert_eq!(
        "+44 20 8765 4321",
        phone_util.format_in_original_format(&number, RegionCode::gb()).unwrap()
    );

    let number = phone_util
        .parse_and_keep_raw_input("02087654321", RegionCode::gb())
        .unwrap();
    assert_eq!(
        "020 8765 4321",
        phone_util.format_in_original_format(&number, RegionCode::gb()).unwrap()
    );

    let number = phone_util
        .parse_and_keep_raw_input("01164 3 331 6005", RegionCode::us())
        .unwrap();
    assert_eq!(
        "011 64 3-331 6005",
        phone_util.format_in_original_format(&number, RegionCode::us()).unwrap()
    );

    // A number entered without the national prefix keeps that shape.
    let number = phone_util
        .parse_and_keep_raw_input("7031 3000", RegionCode::gb())
        .unwrap();
    assert_eq!(
        "7031 3000",
        phone_util.format_in_original_format(&number, RegionCode::gb()).unwrap()
    );
}

#[test]
fn format_number_for_mobile_dialing() {
    let phone_util = get_phone_util();
    // NANPA numbers that can be dialled internationally use the
    // international form even at home, since that always connects.
    let number = parse("8002345678", RegionCode::us());
    assert_eq!(
        "+18002345678",
        phone_util
            .format_number_for_mobile_dialing(&number, RegionCode::us(), false)
            .unwrap()
    );
    // ...and in E.164 from abroad.
    let us_number = parse("+14431234567", RegionCode::zz());
    assert_eq!(
        "+14431234567",
        phone_util
            .format_number_for_mobile_dialing(&us_number, RegionCode::nz(), false)
            .unwrap()
    );
    // Brazilian numbers without a stored carrier code cannot be dialled.
    let br_number = parse("+5511961234567", RegionCode::zz());
    assert_eq!(
        "",
        phone_util
            .format_number_for_mobile_dialing(&br_number, RegionCode::br(), false)
            .unwrap()
    );
    // Mexican numbers are always dialled internationally.
    let mx_number = parse("+523312345678", RegionCode::zz());
    assert_eq!(
        "+52 33 1234 5678",
        phone_util
            .format_number_for_mobile_dialing(&mx_number, RegionCode::mx(), true)
            .unwrap()
    );
}

#[test]
fn format_national_number_with_carrier_code() {
    let phone_util = get_phone_util();
    let number = parse("11961234567", RegionCode::br());
    assert_eq!(
        "0 15 (11) 96123-4567",
        phone_util
            .format_national_number_with_carrier_code(&number, "15")
            .unwrap()
    );
    // A stored preferred carrier code wins over the fallback.
    let mut number_with_preferred = number.clone();
    number_with_preferred.set_preferred_domestic_carrier_code("31".to_string());
    assert_eq!(
        "0 31 (11) 96123-4567",
        phone_util
            .format_national_number_with_preferred_carrier_code(&number_with_preferred, "15")
            .unwrap()
    );
}

#[test]
fn format_out_of_country_keeping_alpha_chars() {
    let phone_util = get_phone_util();
    let number = phone_util
        .parse_and_keep_raw_input("1800 six-flag", RegionCode::us())
        .unwrap();
    assert_eq!(
        "1 800 SIX-FLAG",
        phone_util
            .format_out_of_country_keeping_alpha_chars(&number, RegionCode::us())
            .unwrap()
    );
    assert_eq!(
        "00 1 800 SIX-FLAG",
        phone_util
            .format_out_of_country_keeping_alpha_chars(&number, RegionCode::de())
            .unwrap()
    );
}

#[test]
fn e164_round_trip_through_parse() {
    let phone_util = get_phone_util();
    let inputs = [
        ("(443) 799-0238", RegionCode::us()),
        ("019 3286 9755", RegionCode::gb()),
        ("03-331 6005", RegionCode::nz()),
        ("0236618300", RegionCode::it()),
        ("+540111561234567", RegionCode::ar()),
        ("00650", RegionCode::it()),
        ("03 331 6005 ext 1234", RegionCode::nz()),
    ];
    for (input, region) in inputs {
        let number = parse(input, region);
        let e164 = phone_util.format(&number, PhoneNumberFormat::E164).unwrap().into_owned();
        let reparsed = parse(&e164, RegionCode::zz());
        assert_eq!(number.country_code(), reparsed.country_code(), "for {input}");
        assert_eq!(number.national_number(), reparsed.national_number(), "for {input}");
        assert_eq!(
            number.italian_leading_zero(),
            reparsed.italian_leading_zero(),
            "for {input}"
        );
        assert_eq!(
            number.number_of_leading_zeros(),
            reparsed.number_of_leading_zeros(),
            "for {input}"
        );
    }
}

#[test]
fn formatting_is_idempotent() {
    let phone_util = get_phone_util();
    let formats = [
        PhoneNumberFormat::E164,
        PhoneNumberFormat::International,
        PhoneNumberFormat::National,
    ];
    let number = parse("+64 3 331 6005", RegionCode::nz());
    for format in formats {
        let formatted = phone_util.format(&number, format).unwrap().into_owned();
        let reparsed = parse(&formatted, RegionCode::nz());
        assert_eq!(
            formatted,
            phone_util.format(&reparsed, format).unwrap(),
            "format {format:?} not idempotent"
        );
    }
}

#[test]
fn example_numbers_round_trip_for_every_region() {
    let phone_util = get_phone_util();
    for region in phone_util.get_supported_regions() {
        let example = phone_util
            .get_example_number(region)
            .unwrap_or_else(|err| panic!("no example for {region}: {err}"));
        assert!(
            phone_util.is_valid_number(&example).unwrap(),
            "example number for {region} should be valid"
        );
        let e164 = phone_util.format(&example, PhoneNumberFormat::E164).unwrap().into_owned();
        let reparsed = parse(&e164, RegionCode::zz());
        assert_eq!(example.country_code(), reparsed.country_code(), "for {region}");
        assert_eq!(example.national_number(), reparsed.national_number(), "for {region}");
    }
}

#[test]
fn get_example_number_for_type() {
    let phone_util = get_phone_util();
    let toll_free = phone_util
        .get_example_number_for_type(RegionCode::us(), PhoneNumberType::TollFree)
        .unwrap();
    assert_eq!(8002345678, toll_free.national_number());
    assert!(phone_util
        .get_example_number_for_type(RegionCode::us(), PhoneNumberType::VoIP)
        .is_err());
    assert!(phone_util
        .get_example_number_for_type(RegionCode::zz(), PhoneNumberType::FixedLine)
        .is_err());
}

#[test]
fn get_example_number_for_non_geo_entity() {
    let phone_util = get_phone_util();
    let number = phone_util.get_example_number_for_non_geo_entity(800).unwrap();
    assert_eq!(800, number.country_code());
    assert_eq!(12345678, number.national_number());
    let number = phone_util.get_example_number_for_non_geo_entity(979).unwrap();
    assert_eq!(123456789, number.national_number());
    assert!(phone_util.get_example_number_for_non_geo_entity(999).is_err());
}

#[test]
fn truncate_too_long_number() {
    let phone_util = get_phone_util();

    let mut number = PhoneNumber::new();
    number.set_country_code(1);
    number.set_national_number(80055501234);
    assert!(phone_util.truncate_too_long_number(&mut number).unwrap());
    assert_eq!(8005550123, number.national_number());

    // Already valid numbers are left alone.
    let mut number = PhoneNumber::new();
    number.set_country_code(1);
    number.set_national_number(8005550123);
    assert!(phone_util.truncate_too_long_number(&mut number).unwrap());
    assert_eq!(8005550123, number.national_number());

    // Numbers with no valid truncation report failure and stay unchanged.
    let mut number = PhoneNumber::new();
    number.set_country_code(1);
    number.set_national_number(800555012);
    assert!(!phone_util.truncate_too_long_number(&mut number).unwrap());
    assert_eq!(800555012, number.national_number());
}

#[test]
fn is_number_match() {
    let phone_util = get_phone_util();
    let first = parse("+6433316005", RegionCode::zz());
    let second = parse("03 331 6005", RegionCode::nz());
    assert_eq!(MatchType::ExactMatch, phone_util.is_number_match(&first, &second));

    // Different numbers do not match.
    let other = parse("03 331 6006", RegionCode::nz());
    assert_eq!(MatchType::NoMatch, phone_util.is_number_match(&first, &other));

    // One NSN being a suffix of the other is a short NSN match.
    let shorter = parse("331 6005", RegionCode::nz());
    assert_eq!(MatchType::ShortNsnMatch, phone_util.is_number_match(&first, &shorter));

    // Strings without a country code match at the NSN level.
    assert_eq!(
        MatchType::NsnMatch,
        phone_util.is_number_match_with_one_number(&first, "03 331 6005")
    );
    assert_eq!(
        MatchType::ExactMatch,
        phone_util.is_number_match_with_one_number(&first, "+64 3 331 6005")
    );
    assert_eq!(
        MatchType::NotANumber,
        phone_util.is_number_match_with_one_number(&first, "not a number")
    );
}

#[test]
fn is_nanpa_country_and_geographical_checks() {
    let phone_util = get_phone_util();
    assert!(phone_util.is_nanpa_country(RegionCode::us()));
    assert!(phone_util.is_nanpa_country(RegionCode::bs()));
    assert!(!phone_util.is_nanpa_country(RegionCode::gb()));

    assert!(phone_util
        .is_number_geographical(&parse("+441212345678", RegionCode::zz()))
        .unwrap());
    // Toll-free numbers are not geographical.
    assert!(!phone_util
        .is_number_geographical(&parse("+18002345678", RegionCode::zz()))
        .unwrap());
    // Argentinian mobile numbers are geographically assigned.
    assert!(phone_util
        .is_number_geographical(&parse("+5491161234567", RegionCode::zz()))
        .unwrap());
}

#[test]
fn get_country_mobile_token() {
    let phone_util = get_phone_util();
    assert_eq!(Some('9'), phone_util.get_country_mobile_token(54));
    assert_eq!(None, phone_util.get_country_mobile_token(1));
}

#[test]
fn get_length_of_national_destination_code() {
    let phone_util = get_phone_util();
    // "+44 20 8765 4321" has the NDC "20".
    assert_eq!(
        2,
        phone_util
            .get_length_of_national_destination_code(&parse("+442087654321", RegionCode::zz()))
            .unwrap()
    );
    // "+1 443-123-4567" has the NDC "443".
    assert_eq!(
        3,
        phone_util
            .get_length_of_national_destination_code(&parse("+14431234567", RegionCode::zz()))
            .unwrap()
    );
    // Argentinian mobile numbers count the mobile token with the NDC.
    assert_eq!(
        3,
        phone_util
            .get_length_of_national_destination_code(&parse("+5491161234567", RegionCode::zz()))
            .unwrap()
    );
}

#[test]
fn can_be_internationally_dialled() {
    let phone_util = get_phone_util();
    // Nothing in the table is marked as no-international-dialling, and
    // non-geographical entities always can be dialled.
    assert!(phone_util
        .can_be_internationally_dialled(&parse("+14431234567", RegionCode::zz()))
        .unwrap());
    assert!(phone_util
        .can_be_internationally_dialled(&parse("+80012345678", RegionCode::zz()))
        .unwrap());
}
