pub mod carrier;
pub mod geocoding;
pub mod i18n;
pub mod timezone;

mod interfaces;
mod metadata;
mod phonenumbermatcher;
mod phonenumberutil;
mod prefix_map;
/// This module is automatically generated from /resources/*.proto
mod proto_gen;
mod regex_based_matcher;
mod regexp_cache;
mod shortnumberinfo;

pub(crate) mod regex_util;
pub(crate) mod string_util;

/// I decided to create this module because there are many
/// boilerplate places in the code that can be replaced with macros,
/// the name of which will describe what is happening more
/// clearly than a few lines of code.
mod macros;

#[cfg(test)]
mod tests;

pub use phonenumbermatcher::{Leniency, PhoneNumberMatch, PhoneNumberMatcher};
pub use phonenumberutil::{
    ExtractNumberError, GetExampleNumberError, MatchType, NotANumberError, ParseError,
    PhoneNumberFormat, PhoneNumberType, PhoneNumberUtil, PhoneNumberUtilError, ValidNumberLenType,
    ValidationResultErr, PHONE_NUMBER_UTIL,
};
pub use proto_gen::phonemetadata::{
    NumberFormat, PhoneMetadata, PhoneMetadataCollection, PhoneNumberDesc,
};
pub use proto_gen::phonenumber::{phone_number::CountryCodeSource, PhoneNumber};
pub use shortnumberinfo::{ShortNumberCost, ShortNumberInfo, SHORT_NUMBER_INFO};

pub use carrier::{get_carrier_for_number, get_carrier_with_prefix_for_number};
pub use geocoding::get_geocoding_for_number;
pub use timezone::{get_timezones_for_number, get_timezones_for_prefix};

/// Returns a scanner over `text` that yields the phone-number-like
/// substrings acceptable under `leniency`, using the process-wide engine and
/// `region` as the default region for numbers written in national format.
pub fn text_scanner<'a>(
    text: &'a str,
    region: &'a str,
    leniency: Leniency,
) -> PhoneNumberMatcher<'a> {
    PhoneNumberMatcher::with_leniency(&PHONE_NUMBER_UTIL, text, region, leniency, 65535)
}
