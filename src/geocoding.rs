// Copyright (C) 2009 The Libphonenumber Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Prefix-based geographical-description lookup.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::{
    metadata,
    phonenumberutil::{PhoneNumberFormat, PHONE_NUMBER_UTIL},
    prefix_map::PrefixMap,
    proto_gen::phonenumber::PhoneNumber,
};

static GEOCODING_MAPS: LazyLock<HashMap<&'static str, PrefixMap<String>>> = LazyLock::new(|| {
    match metadata::load_geocoding_maps() {
        Ok(maps) => maps,
        Err(err) => {
            let err_message = format!("Could not decode compiled-in geocoding maps: {:?}", err);
            log::error!("{}", err_message);
            panic!("{}", err_message);
        }
    }
});

/// Returns a text description for the given phone number, in the requested
/// language when available, falling back to English: the longest matching
/// prefix entry wins. Misses yield an empty string, never an error.
pub fn get_geocoding_for_number(number: &PhoneNumber, language: &str) -> String {
    lookup_in_language_maps(&GEOCODING_MAPS, number, language).0
}

/// Shared lookup over a language → prefix-map table: the E.164 digit string
/// of the number is matched by descending prefix length, in the requested
/// language first and English second.
pub(crate) fn lookup_in_language_maps(
    maps: &HashMap<&'static str, PrefixMap<String>>,
    number: &PhoneNumber,
    language: &str,
) -> (String, u64) {
    let e164 = PHONE_NUMBER_UTIL
        .format(number, PhoneNumberFormat::E164)
        .map(|formatted| formatted.into_owned())
        .unwrap_or_default();
    let digits = PHONE_NUMBER_UTIL.normalize_digits_only(&e164);
    let mut languages = vec![language];
    if language != "en" {
        // Fall back to English.
        languages.push("en");
    }
    for candidate_language in languages {
        if let Some(map) = maps.get(candidate_language) {
            if let Some((prefix, value)) = map.lookup_longest_prefix(&digits) {
                return (value.clone(), prefix);
            }
        }
    }
    (String::new(), 0)
}
