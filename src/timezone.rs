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

//! Prefix-based timezone lookup.

use std::sync::LazyLock;

use crate::{
    metadata,
    phonenumberutil::{PhoneNumberFormat, PHONE_NUMBER_UTIL},
    prefix_map::PrefixMap,
    proto_gen::phonenumber::PhoneNumber,
};

/// Returned when no timezone data matches a number.
pub const UNKNOWN_TIMEZONE: &str = "Etc/Unknown";

static TIMEZONE_MAP: LazyLock<PrefixMap<Vec<String>>> = LazyLock::new(|| {
    match metadata::load_timezone_map() {
        Ok(map) => map,
        Err(err) => {
            let err_message = format!("Could not decode compiled-in timezone map: {:?}", err);
            log::error!("{}", err_message);
            panic!("{}", err_message);
        }
    }
});

/// Returns the list of timezones the number could be in, by longest matching
/// prefix. The lists in the table are pre-sorted; `["Etc/Unknown"]` is
/// returned when nothing matches.
pub fn get_timezones_for_number(number: &PhoneNumber) -> Vec<String> {
    let e164 = PHONE_NUMBER_UTIL
        .format(number, PhoneNumberFormat::E164)
        .map(|formatted| formatted.into_owned())
        .unwrap_or_default();
    lookup(&PHONE_NUMBER_UTIL.normalize_digits_only(&e164))
}

/// As [`get_timezones_for_number`], over a free-form prefix string such as
/// "+442073238299"; any non-digit characters are dropped before the lookup.
pub fn get_timezones_for_prefix(number: &str) -> Vec<String> {
    lookup(&PHONE_NUMBER_UTIL.normalize_digits_only(number))
}

fn lookup(digits: &str) -> Vec<String> {
    match TIMEZONE_MAP.lookup_longest_prefix(digits) {
        Some((_, timezones)) => timezones.clone(),
        None => vec![UNKNOWN_TIMEZONE.to_string()],
    }
}
