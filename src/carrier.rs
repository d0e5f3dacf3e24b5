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

//! Prefix-based carrier-name lookup.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::{
    metadata,
    prefix_map::PrefixMap,
    proto_gen::phonenumber::PhoneNumber,
};

static CARRIER_MAPS: LazyLock<HashMap<&'static str, PrefixMap<String>>> = LazyLock::new(|| {
    match metadata::load_carrier_maps() {
        Ok(maps) => maps,
        Err(err) => {
            let err_message = format!("Could not decode compiled-in carrier maps: {:?}", err);
            log::error!("{}", err_message);
            panic!("{}", err_message);
        }
    }
});

/// Returns the name of the carrier the number was originally allocated to, in
/// the requested language when available, falling back to English. Misses
/// yield an empty string, never an error.
pub fn get_carrier_for_number(number: &PhoneNumber, language: &str) -> String {
    get_carrier_with_prefix_for_number(number, language).0
}

/// As [`get_carrier_for_number`], also reporting the prefix that matched; the
/// prefix is 0 on a miss.
pub fn get_carrier_with_prefix_for_number(number: &PhoneNumber, language: &str) -> (String, u64) {
    crate::geocoding::lookup_in_language_maps(&CARRIER_MAPS, number, language)
}
