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

//! Methods for getting information about short phone numbers, such as short
//! codes and emergency numbers. These operate over a dedicated short-number
//! metadata set, separate from the one that drives the main engine.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use log::error;

use crate::{
    interfaces::MatcherApi,
    metadata,
    phonenumberutil::{
        helper_functions::desc_has_possible_number_data, PhoneNumberUtil, PHONE_NUMBER_UTIL,
    },
    proto_gen::{
        phonemetadata::{PhoneMetadata, PhoneNumberDesc},
        phonenumber::PhoneNumber,
    },
    regex_based_matcher::RegexBasedMatcher,
    regex_util::RegexConsume,
};

/// The cost category of a short number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShortNumberCost {
    /// The cost of this call is free for the caller.
    TollFree,
    /// The cost of this call is the cost of a normal call.
    StandardRate,
    /// The cost is higher than a normal call.
    PremiumRate,
    /// The cost information is not available.
    UnknownCost,
}

/// The process-wide short-number engine over the compiled-in metadata.
pub static SHORT_NUMBER_INFO: LazyLock<ShortNumberInfo> = LazyLock::new(ShortNumberInfo::new);

pub struct ShortNumberInfo {
    util: &'static PhoneNumberUtil,
    matcher_api: Box<dyn MatcherApi + Send + Sync>,
    region_to_metadata_map: HashMap<String, PhoneMetadata>,
    /// In these regions a prefix of an emergency number never connects: the
    /// dialled string must match the emergency pattern exactly.
    regions_where_emergency_numbers_must_be_exact: HashSet<&'static str>,
}

impl ShortNumberInfo {
    fn new() -> Self {
        let collection = match metadata::load_short_number_metadata() {
            Err(err) => {
                let err_message =
                    format!("Could not parse compiled-in short number metadata: {:?}", err);
                error!("{}", err_message);
                panic!("{}", err_message);
            }
            Ok(collection) => collection,
        };
        let mut region_to_metadata_map = HashMap::new();
        for metadata in collection.metadata {
            let region_code = metadata.id().to_string();
            // Short number metadata for non-geographical entities is unused.
            if region_code != crate::i18n::RegionCode::un001() {
                region_to_metadata_map.insert(region_code, metadata);
            }
        }
        Self {
            util: &PHONE_NUMBER_UTIL,
            matcher_api: Box::new(RegexBasedMatcher::new()),
            region_to_metadata_map,
            regions_where_emergency_numbers_must_be_exact: HashSet::from(["BR", "CL", "NI"]),
        }
    }

    fn get_metadata_for_region(&self, region_code: &str) -> Option<&PhoneMetadata> {
        self.region_to_metadata_map.get(region_code)
    }

    /// Helper method to check that the country calling code of the number
    /// matches the region it's being dialed from.
    fn region_dialing_from_matches_number(
        &self,
        number: &PhoneNumber,
        region_dialing_from: &str,
    ) -> bool {
        self.util
            .get_region_codes_for_country_calling_code(number.country_code())
            .contains(&region_dialing_from)
    }

    fn matches_possible_number_and_national_number(
        &self,
        number: &str,
        number_desc: &PhoneNumberDesc,
    ) -> bool {
        if !number_desc.possible_length.is_empty()
            && !number_desc.possible_length.contains(&(number.len() as i32))
        {
            return false;
        }
        self.matcher_api.match_national_number(number, number_desc, false)
    }

    /// Check whether a short number is a possible number. If a country
    /// calling code is shared by multiple regions, this returns true if it's
    /// possible in any of them. This provides a more lenient check than
    /// [`Self::is_valid_short_number`].
    pub fn is_possible_short_number(&self, number: &PhoneNumber) -> bool {
        let region_codes = self
            .util
            .get_region_codes_for_country_calling_code(number.country_code());
        let short_number_length =
            PhoneNumberUtil::get_national_significant_number(number).len() as i32;
        for region in region_codes {
            let Some(metadata) = self.get_metadata_for_region(region) else {
                continue;
            };
            if metadata.general_desc.possible_length.contains(&short_number_length) {
                return true;
            }
        }
        false
    }

    /// Check whether a short number is a possible number when dialed from the
    /// given region: a length check against the short-number general
    /// descriptor only.
    pub fn is_possible_short_number_for_region(
        &self,
        number: &PhoneNumber,
        region_dialing_from: &str,
    ) -> bool {
        if !self.region_dialing_from_matches_number(number, region_dialing_from) {
            return false;
        }
        let Some(metadata) = self.get_metadata_for_region(region_dialing_from) else {
            return false;
        };
        let number_length = PhoneNumberUtil::get_national_significant_number(number).len() as i32;
        metadata.general_desc.possible_length.contains(&number_length)
    }

    /// Tests whether a short number matches a valid pattern. If a country
    /// calling code is shared by multiple regions, this returns true if it's
    /// valid in any of them. Note that this doesn't verify the number is
    /// actually in use, which is impossible to tell by just looking at the
    /// number itself.
    pub fn is_valid_short_number(&self, number: &PhoneNumber) -> bool {
        let region_codes = self
            .util
            .get_region_codes_for_country_calling_code(number.country_code());
        let region_code = self.get_region_code_for_short_number_from_region_list(number, &region_codes);
        if region_codes.len() > 1 && region_code.is_some() {
            // If a matching region had been found for the phone number from among two
            // or more regions, then we have already implicitly verified its validity
            // for that region.
            return true;
        }
        self.is_valid_short_number_for_region(number, region_code.unwrap_or_default())
    }

    /// Tests whether a short number matches a valid pattern in a region.
    pub fn is_valid_short_number_for_region(
        &self,
        number: &PhoneNumber,
        region_dialing_from: &str,
    ) -> bool {
        if !self.region_dialing_from_matches_number(number, region_dialing_from) {
            return false;
        }
        let Some(metadata) = self.get_metadata_for_region(region_dialing_from) else {
            return false;
        };
        let short_number = PhoneNumberUtil::get_national_significant_number(number);
        if !self.matches_possible_number_and_national_number(&short_number, &metadata.general_desc)
        {
            return false;
        }
        self.matches_possible_number_and_national_number(&short_number, &metadata.short_code)
    }

    /// Gets the expected cost category of a short number when dialed from a
    /// region. The cost categories are tested in order of decreasing expense,
    /// since if for some reason the patterns overlap the most expensive
    /// matching cost category should be returned.
    pub fn get_expected_cost_for_region(
        &self,
        number: &PhoneNumber,
        region_dialing_from: &str,
    ) -> ShortNumberCost {
        if !self.region_dialing_from_matches_number(number, region_dialing_from) {
            return ShortNumberCost::UnknownCost;
        }
        let Some(metadata) = self.get_metadata_for_region(region_dialing_from) else {
            return ShortNumberCost::UnknownCost;
        };
        let short_number = PhoneNumberUtil::get_national_significant_number(number);

        // The possible lengths are not present for a particular sub-type if they
        // match the general description; for this reason, we check the possible
        // lengths against the general description first to allow an early exit if
        // possible.
        if !metadata
            .general_desc
            .possible_length
            .contains(&(short_number.len() as i32))
        {
            return ShortNumberCost::UnknownCost;
        }
        if self.matches_possible_number_and_national_number(&short_number, &metadata.premium_rate) {
            return ShortNumberCost::PremiumRate;
        }
        if self.matches_possible_number_and_national_number(&short_number, &metadata.standard_rate)
        {
            return ShortNumberCost::StandardRate;
        }
        if self.matches_possible_number_and_national_number(&short_number, &metadata.toll_free) {
            return ShortNumberCost::TollFree;
        }
        if self.is_emergency_number(&short_number, region_dialing_from) {
            // Emergency numbers are implicitly toll-free.
            return ShortNumberCost::TollFree;
        }
        ShortNumberCost::UnknownCost
    }

    fn get_region_code_for_short_number_from_region_list<'b>(
        &self,
        number: &PhoneNumber,
        region_codes: &[&'b str],
    ) -> Option<&'b str> {
        if region_codes.is_empty() {
            return None;
        }
        if region_codes.len() == 1 {
            return Some(region_codes[0]);
        }
        let national_number = PhoneNumberUtil::get_national_significant_number(number);
        for region_code in region_codes {
            if let Some(metadata) = self.get_metadata_for_region(region_code) {
                if desc_has_possible_number_data(&metadata.short_code)
                    && self.matches_possible_number_and_national_number(
                        &national_number,
                        &metadata.short_code,
                    )
                {
                    // The number is valid for this region.
                    return Some(region_code);
                }
            }
        }
        None
    }

    /// Returns true if the given number, exactly as dialed, might be used to
    /// connect to an emergency service in the given region. A prefix match is
    /// allowed except in regions where the emergency number must be dialled
    /// exactly.
    pub fn connects_to_emergency_number(&self, number: &str, region_code: &str) -> bool {
        self.matches_emergency_number_helper(number, region_code, true)
    }

    /// Returns true if the given number exactly matches an emergency service
    /// number in the given region.
    pub fn is_emergency_number(&self, number: &str, region_code: &str) -> bool {
        self.matches_emergency_number_helper(number, region_code, false)
    }

    fn matches_emergency_number_helper(
        &self,
        number: &str,
        region_code: &str,
        allow_prefix_match: bool,
    ) -> bool {
        let Ok(possible_number) = self.util.extract_possible_number(number) else {
            return false;
        };
        if self
            .util
            .reg_exps
            .plus_chars_pattern
            .consume_start(&possible_number)
            .is_some()
        {
            // Returns false if the number starts with a plus sign. We don't believe
            // dialing the country code before emergency numbers (e.g. +1911) works,
            // but later, if that proves to work, we can add additional logic here to
            // handle it.
            return false;
        }
        let Some(metadata) = self.get_metadata_for_region(region_code) else {
            return false;
        };
        if !metadata.emergency.has_national_number_pattern() {
            return false;
        }
        let normalized_number = self.util.normalize_digits_only(&possible_number);
        let allow_prefix_match_for_region = allow_prefix_match
            && !self
                .regions_where_emergency_numbers_must_be_exact
                .contains(region_code);
        self.matcher_api.match_national_number(
            &normalized_number,
            &metadata.emergency,
            allow_prefix_match_for_region,
        )
    }
}
