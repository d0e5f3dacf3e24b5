use std::{
    borrow::Cow,
    cmp::max,
    collections::{HashMap, HashSet, VecDeque},
};

use super::phone_number_regexps_and_mappings::PhoneNumberRegExpsAndMappings;
use crate::{
    i18n,
    interfaces::MatcherApi,
    macros::owned_from_cow_or,
    metadata,
    phonenumberutil::{
        errors::{
            ExtractNumberError, GetExampleNumberError, NotANumberError, ParseError,
            ParseErrorInternal, PhoneNumberUtilError, ValidationResultErr,
        },
        helper_constants::{
            DEFAULT_EXTN_PREFIX, MAX_INPUT_STRING_LENGTH, MAX_LENGTH_COUNTRY_CODE,
            MAX_LENGTH_FOR_NSN, MIN_LENGTH_FOR_NSN, NANPA_COUNTRY_CODE, PLUS_SIGN,
            REGION_CODE_FOR_NON_GEO_ENTITY, RFC3966_EXTN_PREFIX, RFC3966_ISDN_SUBADDRESS,
            RFC3966_PHONE_CONTEXT, RFC3966_PREFIX,
        },
        helper_functions::{
            self, copy_core_fields_only, get_number_desc_by_type,
            get_supported_types_for_metadata, is_national_number_suffix_of_the_other, is_match,
            normalize_helper, prefix_number_with_country_calling_code, test_number_length,
            test_number_length_with_unknown_type,
        },
        MatchType, PhoneNumberFormat, PhoneNumberType, ValidNumberLenType,
    },
    proto_gen::{
        phonemetadata::{NumberFormat, PhoneMetadata, PhoneMetadataCollection, PhoneNumberDesc},
        phonenumber::{phone_number::CountryCodeSource, PhoneNumber},
    },
    regex_based_matcher::RegexBasedMatcher,
    regex_util::{RegexConsume, RegexFullMatch},
    string_util::strip_cow_prefix,
};

use log::{trace, warn};

// Helper type for Result
pub type Result<T> = std::result::Result<T, PhoneNumberUtilError>;

pub struct PhoneNumberUtil {
    /// An API for validation checking.
    matcher_api: Box<dyn MatcherApi + Send + Sync>,

    /// Helper class holding useful regular expressions and character mappings.
    pub(crate) reg_exps: PhoneNumberRegExpsAndMappings,

    /// A mapping from a country calling code to a RegionCode object which denotes
    /// the region represented by that country calling code. Note regions under
    /// NANPA share the country calling code 1 and Russia and Kazakhstan share the
    /// country calling code 7. Under this map, 1 is mapped to region code "US" and
    /// 7 is mapped to region code "RU". This is implemented as a sorted vector to
    /// achieve better performance.
    country_calling_code_to_region_code_map: Vec<(i32, Vec<String>)>,

    /// The set of regions that share country calling code 1.
    nanpa_regions: HashSet<String>,

    /// A mapping from a region code to a PhoneMetadata for that region.
    region_to_metadata_map: HashMap<String, PhoneMetadata>,

    /// A mapping from a country calling code for a non-geographical entity to the
    /// PhoneMetadata for that country calling code. Examples of the country
    /// calling codes include 800 (International Toll Free Service) and 808
    /// (International Shared Cost Service).
    country_code_to_non_geographical_metadata_map: HashMap<i32, PhoneMetadata>,
}

impl PhoneNumberUtil {
    /// Builds the engine from the compiled-in metadata blobs. The country
    /// calling code ordering comes from the embedded region map, whose first
    /// region for each code is the primary one. Failure here is fatal: the
    /// tables ship with the binary, so a decode error is a broken build.
    pub(super) fn new() -> Self {
        let metadata_collection = match metadata::load_number_metadata() {
            Err(err) => {
                let err_message = format!("Could not parse compiled-in metadata: {:?}", err);
                log::error!("{}", err_message);
                panic!("{}", err_message);
            }
            Ok(metadata) => metadata,
        };
        let region_map = match metadata::load_country_code_to_regions() {
            Err(err) => {
                let err_message =
                    format!("Could not decode compiled-in region map: {:?}", err);
                log::error!("{}", err_message);
                panic!("{}", err_message);
            }
            Ok(map) => map,
        };
        let mut country_calling_code_to_region_code_map = region_map
            .iter()
            .map(|(code, regions)| (*code as i32, regions.clone()))
            .collect::<Vec<_>>();
        country_calling_code_to_region_code_map.sort_by_key(|(code, _)| *code);
        Self::with_metadata(metadata_collection, country_calling_code_to_region_code_map)
    }

    /// Builds the engine over a caller-supplied metadata collection, deriving
    /// the country-code map from the descriptors themselves. The test suites
    /// use this with cut-down metadata.
    pub fn new_for_metadata(metadata_collection: PhoneMetadataCollection) -> Self {
        // Storing data in a temporary map to make it easier to find other regions
        // that share a country calling code when inserting data.
        let mut country_calling_code_to_region_map = HashMap::<i32, VecDeque<String>>::new();
        for metadata in &metadata_collection.metadata {
            let region_code = metadata.id();
            if i18n::RegionCode::get_unknown() == region_code {
                continue;
            }
            let country_calling_code = metadata.country_code();
            let calling_code_in_map_o =
                country_calling_code_to_region_map.get_mut(&country_calling_code);
            if let Some(calling_code_in) = calling_code_in_map_o {
                if metadata.main_country_for_code() {
                    calling_code_in.push_front(region_code.to_owned());
                } else {
                    calling_code_in.push_back(region_code.to_owned());
                }
            } else {
                // For most country calling codes, there will be only one region code.
                let mut list_with_region_code = VecDeque::new();
                list_with_region_code.push_back(region_code.to_owned());
                country_calling_code_to_region_map
                    .insert(country_calling_code, list_with_region_code);
            }
        }
        let mut country_calling_code_to_region_code_map = country_calling_code_to_region_map
            .into_iter()
            .map(|(code, regions)| (code, Vec::from(regions)))
            .collect::<Vec<_>>();
        // Sort all the pairs in ascending order according to country calling code.
        country_calling_code_to_region_code_map.sort_by_key(|(code, _)| *code);
        Self::with_metadata(metadata_collection, country_calling_code_to_region_code_map)
    }

    fn with_metadata(
        metadata_collection: PhoneMetadataCollection,
        country_calling_code_to_region_code_map: Vec<(i32, Vec<String>)>,
    ) -> Self {
        let mut instance = Self {
            matcher_api: Box::new(RegexBasedMatcher::new()),
            reg_exps: PhoneNumberRegExpsAndMappings::new(),
            country_calling_code_to_region_code_map,
            nanpa_regions: Default::default(),
            region_to_metadata_map: Default::default(),
            country_code_to_non_geographical_metadata_map: Default::default(),
        };
        for metadata in metadata_collection.metadata {
            let region_code = metadata.id().to_string();
            if i18n::RegionCode::get_unknown() == region_code {
                continue;
            }
            let country_calling_code = metadata.country_code();
            if REGION_CODE_FOR_NON_GEO_ENTITY == region_code {
                instance
                    .country_code_to_non_geographical_metadata_map
                    .insert(country_calling_code, metadata);
            } else {
                instance
                    .region_to_metadata_map
                    .insert(region_code.clone(), metadata);
            }
            if country_calling_code == NANPA_COUNTRY_CODE {
                instance.nanpa_regions.insert(region_code);
            }
        }
        instance
    }

    pub fn get_supported_regions(&self) -> Vec<&str> {
        let mut regions = Vec::new();
        for (region, _) in self.region_to_metadata_map.iter() {
            regions.push(region.as_str());
        }
        regions
    }

    pub fn get_supported_global_network_calling_codes(&self) -> HashSet<i32> {
        let mut codes = HashSet::new();
        for (code, _) in self.country_code_to_non_geographical_metadata_map.iter() {
            codes.insert(*code);
        }
        codes
    }

    pub fn get_supported_calling_codes(&self) -> HashSet<i32> {
        let mut codes = HashSet::new();
        for (code, _) in self.country_calling_code_to_region_code_map.iter() {
            codes.insert(*code);
        }
        codes
    }

    pub fn get_supported_types_for_region(
        &self,
        region_code: &str,
    ) -> Option<HashSet<PhoneNumberType>> {
        self.region_to_metadata_map
            .get(region_code)
            .map(|metadata| get_supported_types_for_metadata(metadata))
            .or_else(|| {
                warn!("Invalid or unknown region code provided: {}", region_code);
                None
            })
    }

    pub fn get_supported_types_for_non_geo_entity(
        &self,
        country_calling_code: i32,
    ) -> Option<HashSet<PhoneNumberType>> {
        self.country_code_to_non_geographical_metadata_map
            .get(&country_calling_code)
            .map(|metadata| get_supported_types_for_metadata(metadata))
            .or_else(|| {
                warn!(
                    "Unknown country calling code for a non-geographical entity provided: {}",
                    country_calling_code
                );
                None
            })
    }

    pub(crate) fn get_extn_patterns_for_matching(&self) -> &str {
        return &self.reg_exps.extn_patterns_for_matching;
    }

    fn starts_with_plus_chars_pattern(&self, phone_number: &str) -> bool {
        self.reg_exps
            .plus_chars_pattern
            .consume_start(phone_number)
            .is_some()
    }

    fn trim_unwanted_end_chars(&self, phone_number: &mut String) {
        let mut bytes_to_trim = 0;

        for char in phone_number.chars().rev() {
            if !self
                .reg_exps
                .unwanted_end_char_pattern
                .full_match(&char.to_string())
            {
                break;
            }
            bytes_to_trim += char.len_utf8();
        }

        if bytes_to_trim > 0 {
            let new_len = phone_number.len() - bytes_to_trim;
            phone_number.truncate(new_len);
        }
    }

    pub(crate) fn formatting_rule_has_first_group_only(
        &self,
        national_prefix_formatting_rule: &str,
    ) -> bool {
        return national_prefix_formatting_rule.is_empty()
            || self
                .reg_exps
                .formatting_rule_has_first_group_only_regex
                .full_match(national_prefix_formatting_rule);
    }

    /// Returns the national dialling prefix for a region, for example "0" for
    /// New Zealand. A "~" in the prefix means waiting for the dialling tone;
    /// pass strip_non_digits to remove it.
    pub fn get_ndd_prefix_for_region(
        &self,
        region_code: &str,
        strip_non_digits: bool,
    ) -> Option<String> {
        self.region_to_metadata_map
            .get(region_code)
            .map(|metadata| {
                let mut prefix = metadata.national_prefix().to_owned();
                if strip_non_digits {
                    prefix = prefix.replace("~", "");
                }
                prefix
            })
            .or_else(|| {
                warn!("Invalid or unknown region code ({}) provided.", region_code);
                None
            })
    }

    fn is_valid_region_code(&self, region_code: &str) -> bool {
        return self.region_to_metadata_map.contains_key(region_code);
    }

    pub(crate) fn get_metadata_for_region(&self, region_code: &str) -> Option<&PhoneMetadata> {
        self.region_to_metadata_map.get(region_code)
    }

    // ------------------------------------------------------------------
    // Normalization
    // ------------------------------------------------------------------

    /// Keeps only decimal digits, converting full-width and Arabic-Indic
    /// forms to their ASCII value.
    pub fn normalize_digits_only(&self, number: &str) -> String {
        normalize_helper(&self.reg_exps.digit_mappings, true, number)
    }

    pub(crate) fn normalize_digits(&self, number: &str, keep_non_digits: bool) -> String {
        normalize_helper(&self.reg_exps.digit_mappings, !keep_non_digits, number)
    }

    /// Normalizes a string of characters representing a phone number. This
    /// converts wide-ascii and arabic-indic numerals to European numerals,
    /// and strips punctuation and alpha characters - unless the number looks
    /// like a vanity number, in which case letters are converted to their
    /// keypad digit.
    pub fn normalize(&self, number: &str) -> String {
        if self.reg_exps.valid_alpha_phone_pattern.full_match(number) {
            normalize_helper(&self.reg_exps.alpha_phone_mappings, true, number)
        } else {
            self.normalize_digits_only(number)
        }
    }

    /// Converts all alpha characters in a number to their respective digits,
    /// but retains existing formatting.
    pub fn convert_alpha_characters_in_number(&self, number: &str) -> String {
        normalize_helper(&self.reg_exps.alpha_phone_mappings, false, number)
    }

    /// Retains only the characters that can actually be dialled: digits and
    /// the '+', '*' and '#' signs.
    pub fn normalize_diallable_chars_only(&self, phone_number: &str) -> String {
        normalize_helper(&self.reg_exps.diallable_char_mappings, true, phone_number)
    }

    /// Checks to see if the string of characters could possibly be a phone
    /// number at all: length and allowed characters, not validity.
    pub fn is_viable_phone_number(&self, number: &str) -> bool {
        if number.chars().count() < MIN_LENGTH_FOR_NSN {
            return false;
        }
        self.reg_exps.valid_phone_number_pattern.full_match(number)
    }

    /// Attempts to extract a possible number from the string passed in.
    /// Leading characters that can not start a phone number are dropped, as
    /// are trailing non-alphanumeric characters and anything that looks like
    /// the start of a second number.
    pub(crate) fn extract_possible_number(
        &self,
        number: &str,
    ) -> std::result::Result<String, ExtractNumberError> {
        let Some(start) = self.reg_exps.valid_start_char_pattern.find(number) else {
            return Err(ExtractNumberError::NoValidStartCharacter);
        };
        let mut possible_number = number[start.start()..].to_string();
        self.trim_unwanted_end_chars(&mut possible_number);
        if possible_number.is_empty() {
            return Err(ExtractNumberError::NotANumber);
        }
        // Check for extra numbers at the end; everything up to the marker is
        // captured as the first number.
        if let Some(captures) = self
            .reg_exps
            .capture_up_to_second_number_start_pattern
            .captures(&possible_number)
        {
            if let Some(first_number) = captures.get(1) {
                possible_number.truncate(first_number.end());
            }
        }
        Ok(possible_number)
    }

    // ------------------------------------------------------------------
    // Parsing
    // ------------------------------------------------------------------

    /// Parses a string and returns it as a phone number in proto buffer
    /// format. The method is quite lenient and looks for a number in the
    /// input text (raw input) and does not check whether the string is
    /// definitely only a phone number.
    pub fn parse(
        &self,
        number_to_parse: &str,
        default_region: &str,
    ) -> std::result::Result<PhoneNumber, ParseError> {
        let mut phone_number = PhoneNumber::new();
        self.parse_to_number(number_to_parse, default_region, &mut phone_number)?;
        Ok(phone_number)
    }

    /// Variant of [`Self::parse`] writing into a caller-supplied number.
    pub fn parse_to_number(
        &self,
        number_to_parse: &str,
        default_region: &str,
        phone_number: &mut PhoneNumber,
    ) -> std::result::Result<(), ParseError> {
        self.parse_helper(number_to_parse, default_region, false, true, phone_number)
            .map_err(ParseErrorInternal::into_public)
    }

    /// Parses a string as in [`Self::parse`], but records the raw input, the
    /// country code source, and the preferred domestic carrier code in the
    /// returned number.
    pub fn parse_and_keep_raw_input(
        &self,
        number_to_parse: &str,
        default_region: &str,
    ) -> std::result::Result<PhoneNumber, ParseError> {
        let mut phone_number = PhoneNumber::new();
        self.parse_helper(number_to_parse, default_region, true, true, &mut phone_number)
            .map_err(ParseErrorInternal::into_public)?;
        Ok(phone_number)
    }

    fn check_region_for_parsing(&self, number_to_parse: &str, default_region: &str) -> bool {
        self.is_valid_region_code(default_region)
            || (!number_to_parse.is_empty() && self.starts_with_plus_chars_pattern(number_to_parse))
    }

    /// Converts `number_to_parse` to a form that we can parse and writes it
    /// to `national_number` (it is written to anyway during the process of
    /// parsing): handles the RFC3966 `tel:` syntax with its `phone-context`
    /// and `isub` parameters, or extracts a possible number out of free text.
    fn build_national_number_for_parsing(
        &self,
        number_to_parse: &str,
    ) -> std::result::Result<String, ParseErrorInternal> {
        let mut national_number = String::with_capacity(number_to_parse.len());
        if let Some(index_of_phone_context) = number_to_parse.find(RFC3966_PHONE_CONTEXT) {
            let phone_context_start = index_of_phone_context + RFC3966_PHONE_CONTEXT.len();
            let rest = &number_to_parse[phone_context_start..];
            let phone_context = match rest.find(';') {
                Some(end) => &rest[..end],
                None => rest,
            };
            // The phone-context is either a global number or a domain name.
            let is_valid_context = if phone_context.starts_with(PLUS_SIGN) {
                self.reg_exps
                    .rfc3966_global_number_digits_pattern
                    .full_match(phone_context)
            } else {
                !phone_context.is_empty()
                    && self.reg_exps.rfc3966_domainname_pattern.full_match(phone_context)
            };
            if !is_valid_context {
                return Err(NotANumberError::InvalidPhoneContext.into());
            }
            if phone_context.starts_with(PLUS_SIGN) {
                // Additional parameters might follow the phone context. If so,
                // we will remove them here because the parameters after phone
                // context are not important for parsing the phone number.
                national_number.push_str(phone_context);
            }

            // Now append everything between the "tel:" prefix and the
            // phone-context. This should include the national number, an
            // optional extension or isdn-subaddress component.
            let before_context = &number_to_parse[..index_of_phone_context];
            let number_part = match strip_cow_prefix(Cow::Borrowed(before_context), RFC3966_PREFIX)
            {
                Some(stripped) => stripped,
                None => match before_context.find(RFC3966_PREFIX) {
                    Some(index) => Cow::Borrowed(&before_context[index + RFC3966_PREFIX.len()..]),
                    None => Cow::Borrowed(before_context),
                },
            };
            national_number.push_str(&number_part);
        } else {
            // Extract a possible number from the string passed in (this
            // strips leading characters that could not be the start of a
            // phone number).
            national_number.push_str(&self.extract_possible_number(number_to_parse)?);
        }

        // Delete the isdn-subaddress and everything after it if it is present.
        if let Some(index_of_isdn) = national_number.find(RFC3966_ISDN_SUBADDRESS) {
            national_number.truncate(index_of_isdn);
        }
        // If both phone context and isdn-subaddress are absent but other
        // parameters are present, the parameters are left in national_number.
        // This is because we are concerned about deleting content from a
        // potential number string when there is no strong evidence that the
        // number is actually written in RFC3966.
        Ok(national_number)
    }

    fn parse_helper(
        &self,
        number_to_parse: &str,
        default_region: &str,
        keep_raw_input: bool,
        check_region: bool,
        phone_number: &mut PhoneNumber,
    ) -> std::result::Result<(), ParseErrorInternal> {
        if number_to_parse.len() > MAX_INPUT_STRING_LENGTH {
            return Err(ParseError::TooLongNsn.into());
        }

        let mut national_number = self.build_national_number_for_parsing(number_to_parse)?;

        if !self.is_viable_phone_number(&national_number) {
            trace!("The string supplied did not seem to be a phone number.");
            return Err(NotANumberError::NotMatchedValidNumberPattern.into());
        }

        // Check the region supplied is valid, or that the extracted number
        // starts with some sort of + sign so the number's region can be determined.
        if check_region && !self.check_region_for_parsing(&national_number, default_region) {
            trace!("Missing or invalid default country.");
            return Err(ParseErrorInternal::FailedToParse(
                ParseError::InvalidCountryCode,
            ));
        }

        if keep_raw_input {
            phone_number.set_raw_input(number_to_parse.to_string());
        }

        if let Some(extension) = self.maybe_strip_extension(&mut national_number) {
            phone_number.set_extension(extension);
        }

        let mut region_metadata = self.get_metadata_for_region(default_region);

        // Attempt to parse the first digits as an international prefix or a
        // country calling code.
        let mut normalized_national_number = String::new();
        let mut country_code = match self.maybe_extract_country_code(
            &national_number,
            region_metadata,
            keep_raw_input,
            &mut normalized_national_number,
            phone_number,
        ) {
            Ok(code) => code,
            Err(ParseErrorInternal::FailedToParse(ParseError::InvalidCountryCode)) => {
                // Strip the plus-char and try again; this allows numbers that
                // are written with an invalid-looking "+" prefix like "+ 1 "
                // followed by a local number.
                let Some((rest, _)) = self
                    .reg_exps
                    .plus_chars_pattern
                    .consume_start_capturing(&national_number)
                else {
                    return Err(ParseError::InvalidCountryCode.into());
                };
                normalized_national_number.clear();
                let code = self.maybe_extract_country_code(
                    rest.as_ref(),
                    region_metadata,
                    keep_raw_input,
                    &mut normalized_national_number,
                    phone_number,
                )?;
                if code == 0 {
                    return Err(ParseError::InvalidCountryCode.into());
                }
                code
            }
            Err(err) => return Err(err),
        };

        if country_code != 0 {
            let phone_number_region = self.get_region_code_for_country_code(country_code);
            if phone_number_region != default_region {
                region_metadata =
                    self.get_metadata_for_region_or_calling_code(country_code, phone_number_region);
            }
        } else {
            // If no extracted country calling code, use the region supplied
            // instead. The national number is just the normalized version of
            // the number we were given to parse.
            if let Some(metadata) = region_metadata {
                country_code = metadata.country_code();
            }
        }

        if normalized_national_number.len() < MIN_LENGTH_FOR_NSN {
            trace!("The string supplied is too short to be a phone number.");
            return Err(ParseError::TooShortNsn.into());
        }

        if let Some(metadata) = region_metadata {
            let mut carrier_code = String::new();
            let mut potential_national_number = normalized_national_number.clone();
            self.maybe_strip_national_prefix_and_carrier_code(
                &mut potential_national_number,
                metadata,
                Some(&mut carrier_code),
            )?;
            // We require that the NSN remaining after stripping the national
            // prefix and carrier code be long enough to be a possible length
            // for the region. Otherwise, we don't do the stripping, since the
            // original number could be a valid short number.
            let validation_result =
                test_number_length_with_unknown_type(&potential_national_number, metadata);
            if !matches!(
                validation_result,
                Err(ValidationResultErr::TooShort) | Err(ValidationResultErr::InvalidLength)
            ) && validation_result != Ok(ValidNumberLenType::IsPossibleLocalOnly)
            {
                normalized_national_number = potential_national_number;
                if keep_raw_input && !carrier_code.is_empty() {
                    phone_number.set_preferred_domestic_carrier_code(carrier_code);
                }
            }
        }

        let length_of_national_number = normalized_national_number.len();
        if length_of_national_number < MIN_LENGTH_FOR_NSN {
            trace!("The string supplied is too short to be a phone number.");
            return Err(ParseError::TooShortNsn.into());
        }
        if length_of_national_number > MAX_LENGTH_FOR_NSN {
            trace!("The string supplied is too long to be a phone number.");
            return Err(ParseError::TooLongNsn.into());
        }

        Self::set_italian_leading_zeros_for_phone_number(
            &normalized_national_number,
            phone_number,
        );
        let parsed = normalized_national_number
            .parse::<u64>()
            .map_err(|err| ParseError::NotANumber(NotANumberError::FailedToParseNumberAsInt(err)))?;
        phone_number.set_country_code(country_code);
        phone_number.set_national_number(parsed);
        Ok(())
    }

    /// A helper function to set the values related to leading zeros in a
    /// PhoneNumber.
    fn set_italian_leading_zeros_for_phone_number(
        national_number: &str,
        phone_number: &mut PhoneNumber,
    ) {
        if national_number.len() > 1 && national_number.starts_with('0') {
            phone_number.set_italian_leading_zero(true);
            let bytes = national_number.as_bytes();
            let mut number_of_leading_zeros = 1;
            // Note that if the national number is all "0"s, the last "0" is
            // not counted as a leading zero.
            while number_of_leading_zeros < bytes.len() - 1
                && bytes[number_of_leading_zeros] == b'0'
            {
                number_of_leading_zeros += 1;
            }
            if number_of_leading_zeros != 1 {
                phone_number.set_number_of_leading_zeros(number_of_leading_zeros as i32);
            }
        }
    }

    /// Strips any extension (as in, the part of the number dialled after the
    /// call is connected, usually indicated with extn, ext, x or similar)
    /// from the end of the number, and returns it.
    pub(crate) fn maybe_strip_extension(&self, number: &mut String) -> Option<String> {
        let (start, extension) = {
            let captures = self.reg_exps.extn_pattern.captures(number)?;
            let whole_match = captures.get(0)?;
            if !self.is_viable_phone_number(&number[..whole_match.start()]) {
                return None;
            }
            // The numbers are captured into groups in the regular expression.
            let extension = captures
                .iter()
                .skip(1)
                .flatten()
                .next()
                .map(|group| group.as_str().to_string())?;
            (whole_match.start(), extension)
        };
        number.truncate(start);
        Some(extension)
    }

    /// Strips any international prefix (such as +, 00, 011) present in the
    /// number, normalizes the resulting number, and reports the way the
    /// country code was indicated.
    fn maybe_strip_international_prefix_and_normalize(
        &self,
        number: &mut String,
        possible_idd_prefix: Option<&str>,
    ) -> std::result::Result<CountryCodeSource, ParseErrorInternal> {
        if number.is_empty() {
            return Ok(CountryCodeSource::FROM_DEFAULT_COUNTRY);
        }
        // Check to see if the number begins with one or more plus signs.
        if let Some(rest) = self.reg_exps.plus_chars_pattern.consume_start(number) {
            let rest = rest.to_string();
            *number = self.normalize(&rest);
            return Ok(CountryCodeSource::FROM_NUMBER_WITH_PLUS_SIGN);
        }
        // Attempt to parse the first digits as an international prefix.
        let Some(possible_idd_prefix) = possible_idd_prefix else {
            *number = self.normalize(number);
            return Ok(CountryCodeSource::FROM_DEFAULT_COUNTRY);
        };
        let idd_pattern = self
            .reg_exps
            .regexp_cache
            .get_prefix_match_regex(possible_idd_prefix)
            .map_err(ParseErrorInternal::RegexError)?;
        *number = self.normalize(number);
        Ok(if self.parse_prefix_as_idd(&idd_pattern, number) {
            CountryCodeSource::FROM_NUMBER_WITH_IDD
        } else {
            CountryCodeSource::FROM_DEFAULT_COUNTRY
        })
    }

    /// Strips the IDD from the start of the number if present. Helper
    /// function used by maybe_strip_international_prefix_and_normalize.
    fn parse_prefix_as_idd(&self, idd_pattern: &regex::Regex, number: &mut String) -> bool {
        let Some(idd_match) = idd_pattern.find(number) else {
            return false;
        };
        if idd_match.start() != 0 {
            return false;
        }
        let match_end = idd_match.end();
        // Only strip this if the first digit after the match is not a 0,
        // since country calling codes cannot begin with 0.
        if let Some(digit_captures) = self
            .reg_exps
            .capturing_digit_pattern
            .captures(&number[match_end..])
        {
            if let Some(digit_group) = digit_captures.get(1) {
                let normalized_group = self.normalize_digits_only(digit_group.as_str());
                if normalized_group == "0" {
                    return false;
                }
            }
        }
        number.drain(0..match_end);
        true
    }

    /// Extracts the country calling code from the beginning of
    /// `national_number`, writing the remainder to `national_number_out`.
    /// Returns 0 if no country calling code is considered present.
    fn maybe_extract_country_code(
        &self,
        number: &str,
        default_region_metadata: Option<&PhoneMetadata>,
        keep_raw_input: bool,
        national_number_out: &mut String,
        phone_number: &mut PhoneNumber,
    ) -> std::result::Result<i32, ParseErrorInternal> {
        if number.is_empty() {
            return Ok(0);
        }
        let mut full_number = number.to_string();
        // Set the default prefix to be something that will never match.
        let possible_idd_prefix = default_region_metadata
            .filter(|metadata| metadata.has_international_prefix())
            .map(|metadata| metadata.international_prefix());
        let country_code_source = self
            .maybe_strip_international_prefix_and_normalize(&mut full_number, possible_idd_prefix)?;
        if keep_raw_input {
            phone_number.set_country_code_source(country_code_source);
        }
        if country_code_source != CountryCodeSource::FROM_DEFAULT_COUNTRY {
            if full_number.len() <= MIN_LENGTH_FOR_NSN {
                trace!(
                    "Phone number had an IDD, but after this was not long enough to be a \
                     viable phone number."
                );
                return Err(ParseError::TooShortAfterIdd.into());
            }
            let potential_country_code =
                self.extract_country_code(&full_number, national_number_out);
            if potential_country_code != 0 {
                phone_number.set_country_code(potential_country_code);
                return Ok(potential_country_code);
            }
            // If this fails, they must be using a strange country calling code
            // that we don't recognize, or that doesn't exist.
            return Err(ParseError::InvalidCountryCode.into());
        }
        if let Some(metadata) = default_region_metadata {
            // Check to see if the number starts with the country calling code
            // for the default region. If so, we remove the country calling
            // code, and do some checks on the validity of the number before
            // and after.
            let default_country_code = metadata.country_code();
            let mut buf = itoa::Buffer::new();
            let default_country_code_string = buf.format(default_country_code);
            if let Some(potential_national_number) =
                full_number.strip_prefix(default_country_code_string)
            {
                let mut potential_national_number = potential_national_number.to_string();
                let general_desc = &metadata.general_desc;
                self.maybe_strip_national_prefix_and_carrier_code(
                    &mut potential_national_number,
                    metadata,
                    None,
                )?;
                // If the number was not valid before but is valid now, or if
                // it was too long before, we consider the number with the
                // country calling code stripped to be a better result.
                if (!is_match(self.matcher_api.as_ref(), &full_number, general_desc)
                    && is_match(
                        self.matcher_api.as_ref(),
                        &potential_national_number,
                        general_desc,
                    ))
                    || test_number_length_with_unknown_type(&full_number, metadata)
                        == Err(ValidationResultErr::TooLong)
                {
                    national_number_out.push_str(&potential_national_number);
                    if keep_raw_input {
                        phone_number.set_country_code_source(
                            CountryCodeSource::FROM_NUMBER_WITHOUT_PLUS_SIGN,
                        );
                    }
                    phone_number.set_country_code(default_country_code);
                    return Ok(default_country_code);
                }
            }
        }
        // No country calling code present.
        phone_number.set_country_code(0);
        national_number_out.push_str(&full_number);
        Ok(0)
    }

    /// Extracts the country calling code from the leading digits of a fully
    /// normalized number. Returns 0 when the leading digits do not form a
    /// known calling code.
    fn extract_country_code(&self, full_number: &str, national_number_out: &mut String) -> i32 {
        if full_number.is_empty() || full_number.starts_with('0') {
            // Country codes do not begin with a '0'.
            return 0;
        }
        for length in 1..=MAX_LENGTH_COUNTRY_CODE.min(full_number.len()) {
            let Ok(potential_country_code) = full_number[..length].parse::<i32>() else {
                return 0;
            };
            if self.has_valid_country_calling_code(potential_country_code) {
                national_number_out.push_str(&full_number[length..]);
                return potential_country_code;
            }
        }
        0
    }

    /// Strips any national prefix (such as 0, 1) or carrier code (such as 31
    /// in Brazil) present in the number. Returns true if a prefix was
    /// stripped; the captured carrier selection code, if requested and
    /// present, is appended to `carrier_code`.
    pub(crate) fn maybe_strip_national_prefix_and_carrier_code(
        &self,
        number: &mut String,
        metadata: &PhoneMetadata,
        mut carrier_code: Option<&mut String>,
    ) -> std::result::Result<bool, ParseErrorInternal> {
        let possible_national_prefix = metadata.national_prefix_for_parsing();
        if number.is_empty() || possible_national_prefix.is_empty() {
            // Early return for numbers of zero length or with no national prefix.
            return Ok(false);
        }
        // Attempt to parse the first digits as a national prefix.
        let prefix_pattern = self
            .reg_exps
            .regexp_cache
            .get_prefix_match_regex(possible_national_prefix)
            .map_err(ParseErrorInternal::RegexError)?;
        let Some(prefix_captures) = prefix_pattern.captures(number) else {
            return Ok(false);
        };
        let whole_match = match prefix_captures.get(0) {
            Some(whole) if whole.start() == 0 => whole,
            _ => return Ok(false),
        };

        let general_desc = &metadata.general_desc;
        let is_viable_original_number = is_match(self.matcher_api.as_ref(), number, general_desc);

        // prefix_captures.len() is the number of groups in the pattern, plus
        // one for the whole match; the last group, when present, holds the
        // carrier code.
        let group_count = prefix_captures.len() - 1;
        let transform_rule = metadata.national_prefix_transform_rule();
        let last_group = prefix_captures.get(group_count).filter(|_| group_count > 0);
        if transform_rule.is_empty() || last_group.is_none() {
            // If the original number was viable, and the resultant number is
            // not, we return. No transformation is necessary.
            let stripped = &number[whole_match.end()..];
            if is_viable_original_number
                && !is_match(self.matcher_api.as_ref(), stripped, general_desc)
            {
                return Ok(false);
            }
            if let Some(carrier_code) = carrier_code.as_deref_mut() {
                if group_count > 0 {
                    if let Some(group) = prefix_captures.get(1) {
                        carrier_code.push_str(group.as_str());
                    }
                }
            }
            let stripped = stripped.to_string();
            *number = stripped;
            Ok(true)
        } else {
            // Check that the resultant number is still viable. If not, return.
            let transformed = {
                let mut rewritten = String::with_capacity(number.len());
                prefix_captures.expand(transform_rule, &mut rewritten);
                rewritten.push_str(&number[whole_match.end()..]);
                rewritten
            };
            if is_viable_original_number
                && !is_match(self.matcher_api.as_ref(), &transformed, general_desc)
            {
                return Ok(false);
            }
            if let Some(carrier_code) = carrier_code.as_deref_mut() {
                if group_count > 1 {
                    if let Some(group) = prefix_captures.get(1) {
                        carrier_code.push_str(group.as_str());
                    }
                }
            }
            *number = transformed;
            Ok(true)
        }
    }

    // ------------------------------------------------------------------
    // Formatting
    // ------------------------------------------------------------------

    /// Formats a phone number in the specified format using default rules.
    /// Note that this does not promise to produce a phone number that the
    /// user can dial from where they are - although we do format in either
    /// 'national' or 'international' format depending on what the client asks
    /// for, we do not currently support a more abbreviated format, such as
    /// for users in the same "area" who could potentially dial the number
    /// without area code.
    pub fn format<'b>(
        &self,
        phone_number: &'b PhoneNumber,
        number_format: PhoneNumberFormat,
    ) -> Result<Cow<'b, str>> {
        if phone_number.national_number() == 0 {
            let raw_input = phone_number.raw_input();
            if !raw_input.is_empty() {
                // Unparseable numbers that kept their raw input just use that.
                // This is the only case where a number can be formatted as E164 without a
                // leading '+' symbol (but the original number wasn't parseable anyway).
                return Ok(Cow::Borrowed(raw_input));
            }
        }
        let country_calling_code = phone_number.country_code();
        let mut formatted_number = Self::get_national_significant_number(phone_number);

        if matches!(number_format, PhoneNumberFormat::E164) {
            // Early exit for E164 case (even if the country calling code is invalid)
            // since no formatting of the national number needs to be applied.
            // Extensions are not formatted.
            prefix_number_with_country_calling_code(
                country_calling_code,
                PhoneNumberFormat::E164,
                &mut formatted_number,
            );
            return Ok(Cow::Owned(formatted_number));
        }
        // Note here that all NANPA formatting rules are contained by US, so we use
        // that to format NANPA numbers. The same applies to Russian Fed regions -
        // rules are contained by Russia.
        let region_code = self.get_region_code_for_country_code(country_calling_code);
        let metadata =
            self.get_metadata_for_region_or_calling_code(country_calling_code, region_code);

        if let Some(metadata) = metadata {
            if let Cow::Owned(s) = self.format_nsn(&formatted_number, metadata, number_format)? {
                formatted_number = s;
            }
            if let Some(formatted_extension) =
                Self::get_formatted_extension(phone_number, metadata, number_format)
            {
                formatted_number.push_str(&formatted_extension);
            }
            prefix_number_with_country_calling_code(
                country_calling_code,
                number_format,
                &mut formatted_number,
            );
        }
        Ok(Cow::Owned(formatted_number))
    }

    /// Gets the national significant number of a phone number: the number
    /// after the country calling code, including any stored leading zeros.
    pub fn get_national_significant_number(phone_number: &PhoneNumber) -> String {
        let zeros_start = if phone_number.italian_leading_zero() {
            "0".repeat(max(phone_number.number_of_leading_zeros(), 0) as usize)
        } else {
            String::new()
        };

        let mut buf = itoa::Buffer::new();
        let national_number = buf.format(phone_number.national_number());

        // If leading zero(s) have been set, we prefix this now. Note this is not a
        // national prefix. Ensure the number of leading zeros is at least 0 so we
        // don't crash in the case of malicious input.
        let mut nsn = String::with_capacity(zeros_start.len() + national_number.len());
        nsn.push_str(&zeros_start);
        nsn.push_str(national_number);
        nsn
    }

    /// Returns the region code that matches the specific country calling code. In
    /// the case of no region code being found, the unknown region code will be
    /// returned.
    pub fn get_region_code_for_country_code(&self, country_calling_code: i32) -> &str {
        let region_codes = self.get_region_codes_for_country_calling_code(country_calling_code);
        return region_codes
            .first()
            .copied()
            .unwrap_or(i18n::RegionCode::get_unknown());
    }

    /// Returns the region codes that match the specific country calling code. In
    /// the case of no region code being found, the list will be left empty.
    pub fn get_region_codes_for_country_calling_code(
        &self,
        country_calling_code: i32,
    ) -> Vec<&str> {
        let mut acc = Vec::new();
        // Locate the pair with the same country_code in the sorted vector.
        self.country_calling_code_to_region_code_map
            .binary_search_by_key(&country_calling_code, |(code, _)| *code)
            .map(|index| {
                self.country_calling_code_to_region_code_map[index]
                    .1
                    .iter()
                    .for_each(|region| {
                        acc.push(region.as_str());
                    });
            }) /* suppress Result ignoring */
            .ok();
        acc
    }

    /// Returns the country calling code for a specific region. For example,
    /// this would be 1 for the United States, and 64 for New Zealand.
    /// Returns 0 for unknown regions.
    pub fn get_country_code_for_region(&self, region_code: &str) -> i32 {
        match self.get_metadata_for_region(region_code) {
            Some(metadata) => metadata.country_code(),
            None => {
                warn!("Invalid or unknown region code ({}) provided.", region_code);
                0
            }
        }
    }

    pub(crate) fn get_metadata_for_region_or_calling_code(
        &self,
        country_calling_code: i32,
        region_code: &str,
    ) -> Option<&PhoneMetadata> {
        return if REGION_CODE_FOR_NON_GEO_ENTITY == region_code {
            self.country_code_to_non_geographical_metadata_map
                .get(&country_calling_code)
        } else {
            self.region_to_metadata_map.get(region_code)
        };
    }

    fn format_nsn<'b>(
        &self,
        phone_number: &'b str,
        metadata: &PhoneMetadata,
        number_format: PhoneNumberFormat,
    ) -> Result<Cow<'b, str>> {
        self.format_nsn_with_carrier(phone_number, metadata, number_format, "")
    }

    fn format_nsn_with_carrier<'b>(
        &self,
        number: &'b str,
        metadata: &PhoneMetadata,
        number_format: PhoneNumberFormat,
        carrier_code: &str,
    ) -> Result<Cow<'b, str>> {
        // When the intl_number_formats exists, we use that to format national number
        // for the INTERNATIONAL format instead of using the number_formats.
        let available_formats = if metadata.intl_number_format.len() == 0
            || number_format == PhoneNumberFormat::National
        {
            &metadata.number_format
        } else {
            &metadata.intl_number_format
        };
        let formatting_pattern =
            self.choose_formatting_pattern_for_number(available_formats, number)?;
        if let Some(formatting_pattern) = formatting_pattern {
            self.format_nsn_using_pattern_with_carrier(
                number,
                formatting_pattern,
                number_format,
                carrier_code,
            )
        } else {
            Ok(Cow::Borrowed(number))
        }
    }

    pub(crate) fn choose_formatting_pattern_for_number<'b>(
        &self,
        available_formats: &'b [NumberFormat],
        national_number: &str,
    ) -> Result<Option<&'b NumberFormat>> {
        for format in available_formats {
            if !format
                .leading_digits_pattern
                // We always use the last leading_digits_pattern, as it is the most
                // detailed.
                .last()
                .map(|last| {
                    self.reg_exps
                        .regexp_cache
                        .get_regex(last)
                        .map(|regex| regex.consume_start(national_number).is_some())
                })
                // default not continue
                .unwrap_or(Ok(true))?
            {
                continue;
            }
            let pattern_to_match = self
                .reg_exps
                .regexp_cache
                .get_full_match_regex(format.pattern())?;
            if pattern_to_match.is_match(national_number) {
                return Ok(Some(format));
            }
        }
        return Ok(None);
    }

    // Note that carrier_code is optional - if an empty string, no carrier code
    // replacement will take place.
    fn format_nsn_using_pattern_with_carrier<'b>(
        &self,
        national_number: &'b str,
        formatting_pattern: &NumberFormat,
        number_format: PhoneNumberFormat,
        carrier_code: &str,
    ) -> Result<Cow<'b, str>> {
        let mut number_format_rule = Cow::Borrowed(formatting_pattern.format());
        if matches!(number_format, PhoneNumberFormat::National)
            && carrier_code.len() > 0
            && formatting_pattern
                .domestic_carrier_code_formatting_rule()
                .len()
                > 0
        {
            // Replace the $CC in the formatting rule with the desired carrier code.
            let mut carrier_code_formatting_rule =
                Cow::Borrowed(formatting_pattern.domestic_carrier_code_formatting_rule());

            if let Cow::Owned(s) = self
                .reg_exps
                .carrier_code_pattern
                .replace(&carrier_code_formatting_rule, carrier_code)
            {
                carrier_code_formatting_rule = Cow::Owned(s);
            }
            if let Cow::Owned(s) = self
                .reg_exps
                .first_group_capturing_pattern
                .replace(&number_format_rule, carrier_code_formatting_rule)
            {
                number_format_rule = Cow::Owned(s);
            }
        } else {
            // Use the national prefix formatting rule instead.
            let national_prefix_formatting_rule =
                formatting_pattern.national_prefix_formatting_rule();

            if matches!(number_format, PhoneNumberFormat::National)
                && national_prefix_formatting_rule.len() > 0
            {
                // Apply the national_prefix_formatting_rule as the formatting_pattern
                // contains only information on how the national significant number
                // should be formatted at this point.
                if let Cow::Owned(s) = self
                    .reg_exps
                    .first_group_capturing_pattern
                    .replace(&number_format_rule, national_prefix_formatting_rule)
                {
                    number_format_rule = Cow::Owned(s);
                }
            }
        }

        let pattern_to_match = self
            .reg_exps
            .regexp_cache
            .get_regex(formatting_pattern.pattern())?;

        let mut formatted_number =
            pattern_to_match.replace_all(national_number, number_format_rule.as_ref());

        if matches!(number_format, PhoneNumberFormat::RFC3966) {
            // First consume any leading punctuation, if any was present.
            if let Some(rest) = self
                .reg_exps
                .separator_pattern
                .consume_start(&formatted_number)
            {
                formatted_number = Cow::Owned(rest.to_string());
            }
            // Then replace all separators with a "-".
            if let Cow::Owned(s) = self
                .reg_exps
                .separator_pattern
                .replace_all(&formatted_number, "-")
            {
                formatted_number = Cow::Owned(s)
            }
        }
        Ok(formatted_number)
    }

    /// Simple wrapper of format_nsn_using_pattern_with_carrier for the common
    /// case of no carrier code.
    pub(crate) fn format_nsn_using_pattern<'b>(
        &self,
        national_number: &'b str,
        formatting_pattern: &NumberFormat,
        number_format: PhoneNumberFormat,
    ) -> Result<Cow<'b, str>> {
        self.format_nsn_using_pattern_with_carrier(
            national_number,
            formatting_pattern,
            number_format,
            "",
        )
    }

    // Returns the formatted extension of a phone number, if the phone number had an
    // extension specified else None.
    fn get_formatted_extension(
        phone_number: &PhoneNumber,
        metadata: &PhoneMetadata,
        number_format: PhoneNumberFormat,
    ) -> Option<String> {
        if !phone_number.has_extension() || phone_number.extension().is_empty() {
            return None;
        }

        let prefix = if matches!(number_format, PhoneNumberFormat::RFC3966) {
            RFC3966_EXTN_PREFIX
        } else if metadata.has_preferred_extn_prefix() {
            metadata.preferred_extn_prefix()
        } else {
            DEFAULT_EXTN_PREFIX
        };
        Some(format!("{}{}", prefix, phone_number.extension()))
    }

    /// Formats a phone number using client-defined formatting rules.
    pub fn format_by_pattern(
        &self,
        phone_number: &PhoneNumber,
        number_format: PhoneNumberFormat,
        user_defined_formats: &[NumberFormat],
    ) -> Result<String> {
        let country_calling_code = phone_number.country_code();
        // Note get_region_code_for_country_code() is used because formatting
        // information for regions which share a country calling code is
        // contained by only one region for performance reasons. For example,
        // for NANPA regions it will be contained in the metadata for US.
        let national_significant_number = Self::get_national_significant_number(phone_number);
        let region_code = self.get_region_code_for_country_code(country_calling_code);
        let Some(metadata) =
            self.get_metadata_for_region_or_calling_code(country_calling_code, region_code)
        else {
            return Ok(national_significant_number);
        };

        let formatting_pattern = self.choose_formatting_pattern_for_number(
            user_defined_formats,
            &national_significant_number,
        )?;

        let mut formatted_number = if let Some(formatting_pattern) = formatting_pattern {
            // Before we do a replacement of the national prefix pattern $NP with the
            // national prefix, we need to copy the rule so that subsequent replacements
            // for different numbers have the appropriate national prefix.
            let mut num_format_copy = formatting_pattern.clone();

            let national_prefix_formatting_rule =
                formatting_pattern.national_prefix_formatting_rule();
            if !national_prefix_formatting_rule.is_empty() {
                let national_prefix = metadata.national_prefix();
                if !national_prefix.is_empty() {
                    // Replace $NP with national prefix and $FG with the first group ($1).
                    let rule = national_prefix_formatting_rule
                        .replace("$NP", national_prefix)
                        .replace("$FG", "$1");
                    num_format_copy.set_national_prefix_formatting_rule(rule);
                } else {
                    // We don't want to have a rule for how to format the national prefix if
                    // there isn't one.
                    num_format_copy.clear_national_prefix_formatting_rule();
                }
            }
            self.format_nsn_using_pattern(
                &national_significant_number,
                &num_format_copy,
                number_format,
            )?
            .to_string()
        } else {
            national_significant_number
        };
        if let Some(extension) =
            Self::get_formatted_extension(phone_number, metadata, PhoneNumberFormat::National)
        {
            formatted_number.push_str(&extension);
        }
        prefix_number_with_country_calling_code(
            country_calling_code,
            number_format,
            &mut formatted_number,
        );
        Ok(formatted_number)
    }

    /// Formats a phone number in national format for dialing using the
    /// carrier as specified in the carrier_code. The carrier_code will always
    /// be used regardless of whether the phone number already has a preferred
    /// domestic carrier code stored.
    pub fn format_national_number_with_carrier_code(
        &self,
        phone_number: &PhoneNumber,
        carrier_code: &str,
    ) -> Result<String> {
        let country_calling_code = phone_number.country_code();
        let national_significant_number = Self::get_national_significant_number(phone_number);
        let region_code = self.get_region_code_for_country_code(country_calling_code);

        // Note get_region_code_for_country_code() is used because formatting
        // information for regions which share a country calling code is
        // contained by only one region for performance reasons. For example,
        // for NANPA regions it will be contained in the metadata for US.
        let Some(metadata) =
            self.get_metadata_for_region_or_calling_code(country_calling_code, region_code)
        else {
            return Ok(national_significant_number);
        };

        let mut formatted_number = owned_from_cow_or!(
            self.format_nsn_with_carrier(
                &national_significant_number,
                metadata,
                PhoneNumberFormat::National,
                carrier_code,
            )?,
            national_significant_number
        );
        if let Some(formatted_extension) =
            Self::get_formatted_extension(phone_number, metadata, PhoneNumberFormat::National)
        {
            formatted_number.push_str(&formatted_extension);
        }

        prefix_number_with_country_calling_code(
            country_calling_code,
            PhoneNumberFormat::National,
            &mut formatted_number,
        );

        Ok(formatted_number)
    }

    /// Formats a phone number in national format for dialing using the
    /// carrier stored at parse time, falling back to `fallback_carrier_code`
    /// when none was stored.
    pub fn format_national_number_with_preferred_carrier_code(
        &self,
        phone_number: &PhoneNumber,
        fallback_carrier_code: &str,
    ) -> Result<String> {
        let carrier_code = if !phone_number.preferred_domestic_carrier_code().is_empty() {
            phone_number.preferred_domestic_carrier_code()
        } else {
            fallback_carrier_code
        };
        self.format_national_number_with_carrier_code(phone_number, carrier_code)
    }

    fn has_valid_country_calling_code(&self, country_calling_code: i32) -> bool {
        return self
            .country_calling_code_to_region_code_map
            .binary_search_by_key(&country_calling_code, |(code, _)| *code)
            .is_ok();
    }

    /// Returns a number formatted in such a way that it can be dialed from a
    /// mobile phone in a specific region. If the number cannot be reached
    /// from the region (e.g. some countries block toll-free numbers from
    /// being called outside of the country), returns an empty string.
    pub fn format_number_for_mobile_dialing<'b>(
        &self,
        phone_number: &'b PhoneNumber,
        calling_from: &str,
        with_formatting: bool,
    ) -> Result<Cow<'b, str>> {
        let country_calling_code = phone_number.country_code();
        if !self.has_valid_country_calling_code(country_calling_code) {
            return if phone_number.has_raw_input() {
                Ok(Cow::Borrowed(phone_number.raw_input()))
            } else {
                Ok(Cow::Borrowed(""))
            };
        }

        let mut formatted_number = String::new();
        // Clear the extension, as that part cannot normally be dialed together with
        // the main number.
        let mut number_no_extension = phone_number.clone();
        number_no_extension.clear_extension();
        let region_code = self.get_region_code_for_country_code(country_calling_code);
        let number_type = self.get_number_type(&number_no_extension)?;
        let is_valid_number = !matches!(number_type, PhoneNumberType::Unknown);
        if calling_from == region_code {
            let is_fixed_line_or_mobile = matches!(
                number_type,
                PhoneNumberType::FixedLine
                    | PhoneNumberType::FixedLineOrMobile
                    | PhoneNumberType::Mobile
            );
            // Carrier codes may be needed in some countries. We handle this here.
            if (region_code == "BR") && (is_fixed_line_or_mobile) {
                // Historically, we set this to an empty string when parsing with raw
                // input if none was found in the input string. However, this doesn't
                // result in a number we can dial. For this reason, we treat the empty
                // string the same as if it isn't set at all.
                if !number_no_extension
                    .preferred_domestic_carrier_code()
                    .is_empty()
                {
                    formatted_number = self.format_national_number_with_preferred_carrier_code(
                        &number_no_extension,
                        "",
                    )?;
                } else {
                    // Brazilian fixed line and mobile numbers need to be dialed with a
                    // carrier code when called within Brazil. Without that, most of the
                    // carriers won't connect the call. Because of that, we return an empty
                    // string here.
                    formatted_number.clear();
                }
            } else if country_calling_code == NANPA_COUNTRY_CODE {
                // For NANPA countries, we output international format for numbers that
                // can be dialed internationally, since that always works, except for
                // numbers which might potentially be short numbers, which are always
                // dialled in national format.
                let region_metadata = self.region_to_metadata_map
                    .get(calling_from)
                    .unwrap() /* we've checked the calling code is valid at top of function */;
                let national_number = Self::get_national_significant_number(&number_no_extension);
                let format = if self.can_be_internationally_dialled(&number_no_extension)?
                    && !test_number_length_with_unknown_type(&national_number, region_metadata)
                        .is_err_and(|e| matches!(e, ValidationResultErr::TooShort))
                {
                    PhoneNumberFormat::International
                } else {
                    PhoneNumberFormat::National
                };
                formatted_number = self.format(&number_no_extension, format)?.into_owned();
            } else {
                // For non-geographical countries, and Mexican, Chilean and Uzbek fixed
                // line and mobile numbers, we output international format for numbers
                // that can be dialed internationally as that always works.
                let format = if (region_code == REGION_CODE_FOR_NON_GEO_ENTITY ||
                        // MX fixed line and mobile numbers should always be formatted in
                        // international format, even when dialed within MX. For national
                        // format to work, a carrier code needs to be used, and the correct
                        // carrier code depends on if the caller and callee are from the same
                        // local area. It is trickier to get that to work correctly than
                        // using international format, which is tested to work fine on all
                        // carriers.
                        // CL fixed line numbers need the national prefix when dialing in the
                        // national format, but don't have it when used for display. The
                        // reverse is true for mobile numbers. As a result, we output them in
                        // the international format to make it work.
                        // UZ mobile and fixed-line numbers have to be formatted in
                        // international format or prefixed with special codes like 03, 04
                        // (for fixed-line) and 05 (for mobile) for dialling successfully
                        // from mobile devices. As we do not have complete information on
                        // special codes and to be consistent with formatting across all
                        // phone types we return the number in international format here.
                        ((region_code == "MX" ||
                        region_code == "CL" ||
                        region_code == "UZ") &&
                        is_fixed_line_or_mobile)) &&
                    self.can_be_internationally_dialled(&number_no_extension)?
                {
                    PhoneNumberFormat::International
                } else {
                    PhoneNumberFormat::National
                };
                formatted_number = self.format(&number_no_extension, format)?.into_owned();
            }
        } else if is_valid_number && self.can_be_internationally_dialled(&number_no_extension)? {
            // We assume that short numbers are not diallable from outside their
            // region, so if a number is not a valid regular length phone number, we
            // treat it as if it cannot be internationally dialled.
            let format = if with_formatting {
                PhoneNumberFormat::International
            } else {
                PhoneNumberFormat::E164
            };
            return Ok(Cow::Owned(
                self.format(&number_no_extension, format)?.into_owned(),
            ));
        }
        if !with_formatting {
            Ok(Cow::Owned(
                self.normalize_diallable_chars_only(&formatted_number),
            ))
        } else {
            Ok(Cow::Owned(formatted_number))
        }
    }

    /// Formats a phone number for out-of-country dialing purposes. This
    /// prefixes the number with the international prefix in use in
    /// `calling_from`, or with "+<country code>" when several prefixes exist
    /// and none is preferred.
    pub fn format_out_of_country_calling_number(
        &self,
        phone_number: &PhoneNumber,
        calling_from: &str,
    ) -> Result<String> {
        if !self.is_valid_region_code(calling_from) {
            trace!(
                "Trying to format number from invalid region {}. International formatting applied.",
                calling_from
            );
            return Ok(self
                .format(phone_number, PhoneNumberFormat::International)?
                .into_owned());
        }
        let country_calling_code = phone_number.country_code();
        let national_significant_number = Self::get_national_significant_number(phone_number);
        if !self.has_valid_country_calling_code(country_calling_code) {
            return Ok(national_significant_number);
        }
        if country_calling_code == NANPA_COUNTRY_CODE {
            if self.is_nanpa_country(calling_from) {
                // For NANPA regions, return the national format for these regions but
                // prefix it with the country calling code.
                let mut buf = itoa::Buffer::new();
                return Ok(format!(
                    "{} {}",
                    buf.format(country_calling_code),
                    self.format(phone_number, PhoneNumberFormat::National)?
                ));
            }
        } else if country_calling_code == self.get_country_code_for_region(calling_from) {
            // If regions share a country calling code, the country calling code need
            // not be dialled. This also applies when dialling within a region, so this
            // if clause covers both these cases. Technically this is the case for
            // dialling from La Reunion to other overseas departments of France (French
            // Guiana, Martinique, Guadeloupe), but not vice versa - so we don't cover
            // this edge case for now and for those cases return the version including
            // country calling code.
            return Ok(self
                .format(phone_number, PhoneNumberFormat::National)?
                .into_owned());
        }
        // Metadata cannot be null because we checked 'is_valid_region_code()' above.
        let metadata_calling_from = &self.region_to_metadata_map[calling_from];
        let international_prefix = metadata_calling_from.international_prefix();
        // In general, if there is a preferred international prefix, use that.
        // Otherwise, for regions that have multiple international prefixes, the
        // international format of the number is returned since we would not know
        // which one to use.
        let international_prefix_for_formatting = if self
            .reg_exps
            .single_international_prefix
            .full_match(international_prefix)
        {
            international_prefix
        } else if metadata_calling_from.has_preferred_international_prefix() {
            metadata_calling_from.preferred_international_prefix()
        } else {
            ""
        };
        let region_code = self.get_region_code_for_country_code(country_calling_code);
        let metadata_for_region =
            self.get_metadata_for_region_or_calling_code(country_calling_code, region_code);
        let Some(metadata_for_region) = metadata_for_region else {
            return Ok(national_significant_number);
        };
        let mut formatted_number = self
            .format_nsn(
                &national_significant_number,
                metadata_for_region,
                PhoneNumberFormat::International,
            )?
            .into_owned();
        if let Some(extension) = Self::get_formatted_extension(
            phone_number,
            metadata_for_region,
            PhoneNumberFormat::International,
        ) {
            formatted_number.push_str(&extension);
        }
        if !international_prefix_for_formatting.is_empty() {
            let mut buf = itoa::Buffer::new();
            formatted_number = format!(
                "{} {} {}",
                international_prefix_for_formatting,
                buf.format(country_calling_code),
                formatted_number
            );
        } else {
            prefix_number_with_country_calling_code(
                country_calling_code,
                PhoneNumberFormat::International,
                &mut formatted_number,
            );
        }
        Ok(formatted_number)
    }

    /// Formats a phone number using the original phone number format that the
    /// number was parsed from: the raw input is preferred whenever the digits
    /// we would format to do not match it.
    pub fn format_in_original_format(
        &self,
        phone_number: &PhoneNumber,
        region_calling_from: &str,
    ) -> Result<String> {
        if phone_number.has_raw_input()
            && !self.has_formatting_pattern_for_number(phone_number)?
        {
            // We check if we have the formatting pattern because without that, we might
            // format the number as a group without national prefix.
            return Ok(phone_number.raw_input().to_string());
        }
        if !phone_number.has_country_code_source() {
            return Ok(self
                .format(phone_number, PhoneNumberFormat::National)?
                .into_owned());
        }
        let mut formatted_number = match phone_number.country_code_source() {
            CountryCodeSource::FROM_NUMBER_WITH_PLUS_SIGN => self
                .format(phone_number, PhoneNumberFormat::International)?
                .into_owned(),
            CountryCodeSource::FROM_NUMBER_WITH_IDD => {
                self.format_out_of_country_calling_number(phone_number, region_calling_from)?
            }
            CountryCodeSource::FROM_NUMBER_WITHOUT_PLUS_SIGN => self
                .format(phone_number, PhoneNumberFormat::International)?
                .get(1..)
                .unwrap_or_default()
                .to_string(),
            _ => {
                let region_code =
                    self.get_region_code_for_country_code(phone_number.country_code());
                // We strip non-digits from the NDD here, and from the raw input later, so
                // that we can compare them easily.
                let national_prefix = self.get_ndd_prefix_for_region(region_code, true);
                let national_format = self
                    .format(phone_number, PhoneNumberFormat::National)?
                    .into_owned();
                match national_prefix {
                    None => national_format,
                    Some(prefix) if prefix.is_empty() => national_format,
                    Some(_)
                        if self.raw_input_contains_national_prefix(
                            phone_number.raw_input(),
                            region_code,
                        ) =>
                    {
                        national_format
                    }
                    Some(_) => {
                        // Here we assume that the national prefix was not used when the
                        // number was originally written, so we format without it.
                        let metadata = self.get_metadata_for_region(region_code);
                        let national_number =
                            Self::get_national_significant_number(phone_number);
                        let format_rule = match metadata {
                            Some(metadata) => self.choose_formatting_pattern_for_number(
                                &metadata.number_format,
                                &national_number,
                            )?,
                            None => None,
                        };
                        match format_rule {
                            None => national_format,
                            Some(format_rule) => {
                                // The format rule could still be present when there is no
                                // national prefix digit to strip, e.g. when the rule is just
                                // the first group.
                                let candidate_rule =
                                    format_rule.national_prefix_formatting_rule();
                                let index_of_first_group = candidate_rule.find("$1");
                                match index_of_first_group {
                                    None => national_format,
                                    Some(index) => {
                                        let prefix_before_group = &candidate_rule[..index];
                                        if self.normalize_digits_only(prefix_before_group).is_empty()
                                        {
                                            // If the first group is present at the start of the rule
                                            // there are no prefix digits to worry about.
                                            national_format
                                        } else {
                                            let mut format_without_prefix = format_rule.clone();
                                            format_without_prefix
                                                .clear_national_prefix_formatting_rule();
                                            self.format_by_pattern(
                                                phone_number,
                                                PhoneNumberFormat::National,
                                                &[format_without_prefix],
                                            )?
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        };
        // If no digit is inserted/removed/modified as a result of our formatting, we
        // return the formatted phone number; otherwise we return the raw input the
        // user entered.
        let raw_input = phone_number.raw_input();
        if !formatted_number.is_empty() && !raw_input.is_empty() {
            let normalized_formatted_number =
                self.normalize_diallable_chars_only(&formatted_number);
            let normalized_raw_input = self.normalize_diallable_chars_only(raw_input);
            if normalized_formatted_number != normalized_raw_input {
                formatted_number = raw_input.to_string();
            }
        }
        Ok(formatted_number)
    }

    fn has_formatting_pattern_for_number(&self, phone_number: &PhoneNumber) -> Result<bool> {
        let country_calling_code = phone_number.country_code();
        let region_code = self.get_region_code_for_country_code(country_calling_code);
        let Some(metadata) =
            self.get_metadata_for_region_or_calling_code(country_calling_code, region_code)
        else {
            return Ok(false);
        };
        let national_number = Self::get_national_significant_number(phone_number);
        Ok(self
            .choose_formatting_pattern_for_number(&metadata.number_format, &national_number)?
            .is_some())
    }

    /// Checks whether the raw input of a number contains the national prefix
    /// of the region the number is from.
    fn raw_input_contains_national_prefix(&self, raw_input: &str, region_code: &str) -> bool {
        let Some(national_prefix) = self.get_ndd_prefix_for_region(region_code, true) else {
            return false;
        };
        if national_prefix.is_empty() {
            return false;
        }
        let normalized_national_number = self.normalize_digits_only(raw_input);
        if let Some(rest) = normalized_national_number.strip_prefix(&national_prefix) {
            // Some Japanese numbers (e.g. 00777123) might be mistaken to contain the
            // national prefix when written without it (e.g. 0777123) if we just do
            // prefix matching. To tackle that, we check the validity of the number if
            // the assumed national prefix is removed (777123 won't be valid in Japan).
            return match self.parse(rest, region_code) {
                Ok(number_without_prefix) => {
                    self.is_valid_number(&number_without_prefix).unwrap_or(false)
                }
                Err(_) => false,
            };
        }
        false
    }

    /// Formats a phone number for out-of-country dialing purposes, attempting
    /// to keep alpha characters and grouping information from the raw input.
    pub fn format_out_of_country_keeping_alpha_chars(
        &self,
        phone_number: &PhoneNumber,
        calling_from: &str,
    ) -> Result<String> {
        let mut raw_input = phone_number.raw_input().to_string();
        // If there is no raw input, then we can't keep alpha characters because there
        // aren't any. In this case, we return format_out_of_country_calling_number.
        if raw_input.is_empty() {
            return self.format_out_of_country_calling_number(phone_number, calling_from);
        }
        let country_code = phone_number.country_code();
        if !self.has_valid_country_calling_code(country_code) {
            return Ok(raw_input);
        }
        // Strip any prefix such as country calling code, IDD, that was present. We do
        // this by comparing the number in raw_input with the parsed number. To do
        // this, first we normalize punctuation. We retain number grouping symbols
        // such as " " only.
        raw_input = normalize_helper(
            &self.reg_exps.all_plus_number_grouping_symbols,
            true,
            &raw_input,
        );
        // Now we trim everything before the first three digits in the parsed number.
        // We choose three because all valid alpha numbers have 3 digits at the start
        // - if it does not, then we don't trim anything at all. Similarly, if the
        // national number was less than three digits, we don't trim anything at all.
        let national_number = Self::get_national_significant_number(phone_number);
        if national_number.len() > 3 {
            if let Some(first_national_number_digit) = raw_input.find(&national_number[..3]) {
                raw_input = raw_input[first_national_number_digit..].to_string();
            }
        }
        let metadata_for_region_calling_from = self.get_metadata_for_region(calling_from);
        if country_code == NANPA_COUNTRY_CODE {
            if self.is_nanpa_country(calling_from) {
                let mut buf = itoa::Buffer::new();
                return Ok(format!("{} {}", buf.format(country_code), raw_input));
            }
        } else if metadata_for_region_calling_from.is_some()
            && country_code == self.get_country_code_for_region(calling_from)
        {
            let formatting_pattern = match metadata_for_region_calling_from {
                Some(metadata) => self
                    .choose_formatting_pattern_for_number(&metadata.number_format, &national_number)?,
                None => None,
            };
            let Some(formatting_pattern) = formatting_pattern else {
                // If no pattern above is matched, we format the original input.
                return Ok(raw_input);
            };
            let mut new_format = formatting_pattern.clone();
            // The first group is the first group of digits that the user wrote
            // together.
            new_format.set_pattern("(\\d+)(.*)".to_string());
            // Here we just concatenate them back together after the national prefix
            // has been fixed.
            new_format.set_format("$1$2".to_string());
            // Now we format using this pattern instead of the default pattern, but
            // with the national prefix prefixed if necessary.
            // This will not work in the cases where the pattern (and not the leading
            // digits) decide whether a national prefix needs to be used, since we have
            // overridden the pattern to match anything, but that is not the case in the
            // metadata to date.
            return Ok(self
                .format_nsn_using_pattern(&raw_input, &new_format, PhoneNumberFormat::National)?
                .into_owned());
        }
        let mut international_prefix_for_formatting = "";
        // If an unsupported region-calling-from is entered, or a country with
        // multiple international prefixes, the international format of the number is
        // returned, unless there is a preferred international prefix.
        if let Some(metadata) = metadata_for_region_calling_from {
            let international_prefix = metadata.international_prefix();
            international_prefix_for_formatting = if self
                .reg_exps
                .single_international_prefix
                .full_match(international_prefix)
            {
                international_prefix
            } else {
                metadata.preferred_international_prefix()
            };
        }
        let region_code = self.get_region_code_for_country_code(country_code);
        let metadata_for_region =
            self.get_metadata_for_region_or_calling_code(country_code, region_code);
        let mut formatted_number = raw_input;
        if let Some(metadata_for_region) = metadata_for_region {
            if let Some(extension) = Self::get_formatted_extension(
                phone_number,
                metadata_for_region,
                PhoneNumberFormat::International,
            ) {
                formatted_number.push_str(&extension);
            }
        }
        if !international_prefix_for_formatting.is_empty() {
            let mut buf = itoa::Buffer::new();
            formatted_number = format!(
                "{} {} {}",
                international_prefix_for_formatting,
                buf.format(country_code),
                formatted_number
            );
        } else {
            // Invalid region entered as country-calling-from (so no metadata was found
            // for it) or the region chosen has multiple international dialling
            // prefixes.
            if !self.is_valid_region_code(calling_from) {
                warn!(
                    "Trying to format number from invalid region {}. International formatting applied.",
                    calling_from
                );
            }
            prefix_number_with_country_calling_code(
                country_code,
                PhoneNumberFormat::International,
                &mut formatted_number,
            );
        }
        Ok(formatted_number)
    }

    // ------------------------------------------------------------------
    // Validation and classification
    // ------------------------------------------------------------------

    pub fn get_number_type(&self, phone_number: &PhoneNumber) -> Result<PhoneNumberType> {
        let region_code = self.get_region_code_for_number(phone_number)?;
        let Some(metadata) =
            self.get_metadata_for_region_or_calling_code(phone_number.country_code(), region_code)
        else {
            return Ok(PhoneNumberType::Unknown);
        };
        let national_significant_number = Self::get_national_significant_number(phone_number);
        Ok(self.get_number_type_helper(&national_significant_number, metadata))
    }

    /// Returns the region where a phone number is from. This could be used
    /// for geocoding at the region level.
    pub fn get_region_code_for_number(&self, phone_number: &PhoneNumber) -> Result<&str> {
        let country_calling_code = phone_number.country_code();
        let region_codes = self.get_region_codes_for_country_calling_code(country_calling_code);
        if region_codes.is_empty() {
            trace!("Missing/invalid country calling code ({})", country_calling_code);
            return Ok(i18n::RegionCode::get_unknown());
        }
        if region_codes.len() == 1 {
            Ok(region_codes[0])
        } else {
            self.get_region_code_for_number_from_region_list(phone_number, &region_codes)
        }
    }

    fn get_region_code_for_number_from_region_list<'b>(
        &self,
        phone_number: &PhoneNumber,
        region_codes: &[&'b str],
    ) -> Result<&'b str> {
        let national_number = Self::get_national_significant_number(phone_number);
        for code in region_codes {
            // Metadata cannot be NULL because the region codes come from the country
            // calling code map.
            let metadata = &self.region_to_metadata_map[*code];
            if metadata.has_leading_digits() {
                if self
                    .reg_exps
                    .regexp_cache
                    .get_regex(metadata.leading_digits())?
                    .consume_start(&national_number)
                    .is_some()
                {
                    return Ok(code);
                }
            } else if self.get_number_type_helper(&national_number, metadata)
                != PhoneNumberType::Unknown
            {
                return Ok(code);
            }
        }
        return Ok(i18n::RegionCode::get_unknown());
    }

    fn get_number_type_helper(
        &self,
        national_number: &str,
        metadata: &PhoneMetadata,
    ) -> PhoneNumberType {
        if !self.is_number_matching_desc(national_number, &metadata.general_desc) {
            trace!(
                "Number '{national_number}' type unknown - doesn't match general national number pattern"
            );
            return PhoneNumberType::Unknown;
        }
        if self.is_number_matching_desc(national_number, &metadata.premium_rate) {
            trace!("Number '{national_number}' is a premium number.");
            return PhoneNumberType::PremiumRate;
        }
        if self.is_number_matching_desc(national_number, &metadata.toll_free) {
            trace!("Number '{national_number}' is a toll-free number.");
            return PhoneNumberType::TollFree;
        }
        if self.is_number_matching_desc(national_number, &metadata.shared_cost) {
            trace!("Number '{national_number}' is a shared cost number.");
            return PhoneNumberType::SharedCost;
        }
        if self.is_number_matching_desc(national_number, &metadata.voip) {
            trace!("Number '{national_number}' is a VOIP (Voice over IP) number.");
            return PhoneNumberType::VoIP;
        }
        if self.is_number_matching_desc(national_number, &metadata.personal_number) {
            trace!("Number '{national_number}' is a personal number.");
            return PhoneNumberType::PersonalNumber;
        }
        if self.is_number_matching_desc(national_number, &metadata.pager) {
            trace!("Number '{national_number}' is a pager number.");
            return PhoneNumberType::Pager;
        }
        if self.is_number_matching_desc(national_number, &metadata.uan) {
            trace!("Number '{national_number}' is a UAN.");
            return PhoneNumberType::UAN;
        }
        if self.is_number_matching_desc(national_number, &metadata.voicemail) {
            trace!("Number '{national_number}' is a voicemail number.");
            return PhoneNumberType::VoiceMail;
        }
        if self.is_number_matching_desc(national_number, &metadata.standard_rate) {
            trace!("Number '{national_number}' is a standard rate number.");
            return PhoneNumberType::StandardRate;
        }

        let is_fixed_line = self.is_number_matching_desc(national_number, &metadata.fixed_line);
        if is_fixed_line {
            if metadata.same_mobile_and_fixed_line_pattern() {
                trace!(
                    "Number '{national_number}': fixed-line and mobile patterns equal,\
                 number is fixed-line or mobile"
                );
                return PhoneNumberType::FixedLineOrMobile;
            } else if self.is_number_matching_desc(national_number, &metadata.mobile) {
                trace!(
                    "Number '{national_number}': Fixed-line and mobile patterns differ, but number is \
                        still fixed-line or mobile"
                );
                return PhoneNumberType::FixedLineOrMobile;
            }
            trace!("Number '{national_number}' is a fixed line number.");
            return PhoneNumberType::FixedLine;
        }
        // Otherwise, test to see if the number is mobile. Only do this if certain
        // that the patterns for mobile and fixed line aren't the same.
        if !metadata.same_mobile_and_fixed_line_pattern()
            && self.is_number_matching_desc(national_number, &metadata.mobile)
        {
            trace!("Number '{national_number}' is a mobile number.");
            return PhoneNumberType::Mobile;
        }
        trace!(
            "Number '{national_number}' type unknown - doesn't match any specific number type pattern."
        );
        return PhoneNumberType::Unknown;
    }

    fn is_number_matching_desc(&self, national_number: &str, number_desc: &PhoneNumberDesc) -> bool {
        // Check if any possible number lengths are present; if so, we use them to
        // avoid checking the validation pattern if they don't match. If they are
        // absent, this means they match the general description, which we have
        // already checked before checking a specific number type.
        let actual_length = national_number.len() as i32;
        if number_desc.possible_length.len() > 0
            && !number_desc.possible_length.contains(&actual_length)
        {
            return false;
        }
        // very common name, so specify mod
        helper_functions::is_match(self.matcher_api.as_ref(), national_number, number_desc)
    }

    /// Tests whether a phone number matches a valid pattern. Note this
    /// doesn't verify the number is actually in use, which is impossible to
    /// tell by just looking at a number itself.
    pub fn is_valid_number(&self, phone_number: &PhoneNumber) -> Result<bool> {
        let region_code = self.get_region_code_for_number(phone_number)?;
        self.is_valid_number_for_region(phone_number, region_code)
    }

    /// Tests whether a phone number is valid for a certain region. Note this
    /// doesn't verify the number is actually in use, which is impossible to
    /// tell by just looking at a number itself. If the country calling code
    /// is not the same as the country calling code for the region, this
    /// immediately exits with false.
    pub fn is_valid_number_for_region(
        &self,
        phone_number: &PhoneNumber,
        region_code: &str,
    ) -> Result<bool> {
        let country_code = phone_number.country_code();
        let Some(metadata) =
            self.get_metadata_for_region_or_calling_code(country_code, region_code)
        else {
            return Ok(false);
        };
        if REGION_CODE_FOR_NON_GEO_ENTITY != region_code
            && country_code != self.get_country_code_for_region(region_code)
        {
            // Either the region code was invalid, or the country calling code for a
            // geographical region doesn't match the country calling code of the number.
            return Ok(false);
        }
        let national_significant_number = Self::get_national_significant_number(phone_number);
        Ok(self.get_number_type_helper(&national_significant_number, metadata)
            != PhoneNumberType::Unknown)
    }

    /// Checks whether a phone number is a possible number of a particular
    /// type. This provides a more lenient check than `is_valid_number`: it
    /// checks lengths only.
    pub fn is_possible_number_for_type_with_reason(
        &self,
        phone_number: &PhoneNumber,
        phone_number_type: PhoneNumberType,
    ) -> std::result::Result<ValidNumberLenType, ValidationResultErr> {
        let national_number = Self::get_national_significant_number(phone_number);
        let country_code = phone_number.country_code();
        // Note: For regions that share a country calling code, like NANPA numbers,
        // we just use the rules from the default region (US in this case) since the
        // get_region_code_for_number will not work if the number is possible but
        // not valid. There is in fact one country calling code (290) where the
        // possible number pattern differs between various regions (Saint Helena
        // and Tristan da Cunha), but this is handled by putting all possible
        // lengths for any country with this country calling code in the metadata
        // for the default region in this case.
        if !self.has_valid_country_calling_code(country_code) {
            return Err(ValidationResultErr::InvalidCountryCode);
        }
        let region_code = self.get_region_code_for_country_code(country_code);
        // Metadata cannot be null because the country calling code is valid.
        let Some(metadata) =
            self.get_metadata_for_region_or_calling_code(country_code, region_code)
        else {
            return Err(ValidationResultErr::InvalidCountryCode);
        };
        test_number_length(&national_number, metadata, phone_number_type)
    }

    /// Checks whether a phone number is a possible number: a length check
    /// over the general descriptor, not a pattern match.
    pub fn is_possible_number_with_reason(
        &self,
        phone_number: &PhoneNumber,
    ) -> std::result::Result<ValidNumberLenType, ValidationResultErr> {
        self.is_possible_number_for_type_with_reason(phone_number, PhoneNumberType::Unknown)
    }

    /// Convenience wrapper for [`Self::is_possible_number_with_reason`]. Note
    /// that a number possible only locally (dialable within its own area but
    /// not from abroad) is not considered possible here.
    pub fn is_possible_number(&self, phone_number: &PhoneNumber) -> bool {
        matches!(
            self.is_possible_number_with_reason(phone_number),
            Ok(ValidNumberLenType::IsPossible)
        )
    }

    /// Attempts to extract a valid number from a phone number that is too
    /// long to be valid, by truncating trailing digits. Returns false when no
    /// valid truncation exists; the number is then left unchanged.
    pub fn truncate_too_long_number(&self, phone_number: &mut PhoneNumber) -> Result<bool> {
        if self.is_valid_number(phone_number)? {
            return Ok(true);
        }
        let mut number_copy = phone_number.clone();
        let mut national_number = phone_number.national_number();
        loop {
            national_number /= 10;
            number_copy.set_national_number(national_number);
            if national_number == 0
                || self.is_possible_number_with_reason(&number_copy)
                    == Err(ValidationResultErr::TooShort)
            {
                return Ok(false);
            }
            if self.is_valid_number(&number_copy)? {
                phone_number.set_national_number(national_number);
                return Ok(true);
            }
        }
    }

    pub fn can_be_internationally_dialled(&self, phone_number: &PhoneNumber) -> Result<bool> {
        let region_code = self.get_region_code_for_number(phone_number)?;
        let Some(metadata) = self.region_to_metadata_map.get(region_code) else {
            // Note numbers belonging to non-geographical entities (e.g. +800 numbers)
            // are always internationally diallable, and will be caught here.
            return Ok(true);
        };
        let national_significant_number = Self::get_national_significant_number(phone_number);
        return Ok(!self.is_number_matching_desc(
            &national_significant_number,
            &metadata.no_international_dialling,
        ));
    }

    /// Returns true if the number can only be dialled from outside the
    /// region, or unknown. A number that matches the geographical types is
    /// considered geographical, as are mobile numbers in countries that
    /// allocate them geographically.
    pub fn is_number_geographical(&self, phone_number: &PhoneNumber) -> Result<bool> {
        let number_type = self.get_number_type(phone_number)?;
        Ok(matches!(
            number_type,
            PhoneNumberType::FixedLine | PhoneNumberType::FixedLineOrMobile
        ) || (self
            .reg_exps
            .geo_mobile_countries
            .contains(&phone_number.country_code())
            && number_type == PhoneNumberType::Mobile))
    }

    /// Returns true if the region code given is a NANPA region sharing the
    /// country calling code 1.
    pub fn is_nanpa_country(&self, region_code: &str) -> bool {
        self.nanpa_regions.contains(region_code)
    }

    /// Returns the mobile token for the provided country calling code if it
    /// has one, for example "9" for Argentina. The mobile token is inserted
    /// before the national destination code when dialing a mobile number from
    /// that country from abroad.
    pub fn get_country_mobile_token(&self, country_calling_code: i32) -> Option<char> {
        self.reg_exps
            .mobile_token_mappings
            .get(&country_calling_code)
            .copied()
    }

    /// Gets the length of the geographical area code, as found in the
    /// national_number field of the PhoneNumber object.
    pub fn get_length_of_geographical_area_code(
        &self,
        phone_number: &PhoneNumber,
    ) -> Result<usize> {
        let region_code = self.get_region_code_for_number(phone_number)?;
        let Some(metadata) = self.get_metadata_for_region(region_code) else {
            return Ok(0);
        };
        let country_code = phone_number.country_code();
        // If a country doesn't use a national prefix, and this number doesn't have an
        // Italian leading zero, we assume it is a closed dialling plan with no area
        // codes.
        if !metadata.has_national_prefix()
            && !phone_number.italian_leading_zero()
            && !self
                .reg_exps
                .countries_without_national_prefix_with_area_codes
                .contains(&country_code)
        {
            return Ok(0);
        }
        let number_type = self.get_number_type(phone_number)?;
        if number_type == PhoneNumberType::Mobile
            && self
                .reg_exps
                .geo_mobile_countries_without_mobile_area_codes
                .contains(&country_code)
        {
            // Note this is a rough heuristic; it doesn't cover Indonesia etc.
            return Ok(0);
        }
        if !self.is_number_geographical(phone_number)? {
            return Ok(0);
        }
        self.get_length_of_national_destination_code(phone_number)
    }

    /// Gets the length of the national destination code (NDC) from the
    /// PhoneNumber object passed in.
    pub fn get_length_of_national_destination_code(
        &self,
        phone_number: &PhoneNumber,
    ) -> Result<usize> {
        let copied_proto = if phone_number.has_extension() {
            // We don't want to alter the proto given to us, but we don't want to
            // include the extension when we format it, so we copy it and clear the
            // extension here.
            let mut copy = phone_number.clone();
            copy.clear_extension();
            Cow::Owned(copy)
        } else {
            Cow::Borrowed(phone_number)
        };
        let formatted_number = self.format(&copied_proto, PhoneNumberFormat::International)?;
        let digit_groups: Vec<&str> = self
            .reg_exps
            .capturing_ascii_digits_pattern
            .find_iter(&formatted_number)
            .map(|m| m.as_str())
            .collect();
        // The pattern will start with "+COUNTRY_CODE " so the first group will
        // always be the country code, and the second group will be the national
        // destination code if it is not the last group.
        if digit_groups.len() <= 2 {
            return Ok(0);
        }
        if self.get_number_type(phone_number)? == PhoneNumberType::Mobile {
            // For example Argentinian mobile numbers, when formatted in the
            // international format, are in the form of +54 9 NDC XXXX.... As a result,
            // we take the length of the third group (NDC) and add the length of the
            // mobile token, which also forms part of the national significant number.
            if let Some(mobile_token) =
                self.get_country_mobile_token(phone_number.country_code())
            {
                return Ok(digit_groups[2].len() + mobile_token.len_utf8());
            }
        }
        Ok(digit_groups[1].len())
    }

    // ------------------------------------------------------------------
    // Example numbers
    // ------------------------------------------------------------------

    /// Gets a valid number for the specified region.
    pub fn get_example_number(
        &self,
        region_code: &str,
    ) -> std::result::Result<PhoneNumber, GetExampleNumberError> {
        self.get_example_number_for_type(region_code, PhoneNumberType::FixedLine)
    }

    /// Gets a valid number for the specified region and number type.
    pub fn get_example_number_for_type(
        &self,
        region_code: &str,
        phone_number_type: PhoneNumberType,
    ) -> std::result::Result<PhoneNumber, GetExampleNumberError> {
        let Some(metadata) = self.get_metadata_for_region(region_code) else {
            warn!("Invalid or unknown region code ({}) provided.", region_code);
            return Err(GetExampleNumberError::InvalidRegionCode);
        };
        let desc = get_number_desc_by_type(metadata, phone_number_type);
        if !desc.has_example_number() {
            return Err(GetExampleNumberError::NoExampleNumber);
        }
        self.parse(desc.example_number(), region_code)
            .map_err(GetExampleNumberError::FailedToParse)
    }

    /// Gets a valid number for the specified non-geographical country calling
    /// code, such as 800.
    pub fn get_example_number_for_non_geo_entity(
        &self,
        country_calling_code: i32,
    ) -> std::result::Result<PhoneNumber, GetExampleNumberError> {
        let Some(metadata) = self
            .country_code_to_non_geographical_metadata_map
            .get(&country_calling_code)
        else {
            warn!(
                "Invalid or unknown country calling code provided: {}",
                country_calling_code
            );
            return Err(GetExampleNumberError::InvalidRegionCode);
        };
        // For geographical entities, fixed-line data is always present. However,
        // for non-geographical entities, this is not the case, so we have to go
        // through different types to find the example number.
        let descriptors: [&PhoneNumberDesc; 7] = [
            &metadata.mobile,
            &metadata.toll_free,
            &metadata.shared_cost,
            &metadata.voip,
            &metadata.voicemail,
            &metadata.uan,
            &metadata.premium_rate,
        ];
        for desc in descriptors {
            if desc.has_example_number() {
                let mut buf = itoa::Buffer::new();
                let candidate = format!(
                    "{}{}{}",
                    PLUS_SIGN,
                    buf.format(country_calling_code),
                    desc.example_number()
                );
                if let Ok(number) = self.parse(&candidate, i18n::RegionCode::get_unknown()) {
                    return Ok(number);
                }
            }
        }
        Err(GetExampleNumberError::NoExampleNumber)
    }

    // ------------------------------------------------------------------
    // Number matching
    // ------------------------------------------------------------------

    /// Takes two phone numbers and compares them for equality: an exact
    /// match, a match of the national significant number only, a match where
    /// one NSN is a suffix of the other, or no match at all.
    pub fn is_number_match(
        &self,
        first_number_in: &PhoneNumber,
        second_number_in: &PhoneNumber,
    ) -> MatchType {
        // We only care about the fields that uniquely define a number, so we copy
        // these across explicitly.
        let mut first_number = copy_core_fields_only(first_number_in);
        let second_number = copy_core_fields_only(second_number_in);
        let first_number_country_code = first_number.country_code();
        let second_number_country_code = second_number.country_code();
        // Both had country calling code specified.
        if first_number_country_code != 0 && second_number_country_code != 0 {
            if first_number == second_number {
                return MatchType::ExactMatch;
            } else if first_number_country_code == second_number_country_code
                && is_national_number_suffix_of_the_other(&first_number, &second_number)
            {
                // A SHORT_NSN_MATCH occurs if there is a difference because of the
                // presence or absence of an 'Italian leading zero', the presence or
                // absence of an extension, or one NSN being a shorter variant of the
                // other.
                return MatchType::ShortNsnMatch;
            }
            return MatchType::NoMatch;
        }
        // Checks cases where one or both country calling codes were not specified.
        // To make equality checks easier, we first set the country codes to be equal.
        first_number.set_country_code(second_number_country_code);
        // If all else was the same, then this is an NSN_MATCH.
        if first_number == second_number {
            return MatchType::NsnMatch;
        }
        if is_national_number_suffix_of_the_other(&first_number, &second_number) {
            return MatchType::ShortNsnMatch;
        }
        MatchType::NoMatch
    }

    /// Takes a phone number and a raw string and compares them, as
    /// `is_number_match` does after parsing the string.
    pub fn is_number_match_with_one_number(
        &self,
        first_number: &PhoneNumber,
        second_number: &str,
    ) -> MatchType {
        // First see if the second number has an implicit country calling code, by
        // attempting to parse it.
        match self.parse(second_number, i18n::RegionCode::get_unknown()) {
            Ok(second_number_as_proto) => {
                self.is_number_match(first_number, &second_number_as_proto)
            }
            Err(ParseError::InvalidCountryCode) => {
                // The second number has no country calling code. EXACT_MATCH is no
                // longer possible. We parse it as if the region was the same as that
                // for the first number, and if EXACT_MATCH is returned, we replace
                // this with NSN_MATCH.
                let first_number_region =
                    self.get_region_code_for_country_code(first_number.country_code());
                if first_number_region != i18n::RegionCode::get_unknown() {
                    match self.parse(second_number, first_number_region) {
                        Ok(second_number_with_first_number_region) => {
                            let match_type = self
                                .is_number_match(first_number, &second_number_with_first_number_region);
                            if match_type == MatchType::ExactMatch {
                                return MatchType::NsnMatch;
                            }
                            match_type
                        }
                        Err(_) => MatchType::NotANumber,
                    }
                } else {
                    // If the first number didn't have a valid country calling code,
                    // then we parse the second number without one as well.
                    let mut second_number_proto = PhoneNumber::new();
                    match self.parse_helper(
                        second_number,
                        i18n::RegionCode::get_unknown(),
                        false,
                        false,
                        &mut second_number_proto,
                    ) {
                        Ok(()) => self.is_number_match(first_number, &second_number_proto),
                        Err(_) => MatchType::NotANumber,
                    }
                }
            }
            Err(_) => MatchType::NotANumber,
        }
    }
}
