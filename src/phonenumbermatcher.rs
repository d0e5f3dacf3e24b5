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

//! A stateful class that finds and extracts telephone numbers from text.
//!
//! Vanity numbers (phone numbers using alphabetic digits such as
//! '1-800-SIX-FLAGS') are not found.

use std::sync::LazyLock;

use regex::Regex;

use crate::{
    regex_util::RegexMatchStart,
    phonenumberutil::{
        helper_constants::{
            MAX_LENGTH_COUNTRY_CODE, MAX_LENGTH_FOR_NSN, PLUS_CHARS, VALID_PUNCTUATION,
        },
        MatchType, PhoneNumberFormat, PhoneNumberUtil, PHONE_NUMBER_UTIL,
    },
    proto_gen::phonenumber::{phone_number::CountryCodeSource, PhoneNumber},
};

const OPENING_PARENS: &str = "(\\[\u{FF08}\u{FF3B}";
const CLOSING_PARENS: &str = ")\\]\u{FF09}\u{FF3D}";
const BRACKET_PAIR_LIMIT: &str = "{0,3}";
const LEAD_LIMIT: &str = "{0,2}";
const PUNCTUATION_LIMIT: &str = "{0,4}";
/// The maximum number of digits allowed in a digit-separated block. As we
/// allow all digits in a single block, this is the maximum number of digits
/// in a national significant number plus the country calling code.
const DIGIT_BLOCK_LIMIT: usize = MAX_LENGTH_FOR_NSN + MAX_LENGTH_COUNTRY_CODE;
/// The default number of parse attempts before giving up on a piece of text.
const DEFAULT_MAX_TRIES: u32 = 65535;

struct MatcherRegExps {
    /// Matches phone-number-like candidates in text: an optional lead (plus
    /// sign or bracket), punctuation-limited digit blocks and an optional
    /// extension suffix.
    pattern: Regex,
    /// Matches strings that look like dates using "/" as a separator. For
    /// example 30/4/2021 or 08/31/95.
    slash_separated_dates: Regex,
    /// Matches timestamps. For example "2012-01-02 08:00". The trailing
    /// ":\d\d" is covered by `time_stamps_suffix`.
    time_stamps: Regex,
    time_stamps_suffix: Regex,
    /// Matches white-space and brackets in balanced pairs; a candidate whose
    /// brackets do not pair up is rejected wholesale.
    matching_brackets: Regex,
    /// Matches publication-style page references such as "Computing
    /// Canada. 15-19(2)".
    pub_pages: Regex,
    /// Marks the start of a second phone number in the same candidate.
    second_number_start: Regex,
    /// Trailing characters to drop from inner-match groups.
    unwanted_end_chars: Regex,
    lead_class: Regex,
    invalid_punctuation: Regex,
    non_digits: Regex,
    /// Patterns used to extract phone numbers from a larger phone-number-like
    /// pattern. These are ordered according to specificity. For example,
    /// white-space is last since that is frequently used in numbers, not just
    /// to separate two numbers. We have separate patterns since we don't want
    /// to break up the phone-number-like text on more than one different kind
    /// of symbol at one time, although symbols of the same type (e.g. space)
    /// can be safely grouped together.
    ///
    /// Note that if there is a match, we will always check any text found up
    /// to the first match as well.
    inner_matches: Vec<Regex>,
}

impl MatcherRegExps {
    fn new() -> Self {
        let non_parens = format!("[^{}{}]", OPENING_PARENS, CLOSING_PARENS);
        let lead_class = format!("[{}{}]", OPENING_PARENS, PLUS_CHARS);
        let punctuation = format!("[{}]{}", VALID_PUNCTUATION, PUNCTUATION_LIMIT);
        let digit_sequence = format!("\\p{{Nd}}{{1,{}}}", DIGIT_BLOCK_LIMIT);
        let block_limit = format!("{{0,{}}}", DIGIT_BLOCK_LIMIT);
        let extn_patterns_for_matching = PHONE_NUMBER_UTIL.get_extn_patterns_for_matching();

        Self {
            pattern: Regex::new(&format!(
                "(?i)(?:{lead}{punct}){lead_limit}{digits}(?:{punct}{digits}){block_limit}(?:{extn})?",
                lead = lead_class,
                punct = punctuation,
                lead_limit = LEAD_LIMIT,
                digits = digit_sequence,
                block_limit = block_limit,
                extn = extn_patterns_for_matching,
            ))
            .unwrap(),
            slash_separated_dates: Regex::new(
                "(?:(?:[0-3]?\\d/[01]?\\d)|(?:[01]?\\d/[0-3]?\\d))/(?:[12]\\d)?\\d{2}",
            )
            .unwrap(),
            time_stamps: Regex::new("[12]\\d{3}[-/]?[01]\\d[-/]?[0-3]\\d +[0-2]\\d$").unwrap(),
            time_stamps_suffix: Regex::new(":[0-5]\\d").unwrap(),
            matching_brackets: Regex::new(&format!(
                "^(?:(?:[{open}])?(?:{np}+[{close}])?{np}+(?:[{open}]{np}+[{close}]){limit}{np}*)$",
                open = OPENING_PARENS,
                close = CLOSING_PARENS,
                np = non_parens,
                limit = BRACKET_PAIR_LIMIT,
            ))
            .unwrap(),
            pub_pages: Regex::new("\\d{1,5}-+\\d{1,5}\\s{0,4}\\(\\d{1,4}").unwrap(),
            second_number_start: Regex::new(r"[\\/] *x").unwrap(),
            // Anchored at the end: trims the trailing run of characters that
            // are neither alphanumeric nor '#'.
            unwanted_end_chars: Regex::new("[^\\p{N}\\p{L}#]+$").unwrap(),
            lead_class: Regex::new(&lead_class).unwrap(),
            invalid_punctuation: Regex::new("[\\p{Sc}%]").unwrap(),
            non_digits: Regex::new("(\\D+)").unwrap(),
            inner_matches: vec![
                // Breaks on the slash - e.g. "651-234-2345/332-445-1234"
                Regex::new("/+(.*)").unwrap(),
                // Note that the bracket here is inside the capturing group, since
                // we consider it part of the phone number. Will match a pattern
                // like "(650) 223 3345 (754) 223 3321".
                Regex::new("(\\([^(]*)").unwrap(),
                // Breaks on a hyphen - e.g. "12345 - 332-445-1234 is my number."
                // We require a space on either side of the hyphen for it to be
                // considered a separator.
                Regex::new("(?:\\p{Z}-|-\\p{Z})\\p{Z}*(.+)").unwrap(),
                // Various types of wide hyphens. Note we have decided not to
                // enforce a space here, since it's possible that it's supposed to
                // be used to break two numbers without spaces, and we haven't
                // seen many instances of it used within a number.
                Regex::new("[\u{2012}-\u{2015}\u{FF0D}]\\p{Z}*(.+)").unwrap(),
                // Breaks on a full stop - e.g. "12345. 332-445-1234 is my number."
                Regex::new("\\.+\\p{Z}*([^.]+)").unwrap(),
                // Breaks on space - e.g. "3324451234 8002341234"
                Regex::new("\\p{Z}+(\\P{Z}+)").unwrap(),
            ],
        }
    }
}

static MATCHER_REG_EXPS: LazyLock<MatcherRegExps> = LazyLock::new(MatcherRegExps::new);

/// The strictness of a candidate check; each level accepts a subset of what
/// the previous one accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Leniency {
    /// Phone numbers accepted are possible but not necessarily valid.
    Possible,
    /// Phone numbers accepted are possible and valid.
    Valid,
    /// Phone numbers accepted are valid and are grouped in a possible way for
    /// this locale. For example, a US number written as "65 02 53 00 00" is
    /// not accepted at this leniency level, whereas "650 253 000" or
    /// "6502530000" are. Numbers with more than one '/' symbol in the
    /// national significant number are also dropped.
    StrictGrouping,
    /// Phone numbers accepted are valid and are grouped in the same way that
    /// we would have formatted it, or as a single block.
    ExactGrouping,
}

impl Leniency {
    fn verify(&self, number: &PhoneNumber, candidate: &str, util: &PhoneNumberUtil) -> bool {
        match self {
            Leniency::Possible => util.is_possible_number(number),
            Leniency::Valid => Self::verify_valid(number, candidate, util),
            Leniency::StrictGrouping => {
                Self::verify_valid(number, candidate, util)
                    && check_number_grouping_is_valid(
                        number,
                        candidate,
                        util,
                        all_number_groups_remain_grouped,
                    )
            }
            Leniency::ExactGrouping => {
                Self::verify_valid(number, candidate, util)
                    && check_number_grouping_is_valid(
                        number,
                        candidate,
                        util,
                        all_number_groups_are_exactly_present,
                    )
            }
        }
    }

    fn verify_valid(number: &PhoneNumber, candidate: &str, util: &PhoneNumberUtil) -> bool {
        util.is_valid_number(number).unwrap_or(false)
            && contains_only_valid_x_chars(number, candidate, util)
            && !contains_more_than_one_slash_in_national_number(number, candidate)
            && is_national_prefix_present_if_required(number, util)
    }
}

/// The characters 'x' and 'X' can be (1) a carrier code, in which case they
/// always precede the national significant number or (2) an extension sign,
/// in which case they always precede the extension number. We assume a
/// carrier code is more than 1 digit, so the first case has to have more than
/// 1 consecutive 'x' or 'X', whereas the second case can only have exactly 1
/// 'x' or 'X'. We ignore the character if it appears as the last character of
/// the string.
fn contains_only_valid_x_chars(
    number: &PhoneNumber,
    candidate: &str,
    util: &PhoneNumberUtil,
) -> bool {
    let bytes = candidate.as_bytes();
    let mut index = 0;
    while index + 1 < bytes.len() {
        let char_at_index = bytes[index];
        if char_at_index == b'x' || char_at_index == b'X' {
            let char_at_next_index = bytes[index + 1];
            if char_at_next_index == b'x' || char_at_next_index == b'X' {
                // This is the carrier code case, in which the 'X's always
                // precede the national significant number.
                index += 1;
                if util.is_number_match_with_one_number(number, &candidate[index..])
                    != MatchType::NsnMatch
                {
                    return false;
                }
                // This is the extension sign case, in which the 'x' or 'X'
                // should always precede the extension number.
            } else if util.normalize_digits_only(&candidate[index..]) != number.extension() {
                return false;
            }
        }
        index += 1;
    }
    true
}

fn is_national_prefix_present_if_required(number: &PhoneNumber, util: &PhoneNumberUtil) -> bool {
    // First, check how we deduced the country code. If it was written in
    // international format, then the national prefix is not required.
    if number.country_code_source() != CountryCodeSource::FROM_DEFAULT_COUNTRY {
        return true;
    }
    let phone_number_region = util.get_region_code_for_country_code(number.country_code());
    let Some(metadata) = util.get_metadata_for_region(phone_number_region) else {
        return true;
    };
    // Check if a national prefix should be present when formatting this number.
    let national_number = PhoneNumberUtil::get_national_significant_number(number);
    let format_rule = util
        .choose_formatting_pattern_for_number(&metadata.number_format, &national_number)
        .ok()
        .flatten();
    // To do this, we check that a national prefix formatting rule was present
    // and that it wasn't just the first-group symbol ($1) with punctuation.
    let Some(format_rule) = format_rule else {
        return true;
    };
    if format_rule.national_prefix_formatting_rule().is_empty() {
        return true;
    }
    if format_rule.national_prefix_optional_when_formatting() {
        // The national-prefix is optional in these cases, so we don't need to
        // check if it was present.
        return true;
    }
    if util.formatting_rule_has_first_group_only(format_rule.national_prefix_formatting_rule()) {
        // National prefix not needed for this number.
        return true;
    }
    // Normalize the remainder.
    let mut raw_input = util.normalize_digits_only(number.raw_input());
    // Check if we found a national prefix and/or carrier code at the start of
    // the raw input, and return the result.
    util.maybe_strip_national_prefix_and_carrier_code(&mut raw_input, metadata, None)
        .unwrap_or(false)
}

fn contains_more_than_one_slash_in_national_number(
    number: &PhoneNumber,
    candidate: &str,
) -> bool {
    let Some(first_slash) = candidate.find('/') else {
        // No slashes, this is okay.
        return false;
    };
    // Now look for a second one.
    let after_first = &candidate[first_slash + 1..];
    let Some(second_slash) = after_first.find('/') else {
        // Only one slash, this is okay.
        return false;
    };

    // If the first slash is after the country calling code, this is permitted.
    let candidate_has_country_code = matches!(
        number.country_code_source(),
        CountryCodeSource::FROM_NUMBER_WITH_PLUS_SIGN
            | CountryCodeSource::FROM_NUMBER_WITHOUT_PLUS_SIGN
    );
    let mut buf = itoa::Buffer::new();
    let country_code = buf.format(number.country_code());
    if candidate_has_country_code
        && candidate[..first_slash]
            .chars()
            .filter(|c| c.is_ascii_digit())
            .collect::<String>()
            == country_code
    {
        // Any more slashes and this is illegal.
        return after_first[second_slash + 1..].contains('/');
    }
    true
}

fn check_number_grouping_is_valid(
    number: &PhoneNumber,
    candidate: &str,
    util: &PhoneNumberUtil,
    checker: fn(&PhoneNumberUtil, &PhoneNumber, &str, &[String]) -> bool,
) -> bool {
    let normalized_candidate = util.normalize_digits(candidate, true);
    let Some(formatted_number_groups) = get_national_number_groups(util, number) else {
        return false;
    };
    checker(util, number, &normalized_candidate, &formatted_number_groups)
}

/// Helper method to get the national-number part of a number, formatted
/// without any national prefix, and return it as a set of digit blocks that
/// would be formatted together.
fn get_national_number_groups(util: &PhoneNumberUtil, number: &PhoneNumber) -> Option<Vec<String>> {
    // This will be in the format +CC-DG;ext=EXT where DG represents groups of
    // digits.
    let rfc3966_format = util.format(number, PhoneNumberFormat::RFC3966).ok()?;
    // We remove the extension part from the formatted string before splitting
    // it into different groups.
    let end_index = rfc3966_format.find(';').unwrap_or(rfc3966_format.len());
    // The country-code will have a '-' following it.
    let start_index = rfc3966_format.find('-').map(|index| index + 1)?;
    if start_index > end_index {
        return None;
    }
    Some(
        rfc3966_format[start_index..end_index]
            .split('-')
            .map(str::to_string)
            .collect(),
    )
}

fn all_number_groups_remain_grouped(
    util: &PhoneNumberUtil,
    number: &PhoneNumber,
    normalized_candidate: &str,
    formatted_number_groups: &[String],
) -> bool {
    let mut from_index = 0;
    if number.country_code_source() != CountryCodeSource::FROM_DEFAULT_COUNTRY {
        // First skip the country code if the normalized candidate contained it.
        let mut buf = itoa::Buffer::new();
        let country_code = buf.format(number.country_code());
        match normalized_candidate.find(country_code) {
            Some(index) => from_index = index + country_code.len(),
            None => return false,
        }
    }
    // Check each group of consecutive digits are not broken into separate
    // groupings in the normalized_candidate string.
    for (i, group) in formatted_number_groups.iter().enumerate() {
        // Fails if the substring of normalized_candidate starting from
        // from_index doesn't contain the consecutive digits in group.
        match normalized_candidate[from_index..].find(group.as_str()) {
            None => return false,
            Some(relative_index) => {
                from_index += relative_index;
                // Moves from_index forward.
                from_index += group.len();
                if i == 0 && from_index < normalized_candidate.len() {
                    // We are at the position right after the NDC. We get the
                    // region used for formatting information based on the
                    // country code in the phone number, rather than the number
                    // itself, as we do not need to distinguish between
                    // different countries with the same country calling code
                    // and this is faster.
                    let region = util.get_region_code_for_country_code(number.country_code());
                    let ndd_prefix_present = util
                        .get_ndd_prefix_for_region(region, true)
                        .is_some_and(|prefix| !prefix.is_empty());
                    let next_is_digit = normalized_candidate[from_index..]
                        .chars()
                        .next()
                        .is_some_and(|c| c.is_ascii_digit());
                    if ndd_prefix_present && next_is_digit {
                        // This means there is no formatting symbol after the
                        // NDC. In this case, we only accept the number if there
                        // is no formatting symbol at all in the number, except
                        // for extensions. This is only important for countries
                        // with national prefixes.
                        let national_significant_number =
                            PhoneNumberUtil::get_national_significant_number(number);
                        return normalized_candidate[from_index - group.len()..]
                            .starts_with(&national_significant_number);
                    }
                }
            }
        }
    }
    // The check here makes sure that we haven't mistakenly already used the
    // extension to match the last group of the subscriber number. Note the
    // extension cannot have formatting in-between digits.
    normalized_candidate[from_index..].contains(number.extension())
}

fn all_number_groups_are_exactly_present(
    util: &PhoneNumberUtil,
    number: &PhoneNumber,
    normalized_candidate: &str,
    formatted_number_groups: &[String],
) -> bool {
    let candidate_groups: Vec<&str> = MATCHER_REG_EXPS
        .non_digits
        .split(normalized_candidate)
        .collect();
    // Set this to the last group, skipping it if the number has an extension.
    let mut candidate_number_group_index = if number.has_extension() {
        candidate_groups.len() as isize - 2
    } else {
        candidate_groups.len() as isize - 1
    };
    // First we check if the national significant number is formatted as a
    // block. We use contains and not equals, since the national significant
    // number may be present with a prefix such as a national number prefix, or
    // the country code itself.
    if candidate_groups.len() == 1
        || (candidate_number_group_index >= 0
            && candidate_groups[candidate_number_group_index as usize]
                .contains(&PhoneNumberUtil::get_national_significant_number(number)))
    {
        return true;
    }
    // Starting from the end, go through in reverse, excluding the first group,
    // and check the candidate and number groups are the same.
    let mut formatted_number_group_index = formatted_number_groups.len() as isize - 1;
    while formatted_number_group_index > 0 && candidate_number_group_index >= 0 {
        if candidate_groups[candidate_number_group_index as usize]
            != formatted_number_groups[formatted_number_group_index as usize]
        {
            return false;
        }
        formatted_number_group_index -= 1;
        candidate_number_group_index -= 1;
    }
    // Now check the first group. There may be a national prefix at the start,
    // so we only check that the candidate group ends with the formatted number
    // group.
    candidate_number_group_index >= 0
        && candidate_groups[candidate_number_group_index as usize]
            .ends_with(formatted_number_groups[0].as_str())
}

fn is_invalid_punctuation_symbol(character: char) -> bool {
    let mut buffer = [0u8; 4];
    MATCHER_REG_EXPS
        .invalid_punctuation
        .is_match(character.encode_utf8(&mut buffer))
}

/// Helper method to determine if a character is a Latin-script letter or not.
/// For our purposes, combining marks should also return true since we assume
/// they have been added to a preceding Latin character.
fn is_latin_letter(letter: char) -> bool {
    let code = letter as u32;
    let is_combining_mark = (0x0300..=0x036F).contains(&code);
    // Combining marks are a subset of non-spacing-mark.
    if !letter.is_alphabetic() && !is_combining_mark {
        return false;
    }
    code <= 0x024F // Basic Latin through Latin Extended-B
        || (0x1E00..=0x1EFF).contains(&code) // Latin Extended Additional
        || is_combining_mark
}

fn trim_after_first_match<'b>(pattern: &Regex, candidate: &'b str) -> &'b str {
    match pattern.find(candidate) {
        Some(first_match) => &candidate[..first_match.start()],
        None => candidate,
    }
}

/// The immutable match of a phone number within a piece of text. Matches may
/// be found using [`PhoneNumberMatcher`].
///
/// A match consists of the phone number as well as the start and end offsets
/// of the corresponding subsequence of the searched text. Use `raw_string()`
/// to obtain the matched subsequence.
#[derive(Debug, Clone, PartialEq)]
pub struct PhoneNumberMatch {
    start: usize,
    raw_string: String,
    number: PhoneNumber,
}

impl PhoneNumberMatch {
    fn new(start: usize, raw_string: String, number: PhoneNumber) -> Self {
        Self { start, raw_string, number }
    }

    /// The start byte offset of the matched phone number within the searched text.
    pub fn start(&self) -> usize {
        self.start
    }

    /// The exclusive end byte offset of the matched phone number.
    pub fn end(&self) -> usize {
        self.start + self.raw_string.len()
    }

    /// The raw substring matched.
    pub fn raw_string(&self) -> &str {
        &self.raw_string
    }

    /// The phone number parsed from the matched substring.
    pub fn number(&self) -> &PhoneNumber {
        &self.number
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    NotReady,
    Ready,
    Done,
}

/// A stateful iterator extracting phone numbers from text. The iteration
/// contract is NOT_READY -> READY on a successful search, READY -> NOT_READY
/// when the match is consumed, and NOT_READY -> DONE on exhaustion.
pub struct PhoneNumberMatcher<'a> {
    util: &'a PhoneNumberUtil,
    text: &'a str,
    preferred_region: &'a str,
    leniency: Leniency,
    /// The degenerate case where a piece of text is so large that a
    /// pathological number of candidates appear is bounded by this counter:
    /// every parse-and-verify attempt, successful or not, decrements it.
    max_tries: u32,
    state: State,
    last_match: Option<PhoneNumberMatch>,
    search_index: usize,
}

impl<'a> PhoneNumberMatcher<'a> {
    /// Creates a matcher over `text` with [`Leniency::Valid`] and the default
    /// tries limit, using the process-wide engine.
    pub fn new(text: &'a str, region: &'a str) -> Self {
        Self::with_leniency(&PHONE_NUMBER_UTIL, text, region, Leniency::Valid, DEFAULT_MAX_TRIES)
    }

    pub fn with_leniency(
        util: &'a PhoneNumberUtil,
        text: &'a str,
        region: &'a str,
        leniency: Leniency,
        max_tries: u32,
    ) -> Self {
        Self {
            util,
            text,
            preferred_region: region,
            leniency,
            max_tries,
            state: State::NotReady,
            last_match: None,
            search_index: 0,
        }
    }

    /// Attempts to find the next phone number in the text from the given
    /// search index.
    fn find(&mut self, index: usize) -> Option<PhoneNumberMatch> {
        let mut index = index;
        while self.max_tries > 0 {
            let candidate_match = MATCHER_REG_EXPS.pattern.find(&self.text[index..])?;
            let start = index + candidate_match.start();
            let mut candidate = &self.text[start..index + candidate_match.end()];

            // Check for extra numbers at the end.
            candidate = trim_after_first_match(&MATCHER_REG_EXPS.second_number_start, candidate);

            if let Some(found) = self.extract_match(candidate, start) {
                return Some(found);
            }
            // Move along.
            index = start + candidate.len();
        }
        None
    }

    /// Attempts to extract a match from a candidate.
    fn extract_match(&mut self, candidate: &str, offset: usize) -> Option<PhoneNumberMatch> {
        // Skip a match that is more likely to be a date.
        if MATCHER_REG_EXPS.slash_separated_dates.is_match(candidate) {
            return None;
        }
        // Skip potential time-stamps.
        if MATCHER_REG_EXPS.time_stamps.is_match(candidate) {
            let following_text = &self.text[offset + candidate.len()..];
            if MATCHER_REG_EXPS.time_stamps_suffix.matches_start(following_text) {
                return None;
            }
        }

        // Try to come up with a valid match given the entire candidate.
        if let Some(found) = self.parse_and_verify(candidate, offset) {
            return Some(found);
        }
        // If that failed, try to find an "inner match" - there might be a
        // phone number within this candidate.
        self.extract_inner_match(candidate, offset)
    }

    /// Attempts to extract a match from `candidate` if the whole candidate
    /// does not qualify as a match.
    fn extract_inner_match(&mut self, candidate: &str, offset: usize) -> Option<PhoneNumberMatch> {
        for possible_inner_match in &MATCHER_REG_EXPS.inner_matches {
            let mut is_first_match = true;
            for group_match in possible_inner_match.captures_iter(candidate) {
                if self.max_tries == 0 {
                    return None;
                }
                let whole = group_match.get(0)?;
                if is_first_match {
                    // We should handle any group before this one too.
                    let group = trim_after_first_match(
                        &MATCHER_REG_EXPS.unwanted_end_chars,
                        &candidate[..whole.start()],
                    );
                    if let Some(found) = self.parse_and_verify(group, offset) {
                        return Some(found);
                    }
                    is_first_match = false;
                }
                let inner_group = group_match.get(1)?;
                let group = trim_after_first_match(
                    &MATCHER_REG_EXPS.unwanted_end_chars,
                    inner_group.as_str(),
                );
                if let Some(found) = self.parse_and_verify(group, offset + inner_group.start()) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Parses a phone number from the candidate using the engine and verifies
    /// it matches the requested leniency. Every attempt, successful or not,
    /// consumes one of `max_tries`.
    fn parse_and_verify(&mut self, candidate: &str, offset: usize) -> Option<PhoneNumberMatch> {
        if self.max_tries == 0 {
            return None;
        }
        self.max_tries -= 1;

        // Check the candidate doesn't contain any formatting which would
        // indicate that it really isn't a phone number.
        if !MATCHER_REG_EXPS.matching_brackets.is_match(candidate)
            || MATCHER_REG_EXPS.pub_pages.is_match(candidate)
        {
            return None;
        }

        // If leniency is set to VALID or stricter, we also want to skip
        // numbers that are surrounded by Latin alphabetic characters, to skip
        // cases like abc8005001234 or 8005001234def.
        if self.leniency >= Leniency::Valid {
            // If the candidate is not at the start of the text, and does not
            // start with phone-number punctuation, check the previous character.
            if offset > 0 && !MATCHER_REG_EXPS.lead_class.matches_start(candidate) {
                if let Some(previous_char) = self.text[..offset].chars().next_back() {
                    if is_invalid_punctuation_symbol(previous_char)
                        || is_latin_letter(previous_char)
                    {
                        return None;
                    }
                }
            }
            let last_char_index = offset + candidate.len();
            if last_char_index < self.text.len() {
                if let Some(next_char) = self.text[last_char_index..].chars().next() {
                    if is_invalid_punctuation_symbol(next_char) || is_latin_letter(next_char) {
                        return None;
                    }
                }
            }
        }

        let number = self
            .util
            .parse_and_keep_raw_input(candidate, self.preferred_region)
            .ok()?;
        if self.leniency.verify(&number, candidate, self.util) {
            // We used parse_and_keep_raw_input to get formatting information
            // for the verification, but the match itself exposes only the core
            // fields; the raw string is available on the match.
            let mut number = number;
            number.clear_country_code_source();
            number.clear_raw_input();
            number.clear_preferred_domestic_carrier_code();
            return Some(PhoneNumberMatch::new(offset, candidate.to_string(), number));
        }
        None
    }

    /// Advances the state machine. After this returns true, `next()` yields a
    /// match without further searching.
    pub fn has_next(&mut self) -> bool {
        if self.state == State::NotReady {
            self.last_match = self.find(self.search_index);
            match &self.last_match {
                None => self.state = State::Done,
                Some(found) => {
                    self.search_index = found.end();
                    self.state = State::Ready;
                }
            }
        }
        self.state == State::Ready
    }
}

impl Iterator for PhoneNumberMatcher<'_> {
    type Item = PhoneNumberMatch;

    fn next(&mut self) -> Option<PhoneNumberMatch> {
        if !self.has_next() {
            return None;
        }
        // Remove from memory after use.
        let result = self.last_match.take();
        self.state = State::NotReady;
        result
    }
}
