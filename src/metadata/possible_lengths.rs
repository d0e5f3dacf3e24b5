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

//! Restores `possible_length` lists that the offline build pipeline stripped
//! from the shipped descriptors, by walking the national number pattern and
//! collecting the lengths it can match.
//!
//! The walker understands the shapes that actually occur in the tables:
//! top-level alternation, concatenation of single-character atoms (`\d`,
//! character classes, literal digits), non-capturing and capturing groups,
//! and the bounded quantifiers `?`, `{m}` and `{m,n}`. Anything outside that
//! shape yields no lengths, and every consumer then falls back to the full
//! regex match.

use std::collections::BTreeSet;

use crate::proto_gen::phonemetadata::{PhoneMetadata, PhoneNumberDesc};

const MAX_LENGTH: u32 = 24;
const MAX_SET_SIZE: usize = 256;
const MAX_GROUP_DEPTH: usize = 8;

pub(crate) fn derive_possible_lengths(metadata: &mut PhoneMetadata) {
    let general_needs_merge = metadata
        .general_desc
        .0
        .as_deref()
        .is_some_and(|desc| desc.possible_length.is_empty());

    derive_for_desc(metadata.general_desc.0.as_deref_mut());
    derive_for_desc(metadata.fixed_line.0.as_deref_mut());
    derive_for_desc(metadata.mobile.0.as_deref_mut());
    derive_for_desc(metadata.toll_free.0.as_deref_mut());
    derive_for_desc(metadata.premium_rate.0.as_deref_mut());
    derive_for_desc(metadata.shared_cost.0.as_deref_mut());
    derive_for_desc(metadata.personal_number.0.as_deref_mut());
    derive_for_desc(metadata.voip.0.as_deref_mut());
    derive_for_desc(metadata.pager.0.as_deref_mut());
    derive_for_desc(metadata.uan.0.as_deref_mut());
    derive_for_desc(metadata.emergency.0.as_deref_mut());
    derive_for_desc(metadata.voicemail.0.as_deref_mut());
    derive_for_desc(metadata.short_code.0.as_deref_mut());
    derive_for_desc(metadata.standard_rate.0.as_deref_mut());
    derive_for_desc(metadata.carrier_specific.0.as_deref_mut());
    derive_for_desc(metadata.sms_services.0.as_deref_mut());
    derive_for_desc(metadata.no_international_dialling.0.as_deref_mut());

    // Numbers that cannot be dialled internationally are still part of the
    // general description, so their lengths join a derived general list.
    if general_needs_merge {
        let no_intl_lengths = metadata
            .no_international_dialling
            .0
            .as_deref()
            .map(|desc| desc.possible_length.clone())
            .unwrap_or_default();
        if let Some(general) = metadata.general_desc.0.as_deref_mut() {
            if !general.possible_length.is_empty() && !no_intl_lengths.is_empty() {
                general.possible_length.extend(no_intl_lengths);
                general.possible_length.sort_unstable();
                general.possible_length.dedup();
            }
        }
    }
}

fn derive_for_desc(desc: Option<&mut PhoneNumberDesc>) {
    let Some(desc) = desc else { return };
    if !desc.possible_length.is_empty() || !desc.has_national_number_pattern() {
        return;
    }
    if let Some(lengths) = possible_lengths_for_pattern(desc.national_number_pattern()) {
        desc.possible_length = lengths.into_iter().map(|length| length as i32).collect();
    }
}

/// The set of match lengths of `pattern`, or `None` when the pattern falls
/// outside the supported shape.
pub(crate) fn possible_lengths_for_pattern(pattern: &str) -> Option<BTreeSet<u32>> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut pos = 0;
    let mut lengths = parse_alternation(&chars, &mut pos, 0)?;
    if pos != chars.len() {
        return None;
    }
    lengths.remove(&0);
    if lengths.is_empty() {
        return None;
    }
    Some(lengths)
}

fn parse_alternation(
    chars: &[char],
    pos: &mut usize,
    depth: usize,
) -> Option<BTreeSet<u32>> {
    if depth > MAX_GROUP_DEPTH {
        return None;
    }
    let mut lengths = parse_concat(chars, pos, depth)?;
    while *pos < chars.len() && chars[*pos] == '|' {
        *pos += 1;
        lengths.extend(parse_concat(chars, pos, depth)?);
    }
    Some(lengths)
}

fn parse_concat(chars: &[char], pos: &mut usize, depth: usize) -> Option<BTreeSet<u32>> {
    let mut lengths = BTreeSet::from([0]);
    while *pos < chars.len() && chars[*pos] != '|' && chars[*pos] != ')' {
        let atom = parse_atom(chars, pos, depth)?;
        let atom = parse_quantifier(chars, pos, atom)?;
        lengths = sum_sets(&lengths, &atom)?;
    }
    Some(lengths)
}

fn parse_atom(chars: &[char], pos: &mut usize, depth: usize) -> Option<BTreeSet<u32>> {
    match chars.get(*pos)? {
        '(' => {
            *pos += 1;
            if chars.get(*pos) == Some(&'?') {
                // Only plain non-capturing groups; lookarounds are out of
                // shape (and unsupported by the engine anyway).
                if chars.get(*pos + 1) != Some(&':') {
                    return None;
                }
                *pos += 2;
            }
            let inner = parse_alternation(chars, pos, depth + 1)?;
            if chars.get(*pos) != Some(&')') {
                return None;
            }
            *pos += 1;
            Some(inner)
        }
        '[' => {
            skip_char_class(chars, pos)?;
            Some(BTreeSet::from([1]))
        }
        '\\' => {
            *pos += 1;
            let escaped = chars.get(*pos)?;
            if *escaped == 'p' || *escaped == 'P' {
                // \p{..} unicode class, one character wide.
                *pos += 1;
                if chars.get(*pos) != Some(&'{') {
                    return None;
                }
                while chars.get(*pos) != Some(&'}') {
                    *pos += 1;
                    if *pos > chars.len() {
                        return None;
                    }
                }
            }
            *pos += 1;
            Some(BTreeSet::from([1]))
        }
        '^' | '$' | '*' | '+' | '?' | '{' => None,
        _ => {
            *pos += 1;
            Some(BTreeSet::from([1]))
        }
    }
}

fn skip_char_class(chars: &[char], pos: &mut usize) -> Option<()> {
    // Called at '['.
    *pos += 1;
    if chars.get(*pos) == Some(&'^') {
        *pos += 1;
    }
    loop {
        match chars.get(*pos)? {
            ']' => {
                *pos += 1;
                return Some(());
            }
            '\\' => *pos += 2,
            _ => *pos += 1,
        }
    }
}

fn parse_quantifier(
    chars: &[char],
    pos: &mut usize,
    atom: BTreeSet<u32>,
) -> Option<BTreeSet<u32>> {
    match chars.get(*pos) {
        Some('?') => {
            *pos += 1;
            let mut lengths = atom;
            lengths.insert(0);
            Some(lengths)
        }
        Some('*') | Some('+') => None,
        Some('{') => {
            *pos += 1;
            let min = parse_number(chars, pos)?;
            let max = match chars.get(*pos)? {
                '}' => min,
                ',' => {
                    *pos += 1;
                    if chars.get(*pos) == Some(&'}') {
                        // {m,} is unbounded.
                        return None;
                    }
                    parse_number(chars, pos)?
                }
                _ => return None,
            };
            if chars.get(*pos) != Some(&'}') || max < min {
                return None;
            }
            *pos += 1;
            repeat_range(&atom, min, max)
        }
        _ => Some(atom),
    }
}

fn parse_number(chars: &[char], pos: &mut usize) -> Option<u32> {
    let start = *pos;
    let mut value: u32 = 0;
    while let Some(digit) = chars.get(*pos).and_then(|c| c.to_digit(10)) {
        value = value.checked_mul(10)?.checked_add(digit)?;
        *pos += 1;
    }
    if *pos == start || value > MAX_LENGTH {
        return None;
    }
    Some(value)
}

fn repeat_range(atom: &BTreeSet<u32>, min: u32, max: u32) -> Option<BTreeSet<u32>> {
    let mut current = BTreeSet::from([0]);
    for _ in 0..min {
        current = sum_sets(&current, atom)?;
    }
    let mut lengths = current.clone();
    for _ in min..max {
        current = sum_sets(&current, atom)?;
        lengths.extend(current.iter().copied());
    }
    Some(lengths)
}

fn sum_sets(left: &BTreeSet<u32>, right: &BTreeSet<u32>) -> Option<BTreeSet<u32>> {
    let mut out = BTreeSet::new();
    for a in left {
        for b in right {
            let sum = a + b;
            if sum <= MAX_LENGTH {
                out.insert(sum);
            }
        }
    }
    if out.is_empty() || out.len() > MAX_SET_SIZE {
        return None;
    }
    Some(out)
}
