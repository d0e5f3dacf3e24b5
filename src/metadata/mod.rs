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

//! Decoders for the five embedded metadata blobs. Everything decoded here is
//! built once during process initialization and treated as read-only
//! afterwards.

mod possible_lengths;

use std::collections::HashMap;

use base64::Engine;
use protobuf::Message;
use thiserror::Error;

use crate::prefix_map::{decode_unzip, PrefixMap, PrefixMapError};
use crate::proto_gen::phonemetadata::PhoneMetadataCollection;

use possible_lengths::derive_possible_lengths;

// The two protobuf collections are shipped gzip+base64 wrapped; the map
// blobs are gzip-wrapped binary in the interned varint-delta layout.
static NUMBER_METADATA: &str = include_str!("data/number_metadata.b64");
static SHORT_NUMBER_METADATA: &str = include_str!("data/short_number_metadata.b64");
static REGION_MAP: &[u8] = include_bytes!("data/region_map.gz");
static TIMEZONE_MAP: &[u8] = include_bytes!("data/timezone_map.gz");
static CARRIER_EN: &[u8] = include_bytes!("data/carrier/en.gz");
static CARRIER_PT: &[u8] = include_bytes!("data/carrier/pt.gz");
static GEOCODING_EN: &[u8] = include_bytes!("data/geocoding/en.gz");
static GEOCODING_DE: &[u8] = include_bytes!("data/geocoding/de.gz");

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("embedded blob is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("embedded blob failed to decompress: {0}")]
    Decompress(#[from] std::io::Error),

    #[error("embedded metadata failed to decode: {0}")]
    Proto(#[from] protobuf::Error),

    #[error("embedded metadata holds no descriptors")]
    EmptyMetadata,

    #[error("{0}")]
    PrefixMap(#[from] PrefixMapError),
}

fn decode_unzip_string(blob: &str) -> Result<Vec<u8>, DecodeError> {
    let compressed = base64::engine::general_purpose::STANDARD.decode(blob.trim())?;
    Ok(decode_unzip(&compressed)?)
}

fn load_collection(blob: &str) -> Result<PhoneMetadataCollection, DecodeError> {
    let raw = decode_unzip_string(blob)?;
    let mut collection = PhoneMetadataCollection::parse_from_bytes(&raw)?;
    if collection.metadata.is_empty() {
        return Err(DecodeError::EmptyMetadata);
    }
    // The build pipeline may strip possible lengths; restore them from the
    // patterns before anything reads the descriptors.
    for metadata in &mut collection.metadata {
        derive_possible_lengths(metadata);
    }
    Ok(collection)
}

/// The compiled-in number metadata.
pub(crate) fn load_number_metadata() -> Result<PhoneMetadataCollection, DecodeError> {
    load_collection(NUMBER_METADATA)
}

/// The compiled-in short-number metadata.
pub(crate) fn load_short_number_metadata() -> Result<PhoneMetadataCollection, DecodeError> {
    load_collection(SHORT_NUMBER_METADATA)
}

/// The country-calling-code → region-codes map. The first region listed for
/// a calling code is its primary region.
pub(crate) fn load_country_code_to_regions() -> Result<PrefixMap<Vec<String>>, DecodeError> {
    Ok(PrefixMap::decode(REGION_MAP)?)
}

/// The prefix → timezones map. Each value list is pre-sorted.
pub(crate) fn load_timezone_map() -> Result<PrefixMap<Vec<String>>, DecodeError> {
    Ok(PrefixMap::decode(TIMEZONE_MAP)?)
}

fn load_language_maps(
    blobs: &[(&'static str, &'static [u8])],
) -> Result<HashMap<&'static str, PrefixMap<String>>, DecodeError> {
    let mut maps = HashMap::with_capacity(blobs.len());
    for (language, blob) in blobs {
        maps.insert(*language, PrefixMap::decode(blob)?);
    }
    Ok(maps)
}

/// The per-language prefix → carrier-name maps.
pub(crate) fn load_carrier_maps() -> Result<HashMap<&'static str, PrefixMap<String>>, DecodeError> {
    load_language_maps(&[("en", CARRIER_EN), ("pt", CARRIER_PT)])
}

/// The per-language prefix → geographical-description maps.
pub(crate) fn load_geocoding_maps(
) -> Result<HashMap<&'static str, PrefixMap<String>>, DecodeError> {
    load_language_maps(&[("en", GEOCODING_EN), ("de", GEOCODING_DE)])
}
