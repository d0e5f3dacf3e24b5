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

use std::collections::HashMap;
use std::io::Read;

use flate2::read::GzDecoder;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrefixMapError {
    #[error("failed to decompress blob: {0}")]
    Decompress(#[from] std::io::Error),

    #[error("blob is truncated")]
    Truncated,

    #[error("interned values are not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("interned value index {0} is out of range")]
    BadInternIndex(usize),
}

pub(crate) fn decode_unzip(data: &[u8]) -> Result<Vec<u8>, std::io::Error> {
    let mut decoder = GzDecoder::new(data);
    let mut raw = Vec::new();
    decoder.read_to_end(&mut raw)?;
    Ok(raw)
}

/// Byte-wise reader over a decoded blob. The on-disk layout is
/// little-endian with unsigned LEB128 prefix deltas.
pub(crate) struct BlobReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BlobReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], PrefixMapError> {
        let end = self.pos.checked_add(len).ok_or(PrefixMapError::Truncated)?;
        let slice = self.data.get(self.pos..end).ok_or(PrefixMapError::Truncated)?;
        self.pos = end;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8, PrefixMapError> {
        Ok(self.read_bytes(1)?[0])
    }

    fn read_u16(&mut self) -> Result<u16, PrefixMapError> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn read_u32(&mut self) -> Result<u32, PrefixMapError> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_uvarint(&mut self) -> Result<u64, PrefixMapError> {
        let mut value = 0u64;
        let mut shift = 0u32;
        loop {
            let byte = self.read_u8()?;
            value |= u64::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
            if shift >= 64 {
                return Err(PrefixMapError::Truncated);
            }
        }
    }
}

/// The shape of a single mapping value: one interned string for the carrier
/// and geocoding maps, a list of interned strings for the timezone and
/// country-code maps. Values the table interned as empty are skipped.
pub(crate) trait PrefixMapValue: Sized {
    fn read(reader: &mut BlobReader<'_>, values: &[&str]) -> Result<Option<Self>, PrefixMapError>;
}

fn interned<'a>(reader: &mut BlobReader<'_>, values: &'a [&str]) -> Result<&'a str, PrefixMapError> {
    let index = reader.read_u16()? as usize;
    values
        .get(index)
        .copied()
        .ok_or(PrefixMapError::BadInternIndex(index))
}

impl PrefixMapValue for String {
    fn read(reader: &mut BlobReader<'_>, values: &[&str]) -> Result<Option<Self>, PrefixMapError> {
        let value = interned(reader, values)?;
        if value.is_empty() {
            return Ok(None);
        }
        Ok(Some(value.to_owned()))
    }
}

impl PrefixMapValue for Vec<String> {
    fn read(reader: &mut BlobReader<'_>, values: &[&str]) -> Result<Option<Self>, PrefixMapError> {
        let count = reader.read_u8()? as usize;
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            let value = interned(reader, values)?;
            if !value.is_empty() {
                out.push(value.to_owned());
            }
        }
        if out.is_empty() {
            return Ok(None);
        }
        Ok(Some(out))
    }
}

/// An immutable mapping from an integer phone-number prefix to a value,
/// decoded from a gzipped interned-value blob. `max_prefix_length` is the
/// digit count of the longest prefix present, recorded for early lookup
/// cut-off.
pub(crate) struct PrefixMap<V> {
    map: HashMap<u64, V>,
    max_prefix_length: usize,
}

impl<V: PrefixMapValue> PrefixMap<V> {
    pub fn decode(blob: &[u8]) -> Result<Self, PrefixMapError> {
        let raw = decode_unzip(blob)?;
        let mut reader = BlobReader::new(&raw);

        let value_size = reader.read_u32()? as usize;
        let value_bytes = reader.read_bytes(value_size)?;
        let values: Vec<&str> = std::str::from_utf8(value_bytes)?.split('\n').collect();

        let mapping_count = reader.read_u32()?;
        let mut map = HashMap::with_capacity(mapping_count as usize);
        let mut max_prefix_length = 0;
        // Prefixes are stored sorted ascending as non-negative deltas.
        let mut prefix = 0u64;
        for _ in 0..mapping_count {
            prefix += reader.read_uvarint()?;
            if let Some(value) = V::read(&mut reader, &values)? {
                max_prefix_length = max_prefix_length.max(digit_count(prefix));
                map.insert(prefix, value);
            }
        }

        Ok(Self { map, max_prefix_length })
    }
}

impl<V> PrefixMap<V> {
    pub fn max_prefix_length(&self) -> usize {
        self.max_prefix_length
    }

    pub fn iter(&self) -> impl Iterator<Item = (&u64, &V)> {
        self.map.iter()
    }

    pub fn get(&self, prefix: u64) -> Option<&V> {
        self.map.get(&prefix)
    }

    /// Returns the value for the longest prefix of `digits` present in the
    /// map, together with the matched prefix. `digits` must contain ASCII
    /// digits only.
    pub fn lookup_longest_prefix(&self, digits: &str) -> Option<(u64, &V)> {
        let end = self.max_prefix_length.min(digits.len());
        for len in (1..=end).rev() {
            let Ok(prefix) = digits[..len].parse::<u64>() else {
                continue;
            };
            if let Some(value) = self.map.get(&prefix) {
                return Some((prefix, value));
            }
        }
        None
    }
}

fn digit_count(mut n: u64) -> usize {
    if n == 0 {
        return 1;
    }
    let mut count = 0;
    while n > 0 {
        count += 1;
        n /= 10;
    }
    count
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::{write::GzEncoder, Compression};

    use super::*;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn uvarint(mut n: u64) -> Vec<u8> {
        let mut out = Vec::new();
        loop {
            let byte = (n & 0x7F) as u8;
            n >>= 7;
            if n == 0 {
                out.push(byte);
                return out;
            }
            out.push(byte | 0x80);
        }
    }

    fn single_value_blob(entries: &[(u64, &str)], values: &[&str]) -> Vec<u8> {
        let joined = values.join("\n");
        let mut raw = Vec::new();
        raw.extend_from_slice(&(joined.len() as u32).to_le_bytes());
        raw.extend_from_slice(joined.as_bytes());
        raw.extend_from_slice(&(entries.len() as u32).to_le_bytes());
        let mut last = 0;
        for (prefix, value) in entries {
            raw.extend_from_slice(&uvarint(prefix - last));
            let index = values.iter().position(|v| v == value).unwrap() as u16;
            raw.extend_from_slice(&index.to_le_bytes());
            last = *prefix;
        }
        gzip(&raw)
    }

    #[test]
    fn decodes_delta_encoded_prefixes() {
        let blob = single_value_blob(
            &[(1202, "Foo"), (1206, "Bar"), (4420, "Baz")],
            &["Bar", "Baz", "Foo"],
        );
        let map: PrefixMap<String> = PrefixMap::decode(&blob).unwrap();
        assert_eq!(map.max_prefix_length(), 4);
        assert_eq!(map.get(1202), Some(&"Foo".to_string()));
        assert_eq!(map.get(4420), Some(&"Baz".to_string()));
        assert_eq!(map.get(1443), None);
    }

    #[test]
    fn longest_prefix_wins() {
        let blob = single_value_blob(&[(1, "US"), (1206, "Seattle")], &["Seattle", "US"]);
        let map: PrefixMap<String> = PrefixMap::decode(&blob).unwrap();
        assert_eq!(
            map.lookup_longest_prefix("12065550100"),
            Some((1206, &"Seattle".to_string()))
        );
        assert_eq!(
            map.lookup_longest_prefix("14435550100"),
            Some((1, &"US".to_string()))
        );
        assert_eq!(map.lookup_longest_prefix("0000000"), None);
    }

    #[test]
    fn empty_interned_values_are_skipped() {
        let blob = single_value_blob(&[(44, ""), (4420, "London")], &["", "London"]);
        let map: PrefixMap<String> = PrefixMap::decode(&blob).unwrap();
        assert_eq!(map.get(44), None);
        assert_eq!(map.get(4420), Some(&"London".to_string()));
    }

    #[test]
    fn truncated_blob_is_an_error() {
        let blob = single_value_blob(&[(44, "GB")], &["GB"]);
        let raw = decode_unzip(&blob).unwrap();
        let cut = gzip(&raw[..raw.len() - 1]);
        assert!(PrefixMap::<String>::decode(&cut).is_err());
    }
}
