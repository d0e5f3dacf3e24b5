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

use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;

#[derive(Debug, PartialEq, Error)]
#[error("An error occurred while trying to create regex: {0}")]
pub struct InvalidRegexError(#[from] regex::Error);

/// Process-wide mapping from pattern string to compiled regular expression.
/// Lookups are lock-free reads; a miss compiles the pattern once and the
/// entry is never evicted.
pub struct RegexCache {
    cache: DashMap<String, Arc<regex::Regex>>,
}

impl RegexCache {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cache: DashMap::with_capacity(capacity),
        }
    }

    pub fn get_regex(&self, pattern: &str) -> Result<Arc<regex::Regex>, InvalidRegexError> {
        if let Some(regex) = self.cache.get(pattern) {
            Ok(regex.value().clone())
        } else {
            let entry = self.cache.entry(pattern.to_string()).or_try_insert_with(|| {
                regex::Regex::new(pattern).map(Arc::new)
            })?;
            Ok(entry.value().clone())
        }
    }

    /// Fetches the pattern wrapped as `^(?:pattern)$` for full-match
    /// comparisons. The metadata patterns assume Java `matches()` semantics;
    /// unanchored leftmost-first matching would otherwise accept partial
    /// matches for alternations such as `12|123`.
    pub fn get_full_match_regex(
        &self,
        pattern: &str,
    ) -> Result<Arc<regex::Regex>, InvalidRegexError> {
        self.get_regex(&format!("^(?:{pattern})$"))
    }

    /// Fetches the pattern anchored at the start only, i.e. Java `lookingAt()`.
    pub fn get_prefix_match_regex(
        &self,
        pattern: &str,
    ) -> Result<Arc<regex::Regex>, InvalidRegexError> {
        self.get_regex(&format!("^(?:{pattern})"))
    }
}
