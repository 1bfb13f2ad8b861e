//! Pure checks run before any parameter is touched.

use indexmap::IndexMap;
use regex::Regex;
use serde::{
  Deserialize,
  Deserializer,
};

use crate::{
  error::{
    QueryError,
    Result,
  },
  value::{
    ParamMap,
    QueryUpdate,
  },
};

/// Constraints for a single parameter.
///
/// Checks are evaluated in field order (`required`, `pattern`, `min_length`,
/// `max_length`, `enum`) and the first violation wins.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationRule {
  pub required:   bool,
  #[serde(deserialize_with = "deserialize_pattern")]
  pub pattern:    Option<Regex>,
  /// Minimum length in Unicode scalar values (`char`s), not UTF-16 units.
  pub min_length: Option<usize>,
  /// Maximum length in Unicode scalar values (`char`s), not UTF-16 units.
  pub max_length: Option<usize>,
  #[serde(rename = "enum")]
  pub one_of:     Option<Vec<String>>,
}

impl ValidationRule {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn required(mut self) -> Self {
    self.required = true;
    self
  }

  pub fn pattern(mut self, pattern: Regex) -> Self {
    self.pattern = Some(pattern);
    self
  }

  pub fn min_length(mut self, min: usize) -> Self {
    self.min_length = Some(min);
    self
  }

  pub fn max_length(mut self, max: usize) -> Self {
    self.max_length = Some(max);
    self
  }

  pub fn one_of<I, S>(mut self, allowed: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.one_of = Some(allowed.into_iter().map(Into::into).collect());
    self
  }

  fn check(&self, key: &str, value: Option<&str>) -> Result<()> {
    let Some(value) = value else {
      if self.required {
        return Err(QueryError::MissingRequired { key: key.to_owned() });
      }
      return Ok(());
    };

    // Empty values are present but carry nothing to check.
    if value.is_empty() {
      return Ok(());
    }

    if let Some(pattern) = &self.pattern
      && !pattern.is_match(value)
    {
      return Err(QueryError::PatternMismatch { key: key.to_owned() });
    }

    let len = value.chars().count();
    if let Some(min) = self.min_length
      && len < min
    {
      return Err(QueryError::TooShort {
        key: key.to_owned(),
        min,
      });
    }
    if let Some(max) = self.max_length
      && len > max
    {
      return Err(QueryError::TooLong {
        key: key.to_owned(),
        max,
      });
    }

    if let Some(allowed) = &self.one_of
      && !allowed.iter().any(|candidate| candidate == value)
    {
      return Err(QueryError::NotInEnum {
        key:     key.to_owned(),
        allowed: allowed.clone(),
      });
    }

    Ok(())
  }
}

/// Rules keyed by parameter name, checked in insertion order.
pub type ValidationRules = IndexMap<String, ValidationRule>;

/// Reject updates whose key is empty.
pub fn validate_input(update: &QueryUpdate) -> Result<()> {
  if update.key.is_empty() {
    return Err(QueryError::InvalidKey);
  }
  Ok(())
}

/// Check `params` against every rule. Rules for absent, optional keys are
/// skipped.
pub fn validate_params(params: &ParamMap, rules: &ValidationRules) -> Result<()> {
  rules
    .iter()
    .try_for_each(|(key, rule)| rule.check(key, params.get(key).map(String::as_str)))
}

fn deserialize_pattern<'de, D>(deserializer: D) -> std::result::Result<Option<Regex>, D::Error>
where
  D: Deserializer<'de>,
{
  Option::<String>::deserialize(deserializer)?
    .map(|source| Regex::new(&source).map_err(serde::de::Error::custom))
    .transpose()
}
