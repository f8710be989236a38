use crate::errors::Error;
use std::fmt;
use std::str::FromStr;

/// URL-safe identifier derived from a trick name. Lowercase ASCII letters,
/// digits and single dashes only.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Slug(String);

impl Slug {
    /// Derive a slug from a trick `name`. Runs of non-alphanumeric characters
    /// collapse into a single dash.
    pub fn new(name: &str) -> Result<Self, Error> {
        let mut slug = String::with_capacity(name.len());

        for char in name.chars() {
            if char.is_ascii_alphanumeric() {
                slug.push(char.to_ascii_lowercase());
            } else if !slug.is_empty() && !slug.ends_with('-') {
                slug.push('-');
            }
        }

        let slug = slug.trim_end_matches('-');

        if slug.is_empty() {
            return Err(Error::EmptyName);
        }

        Ok(Self(slug.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Slug {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.is_empty() {
            return Err(Error::EmptyName);
        }

        if !value
            .chars()
            .all(|char| char.is_ascii_lowercase() || char.is_ascii_digit() || char == '-')
        {
            return Err(Error::IllegalCharacters);
        }

        Ok(Self(value.to_string()))
    }
}
