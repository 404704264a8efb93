use anyhow::{bail, Result};
use regex::Regex;

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

#[derive(Debug)]
struct Group {
    name: String,
    regex: Regex,
}

/// Product group configuration.
///
/// Products whose name matches a group's regular expression are reported
/// under the group's name instead of their own, so that, for example, every
/// edition of a product can be counted as one line.
#[derive(Debug, Default)]
pub struct Groups(Vec<Group>);

impl Groups {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads group configuration from `path`.
    ///
    /// The file has one group per line, in the format:
    ///
    /// ```txt
    /// GROUP_NAME | GROUP_REGEX
    /// ```
    ///
    /// Blank lines are ignored.
    ///
    /// # Errors
    ///
    /// Returns errors if:
    /// * The file cannot be opened or read
    /// * There is a line with an invalid format (no `|` character)
    /// * `GROUP_REGEX` is an invalid regular expression
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut groups = Self::new();
        let file = BufReader::new(File::open(&path)?);
        for line in file.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let Some((name, regex_str)) = line.split_once(" | ") else {
                bail!(
                    "reading {:?}: bad line format (missing |): {line}",
                    path.as_ref(),
                );
            };
            groups.add_group(name, regex_str)?;
        }
        Ok(groups)
    }

    /// Adds a group named `name` for products matching `regex_str`.
    ///
    /// # Errors
    ///
    /// Returns any errors from compiling `regex_str` with [`Regex::new`].
    pub fn add_group(&mut self, name: &str, regex_str: &str) -> Result<()> {
        self.0.push(Group {
            name: name.to_string(),
            regex: Regex::new(regex_str)?,
        });
        Ok(())
    }

    /// Returns the name of the first group matching `product`, if any.
    #[must_use]
    pub fn product_group(&self, product: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|g| g.regex.is_match(product))
            .map(|g| g.name.as_str())
    }

    /// Returns the name to report `product` under.
    #[must_use]
    pub fn display_name(&self, product: &str) -> String {
        self.product_group(product).unwrap_or(product).to_string()
    }
}
