use crate::article::ArticleRef;
use crate::error::ValidationError;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectionMethod {
    Category,
    Langlinks,
    File,
}

impl SelectionMethod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Langlinks => "langlinks",
            Self::File => "file",
        }
    }
}

impl FromStr for SelectionMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "category" => Ok(Self::Category),
            "langlinks" => Ok(Self::Langlinks),
            "file" => Ok(Self::File),
            other => Err(ValidationError::InvalidSelectionMethod(other.to_string())),
        }
    }
}

impl fmt::Display for SelectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//________________________________________________________________________________________________________________________

/// One unit of a selection. `article` is `None` if the lookup failed upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Case {
    pub label: String,
    pub article: Option<ArticleRef>,
}

/// Cases in selection order, unique by label.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaseList {
    cases: Vec<Case>,
    positions: HashMap<String, usize>,
}

impl CaseList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a case. An existing label keeps its position but takes the new article.
    pub fn insert(&mut self, label: &str, article: Option<ArticleRef>) {
        match self.positions.get(label) {
            Some(&pos) => self.cases[pos].article = article,
            None => {
                self.positions.insert(label.to_string(), self.cases.len());
                self.cases.push(Case {
                    label: label.to_string(),
                    article,
                });
            }
        }
    }

    pub fn get(&self, label: &str) -> Option<&Case> {
        self.positions.get(label).map(|&pos| &self.cases[pos])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Case> {
        self.cases.iter()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.cases.iter().map(|c| c.label.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

impl<'a> IntoIterator for &'a CaseList {
    type Item = &'a Case;
    type IntoIter = std::slice::Iter<'a, Case>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
