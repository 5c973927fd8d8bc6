use crate::Marker;
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// Diagnostic carrying an optional context and the problem, each with its source position.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MarkedError {
    pub context: Option<String>,
    pub context_mark: Option<Marker>,
    pub problem: String,
    pub problem_mark: Option<Marker>,
}

impl MarkedError {
    pub fn new(
        context: Option<&str>,
        context_mark: Option<Marker>,
        problem: impl Into<String>,
        problem_mark: Option<Marker>,
    ) -> MarkedError {
        MarkedError {
            context: context.map(str::to_string),
            context_mark,
            problem: problem.into(),
            problem_mark,
        }
    }
}

impl Display for MarkedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some(context) = &self.context {
            writeln!(f, "{context}")?;
        }
        if let Some(context_mark) = self.context_mark {
            if self.problem_mark != Some(context_mark) {
                writeln!(f, " in {context_mark}:")?;
            }
        }
        f.write_str(&self.problem)?;
        if let Some(problem_mark) = self.problem_mark {
            write!(f, "\n in {problem_mark}:")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum YamlError {
    #[error("unacceptable code point '{character}' (0x{code:X}) special characters are not allowed\nin \"{name}\", position {position}")]
    Reader {
        name: String,
        position: usize,
        character: char,
        code: u32,
    },
    #[error("{0}")]
    Scanner(MarkedError),
    #[error("{0}")]
    Parser(MarkedError),
    #[error("{0}")]
    Composer(MarkedError),
    #[error("{0}")]
    Constructor(MarkedError),
    #[error("{0}")]
    DuplicateKey(MarkedError),
    #[error("Number of aliases for non-scalar nodes exceeds the specified max={0}")]
    AliasLimit(usize),
    #[error("{0}")]
    Representer(String),
    #[error("{0}")]
    Serializer(String),
    #[error("{0}")]
    Emitter(String),
    #[error("{0}")]
    Config(String),
    #[error("failed to write YAML output")]
    Fmt(#[from] std::fmt::Error),
}

impl YamlError {
    /// Scanner error without context, only the problem and where it happened.
    pub fn new_str(marker: Marker, info: &str) -> Self {
        YamlError::Scanner(MarkedError::new(None, None, info, Some(marker)))
    }

    pub fn scanner(
        context: &str,
        context_mark: Marker,
        problem: impl Into<String>,
        problem_mark: Marker,
    ) -> Self {
        YamlError::Scanner(MarkedError::new(
            Some(context),
            Some(context_mark),
            problem,
            Some(problem_mark),
        ))
    }

    pub fn parser(
        context: Option<&str>,
        context_mark: Option<Marker>,
        problem: impl Into<String>,
        problem_mark: Option<Marker>,
    ) -> Self {
        YamlError::Parser(MarkedError::new(
            context,
            context_mark,
            problem,
            problem_mark,
        ))
    }

    pub fn composer(
        context: Option<&str>,
        context_mark: Option<Marker>,
        problem: impl Into<String>,
        problem_mark: Option<Marker>,
    ) -> Self {
        YamlError::Composer(MarkedError::new(
            context,
            context_mark,
            problem,
            problem_mark,
        ))
    }

    pub fn constructor(
        context: Option<&str>,
        context_mark: Option<Marker>,
        problem: impl Into<String>,
        problem_mark: Option<Marker>,
    ) -> Self {
        YamlError::Constructor(MarkedError::new(
            context,
            context_mark,
            problem,
            problem_mark,
        ))
    }

    /// The marked diagnostic behind this error, if the failing stage had source positions.
    #[must_use]
    pub fn marked(&self) -> Option<&MarkedError> {
        match self {
            YamlError::Scanner(x)
            | YamlError::Parser(x)
            | YamlError::Composer(x)
            | YamlError::Constructor(x)
            | YamlError::DuplicateKey(x) => Some(x),
            _ => None,
        }
    }

    /// Short description of what went wrong, without positions.
    #[must_use]
    pub fn problem(&self) -> String {
        match self.marked() {
            Some(marked) => marked.problem.clone(),
            None => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marked_display() {
        let err = YamlError::scanner(
            "while scanning a simple key",
            Marker::new(0, 0, 1),
            "could not find expected ':'",
            Marker::new(8, 1, 0),
        );
        assert_eq!(
            err.to_string(),
            "while scanning a simple key\n in line 1, column 2:\ncould not find expected ':'\n in line 2, column 1:"
        );
        assert_eq!(err.problem(), "could not find expected ':'");
    }

    #[test]
    fn reader_display() {
        let err = YamlError::Reader {
            name: "<string>".into(),
            position: 3,
            character: '\u{1}',
            code: 1,
        };
        assert!(err.to_string().contains("(0x1) special characters are not allowed"));
        assert!(err.marked().is_none());
    }
}
