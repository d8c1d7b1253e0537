//! Shell-style splitting of build flag strings.
//!
//! Build flags are declared in the manifest as a single string, e.g.
//! `-tags extra,tags -ldflags="-s -w -X main.version=$VERSION"`, and must be
//! turned into the argument vector handed to the compiler.
//!
//! # Syntax
//!
//! - Words are separated by runs of unquoted whitespace.
//! - `'...'` is taken literally.
//! - `"..."` expands variables; `\"`, `\\`, `\$` and `` \` `` are escapes.
//! - Outside quotes, `\` escapes the next character and `\<newline>` joins lines.
//! - `$NAME` and `${NAME}` expand to the variable's value (empty when unset).
//! - `${NAME:-default}` uses `default` when the variable is unset or empty,
//!   `${NAME-default}` only when it is unset.
//!
//! Expanded values are inserted into the current word as-is; they are not
//! split again. A word that contained quotes or an expansion always yields a
//! token, even an empty one.
//!
//! # Example
//!
//! ```
//! use lambgo_lib::flags::expand;
//!
//! let lookup = |name: &str| (name == "VERSION").then(|| "1.2.3".to_string());
//! let flags = expand(r#"-tags lambda -ldflags="-X main.version=$VERSION""#, lookup).unwrap();
//! assert_eq!(flags, vec!["-tags", "lambda", "-ldflags=-X main.version=1.2.3"]);
//! ```

use std::iter::Peekable;
use std::str::CharIndices;

use thiserror::Error;

/// Errors produced while splitting a flag string.
///
/// Every variant carries the complete raw input so the message can point at
/// the manifest value that needs fixing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlagError {
  #[error("unterminated single quote in '{input}'")]
  UnterminatedSingleQuote { input: String },

  #[error("unterminated double quote in '{input}'")]
  UnterminatedDoubleQuote { input: String },

  #[error("trailing backslash in '{input}'")]
  TrailingEscape { input: String },

  #[error("unterminated variable reference at position {position} in '{input}'")]
  UnterminatedVariable { input: String, position: usize },

  #[error("bad substitution '{reference}' in '{input}'")]
  BadSubstitution { input: String, reference: String },
}

impl FlagError {
  /// The raw flag string that failed to parse.
  pub fn input(&self) -> &str {
    match self {
      FlagError::UnterminatedSingleQuote { input }
      | FlagError::UnterminatedDoubleQuote { input }
      | FlagError::TrailingEscape { input }
      | FlagError::UnterminatedVariable { input, .. }
      | FlagError::BadSubstitution { input, .. } => input,
    }
  }
}

type Chars<'a> = Peekable<CharIndices<'a>>;

/// Split `input` into words, resolving variables through `lookup`.
///
/// Variables for which `lookup` returns `None` are treated as unset and
/// expand to the empty string.
pub fn expand<F>(input: &str, lookup: F) -> Result<Vec<String>, FlagError>
where
  F: Fn(&str) -> Option<String>,
{
  let ctx = Context { input, lookup: &lookup };
  let mut chars = input.char_indices().peekable();

  let mut words = Vec::new();
  let mut word = String::new();
  let mut in_word = false;

  while let Some((pos, ch)) = chars.next() {
    match ch {
      c if is_blank(c) => {
        if in_word {
          words.push(std::mem::take(&mut word));
          in_word = false;
        }
      }
      '\\' => match chars.next() {
        // Line continuation
        Some((_, '\n')) => {}
        Some((_, escaped)) => {
          word.push(escaped);
          in_word = true;
        }
        None => return Err(FlagError::TrailingEscape { input: input.to_string() }),
      },
      '\'' => {
        in_word = true;
        loop {
          match chars.next() {
            Some((_, '\'')) => break,
            Some((_, c)) => word.push(c),
            None => return Err(FlagError::UnterminatedSingleQuote { input: input.to_string() }),
          }
        }
      }
      '"' => {
        in_word = true;
        ctx.double_quoted(&mut chars, &mut word)?;
      }
      '$' => {
        in_word = true;
        match ctx.variable(&mut chars, pos)? {
          Some(value) => word.push_str(&value),
          None => word.push('$'),
        }
      }
      c => {
        word.push(c);
        in_word = true;
      }
    }
  }

  if in_word {
    words.push(word);
  }

  Ok(words)
}

/// Split `input` using the process environment for variable lookups.
pub fn expand_env(input: &str) -> Result<Vec<String>, FlagError> {
  expand(input, |name| std::env::var(name).ok())
}

struct Context<'a, F> {
  input: &'a str,
  lookup: &'a F,
}

impl<F> Context<'_, F>
where
  F: Fn(&str) -> Option<String>,
{
  /// Consume a double-quoted span; the opening quote is already consumed.
  fn double_quoted(&self, chars: &mut Chars<'_>, word: &mut String) -> Result<(), FlagError> {
    loop {
      match chars.next() {
        Some((_, '"')) => return Ok(()),
        Some((_, '\\')) => match chars.peek() {
          Some(&(_, c @ ('"' | '\\' | '$' | '`'))) => {
            word.push(c);
            chars.next();
          }
          Some(&(_, '\n')) => {
            chars.next();
          }
          _ => word.push('\\'),
        },
        Some((pos, '$')) => match self.variable(chars, pos)? {
          Some(value) => word.push_str(&value),
          None => word.push('$'),
        },
        Some((_, c)) => word.push(c),
        None => {
          return Err(FlagError::UnterminatedDoubleQuote {
            input: self.input.to_string(),
          });
        }
      }
    }
  }

  /// Expand the variable reference following a `$` at `dollar`.
  ///
  /// Returns `None` when the `$` does not start a reference and should be
  /// kept literally.
  fn variable(&self, chars: &mut Chars<'_>, dollar: usize) -> Result<Option<String>, FlagError> {
    match chars.peek() {
      Some(&(_, '{')) => {
        chars.next();
        self.braced(chars, dollar).map(Some)
      }
      Some(&(_, c)) if is_name_start(c) => {
        let name = take_name(chars);
        Ok(Some(self.value(&name)))
      }
      _ => Ok(None),
    }
  }

  /// Expand `${...}`; the `${` is already consumed.
  fn braced(&self, chars: &mut Chars<'_>, dollar: usize) -> Result<String, FlagError> {
    let name = take_name(chars);

    match chars.next() {
      Some((_, '}')) if is_valid_name(&name) => Ok(self.value(&name)),
      Some((_, ':')) if is_valid_name(&name) && chars.peek().is_some_and(|&(_, c)| c == '-') => {
        chars.next();
        let default = self.default_text(chars, dollar)?;
        match (self.lookup)(&name) {
          Some(value) if !value.is_empty() => Ok(value),
          _ => self.expand_fragment(&default),
        }
      }
      Some((_, '-')) if is_valid_name(&name) => {
        let default = self.default_text(chars, dollar)?;
        match (self.lookup)(&name) {
          Some(value) => Ok(value),
          None => self.expand_fragment(&default),
        }
      }
      Some((_, c)) => {
        let mut reference = format!("${{{name}{c}");
        if c != '}' {
          let rest = self.default_text(chars, dollar)?;
          reference.push_str(&rest);
          reference.push('}');
        }
        Err(FlagError::BadSubstitution {
          input: self.input.to_string(),
          reference,
        })
      }
      None => Err(self.unterminated(dollar)),
    }
  }

  /// Collect the text up to the `}` closing the current reference, honoring nested `${...}`.
  fn default_text(&self, chars: &mut Chars<'_>, dollar: usize) -> Result<String, FlagError> {
    let mut text = String::new();
    let mut depth = 0usize;

    loop {
      match chars.next() {
        Some((_, '}')) if depth == 0 => return Ok(text),
        Some((_, '}')) => {
          depth -= 1;
          text.push('}');
        }
        Some((_, '$')) if chars.peek().is_some_and(|&(_, c)| c == '{') => {
          chars.next();
          depth += 1;
          text.push_str("${");
        }
        Some((_, c)) => text.push(c),
        None => return Err(self.unterminated(dollar)),
      }
    }
  }

  /// Expand variables inside a default value. Quotes and backslashes are literal here.
  fn expand_fragment(&self, text: &str) -> Result<String, FlagError> {
    let mut chars = text.char_indices().peekable();
    let mut out = String::new();

    while let Some((pos, ch)) = chars.next() {
      if ch == '$' {
        match self.variable(&mut chars, pos)? {
          Some(value) => out.push_str(&value),
          None => out.push('$'),
        }
      } else {
        out.push(ch);
      }
    }

    Ok(out)
  }

  fn value(&self, name: &str) -> String {
    (self.lookup)(name).unwrap_or_default()
  }

  fn unterminated(&self, position: usize) -> FlagError {
    FlagError::UnterminatedVariable {
      input: self.input.to_string(),
      position,
    }
  }
}

fn take_name(chars: &mut Chars<'_>) -> String {
  let mut name = String::new();
  while let Some(&(_, c)) = chars.peek() {
    if c.is_ascii_alphanumeric() || c == '_' {
      name.push(c);
      chars.next();
    } else {
      break;
    }
  }
  name
}

fn is_blank(c: char) -> bool {
  matches!(c, ' ' | '\t' | '\n' | '\r')
}

fn is_name_start(c: char) -> bool {
  c.is_ascii_alphabetic() || c == '_'
}

fn is_valid_name(name: &str) -> bool {
  name.chars().next().is_some_and(is_name_start)
}
