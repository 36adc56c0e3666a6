//! Command template formatting for fe.
//!
//! Action strings from the keybind tables are small templates:
//! - `%(name)v` is replaced with the value of `name` from the formatting data. Any ASCII letter
//!   works as the verb `v`, all of them substitute the plain string value.
//! - `%%` is a literal `%`.
//! - `#tag` (a `#` followed by lowercase letters or underscores) names a builtin action. Tags are
//!   collected in left-to-right order and removed from the text before substitution.
//!
//! The tag-free text is also split into command words on whitespace written in the template.
//! A substituted value never splits, so a name like `my file.txt` stays one argument.
//!
//! See [named_format] for the entry point and [FormatError] for what can go wrong.

use std::collections::HashMap;
use std::fmt;

/// Data key holding the current working directory.
pub const WORKING_DIR: &str = "working_dir";
/// Data key holding the name of the selected entry.
pub const SELECTED_DIR: &str = "selected_dir";
/// Every key the session provides to templates.
pub const DATA_KEYS: &[&str] = &[WORKING_DIR, SELECTED_DIR];

/// Result of formatting an action string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formatted {
    /// Substituted text with every tag removed. Surrounding whitespace is preserved.
    pub text: String,
    /// Command words: program first, then its arguments. Empty for a tags-only action.
    pub args: Vec<String>,
    /// Builtin tags in the order they appeared in the template.
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// `%(` without a closing parenthesis.
    UnterminatedPlaceholder { offset: usize },
    /// Placeholder name empty or not made of letters, digits and underscores.
    InvalidName { offset: usize, name: String },
    /// `%(name)` not followed by a verb letter.
    MissingVerb { offset: usize, name: String },
    /// Placeholder refers to a key the data does not provide.
    MissingKey(String),
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::UnterminatedPlaceholder { offset } => {
                write!(f, "unterminated placeholder at byte {offset}")
            }
            FormatError::InvalidName { offset, name } => {
                write!(f, "invalid placeholder name `{name}` at byte {offset}")
            }
            FormatError::MissingVerb { offset, name } => {
                write!(f, "placeholder `%({name})` at byte {offset} has no verb")
            }
            FormatError::MissingKey(name) => write!(f, "no value for placeholder `{name}`"),
        }
    }
}

impl std::error::Error for FormatError {}

#[inline]
fn is_tag_char(c: char) -> bool {
    c.is_ascii_lowercase() || c == '_'
}

#[inline]
fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Splits `template` into its tag-free text and the tags it contains.
pub fn extract_tags(template: &str) -> (String, Vec<String>) {
    let mut text = String::with_capacity(template.len());
    let mut tags = Vec::new();
    let mut rest = template;

    while let Some(pos) = rest.find('#') {
        text.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let len = after.find(|c: char| !is_tag_char(c)).unwrap_or(after.len());
        if len == 0 {
            text.push('#');
        } else {
            tags.push(after[..len].to_string());
        }
        rest = &after[len..];
    }
    text.push_str(rest);
    (text, tags)
}

/// One parsed piece of tag-free template text.
enum Piece<'t> {
    Literal(&'t str),
    Percent,
    Placeholder(&'t str),
}

fn parse(text: &str) -> Result<Vec<Piece<'_>>, FormatError> {
    let mut pieces = Vec::new();
    let mut literal_start = 0;
    let mut idx = 0;
    let bytes = text.as_bytes();

    while idx < bytes.len() {
        if bytes[idx] != b'%' {
            idx += 1;
            continue;
        }
        match bytes.get(idx + 1) {
            Some(b'%') => {
                pieces.push(Piece::Literal(&text[literal_start..idx]));
                pieces.push(Piece::Percent);
                idx += 2;
                literal_start = idx;
            }
            Some(b'(') => {
                pieces.push(Piece::Literal(&text[literal_start..idx]));
                let name_start = idx + 2;
                let close = text[name_start..]
                    .find(')')
                    .map(|p| name_start + p)
                    .ok_or(FormatError::UnterminatedPlaceholder { offset: idx })?;
                let name = &text[name_start..close];
                if name.is_empty() || !name.chars().all(is_name_char) {
                    return Err(FormatError::InvalidName {
                        offset: idx,
                        name: name.to_string(),
                    });
                }
                match text[close + 1..].chars().next() {
                    Some(verb) if verb.is_ascii_alphabetic() || verb == '%' => {
                        pieces.push(Piece::Placeholder(name));
                        idx = close + 1 + verb.len_utf8();
                        literal_start = idx;
                    }
                    _ => {
                        return Err(FormatError::MissingVerb {
                            offset: idx,
                            name: name.to_string(),
                        });
                    }
                }
            }
            // a lone `%` stays literal
            _ => idx += 1,
        }
    }
    pieces.push(Piece::Literal(&text[literal_start..]));
    Ok(pieces)
}

/// Names referenced by placeholders in `template`, in order, tags excluded.
///
/// Used to check keybind actions when the configuration is loaded.
pub fn placeholders(template: &str) -> Result<Vec<String>, FormatError> {
    let (text, _) = extract_tags(template);
    Ok(parse(&text)?
        .into_iter()
        .filter_map(|piece| match piece {
            Piece::Placeholder(name) => Some(name.to_string()),
            _ => None,
        })
        .collect())
}

/// Formats `template` against `data`.
///
/// # Example
/// `named_format("go to %(selected_dir)s", {"selected_dir": "docs"})` yields the text
/// `"go to docs"` and no tags, `named_format("#quit echo hi", {})` yields `" echo hi"` and the
/// tag `quit`.
pub fn named_format(
    template: &str,
    data: &HashMap<&str, String>,
) -> Result<Formatted, FormatError> {
    let (text, tags) = extract_tags(template);
    let mut out = String::with_capacity(text.len());
    let mut args = Vec::new();
    let mut word: Option<String> = None;

    for piece in parse(&text)? {
        match piece {
            Piece::Literal(s) => {
                out.push_str(s);
                for c in s.chars() {
                    if c.is_whitespace() {
                        args.extend(word.take());
                    } else {
                        word.get_or_insert_with(String::new).push(c);
                    }
                }
            }
            Piece::Percent => {
                out.push('%');
                word.get_or_insert_with(String::new).push('%');
            }
            Piece::Placeholder(name) => {
                let value = data
                    .get(name)
                    .ok_or_else(|| FormatError::MissingKey(name.to_string()))?;
                out.push_str(value);
                word.get_or_insert_with(String::new).push_str(value);
            }
        }
    }
    args.extend(word);

    Ok(Formatted {
        text: out,
        args,
        tags,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(pairs: &[(&'static str, &str)]) -> HashMap<&'static str, String> {
        pairs.iter().map(|(k, v)| (*k, v.to_string())).collect()
    }

    #[test]
    fn substitutes_named_placeholder() -> Result<(), FormatError> {
        let out = named_format(
            "go to %(selected_dir)s",
            &data(&[(SELECTED_DIR, "docs")]),
        )?;
        assert_eq!(out.text, "go to docs");
        assert!(out.tags.is_empty());
        Ok(())
    }

    #[test]
    fn strips_tags_and_keeps_order() -> Result<(), FormatError> {
        let out = named_format("#quit echo hi", &HashMap::new())?;
        assert_eq!(out.text, " echo hi");
        assert_eq!(out.tags, vec!["quit"]);

        let out = named_format("#select_down touch x #dir_forwards#quit", &HashMap::new())?;
        assert_eq!(out.text, " touch x ");
        assert_eq!(out.tags, vec!["select_down", "dir_forwards", "quit"]);
        Ok(())
    }

    #[test]
    fn literal_percent_and_lone_hash() -> Result<(), FormatError> {
        let out = named_format("printf 100%% # done 5%", &HashMap::new())?;
        assert_eq!(out.text, "printf 100% # done 5%");
        assert!(out.tags.is_empty());
        Ok(())
    }

    #[test]
    fn any_verb_letter_substitutes_the_string() -> Result<(), FormatError> {
        let d = data(&[(WORKING_DIR, "/tmp"), (SELECTED_DIR, "a b")]);
        let out = named_format("cp %(selected_dir)q %(working_dir)v/", &d)?;
        assert_eq!(out.text, "cp a b /tmp/");
        Ok(())
    }

    #[test]
    fn substituted_values_stay_one_word() -> Result<(), FormatError> {
        let d = data(&[(WORKING_DIR, "/tmp/my dir"), (SELECTED_DIR, "my file.txt")]);

        let out = named_format("ls  -l %(selected_dir)s", &d)?;
        assert_eq!(out.args, vec!["ls", "-l", "my file.txt"]);

        let out = named_format("cp %(selected_dir)s %(working_dir)s/old #select_up", &d)?;
        assert_eq!(out.args, vec!["cp", "my file.txt", "/tmp/my dir/old"]);
        assert_eq!(out.tags, vec!["select_up"]);

        let out = named_format("printf 100%%", &d)?;
        assert_eq!(out.args, vec!["printf", "100%"]);
        Ok(())
    }

    #[test]
    fn tags_only_action_has_no_words() -> Result<(), FormatError> {
        let out = named_format(" #select_down #quit ", &HashMap::new())?;
        assert!(out.args.is_empty());
        assert_eq!(out.tags, vec!["select_down", "quit"]);
        Ok(())
    }

    #[test]
    fn uppercase_after_hash_is_not_a_tag() -> Result<(), FormatError> {
        let out = named_format("echo #Quit", &HashMap::new())?;
        assert_eq!(out.text, "echo #Quit");
        assert!(out.tags.is_empty());
        Ok(())
    }

    #[test]
    fn missing_key_is_an_error() {
        let err = named_format("open %(nope)s", &HashMap::new()).unwrap_err();
        assert_eq!(err, FormatError::MissingKey("nope".into()));
    }

    #[test]
    fn malformed_placeholders_are_errors() {
        assert!(matches!(
            named_format("open %(selected_dir", &HashMap::new()),
            Err(FormatError::UnterminatedPlaceholder { offset: 5 })
        ));
        assert!(matches!(
            named_format("open %()s", &HashMap::new()),
            Err(FormatError::InvalidName { .. })
        ));
        assert!(matches!(
            named_format("open %(bad name)s", &HashMap::new()),
            Err(FormatError::InvalidName { .. })
        ));
        assert!(matches!(
            named_format("open %(selected_dir)", &HashMap::new()),
            Err(FormatError::MissingVerb { .. })
        ));
    }

    #[test]
    fn placeholders_lists_names() -> Result<(), FormatError> {
        let names = placeholders("mv %(selected_dir)s %(working_dir)s/old #select_up")?;
        assert_eq!(names, vec![SELECTED_DIR, WORKING_DIR]);
        assert!(placeholders("#quit")?.is_empty());
        Ok(())
    }
}
