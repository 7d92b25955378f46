//! Template expansion: fills the `{1}`, `{2}`, `{3}` slots of a scheme

use crate::error::{MizanError, Result};
use regex_lite::Regex;
use std::sync::OnceLock;

fn slot_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{(\d+)\}").expect("slot pattern is valid"))
}

/// Split a root into its three letters.
pub fn split_root(root: &str) -> Result<[char; 3]> {
    let letters: Vec<char> = root.chars().collect();
    letters
        .try_into()
        .map_err(|_| MizanError::RootLength(root.to_string()))
}

fn slot_position(token: &str, template: &str) -> Result<usize> {
    match token.parse::<usize>() {
        Ok(pos @ 1..=3) => Ok(pos),
        _ => Err(MizanError::MalformedTemplate(format!(
            "slot {{{token}}} out of range 1..3 in \"{template}\""
        ))),
    }
}

/// Substitute root letters into `template`. Text outside `{k}` tokens is
/// copied verbatim.
pub fn expand(letters: &[char], template: &str) -> Result<String> {
    if letters.len() != 3 {
        return Err(MizanError::RootLength(letters.iter().collect()));
    }

    let mut word = String::with_capacity(template.len());
    let mut last = 0;
    for caps in slot_pattern().captures_iter(template) {
        let (Some(whole), Some(digits)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let pos = slot_position(digits.as_str(), template)?;
        word.push_str(&template[last..whole.start()]);
        word.push(letters[pos - 1]);
        last = whole.end();
    }
    word.push_str(&template[last..]);

    Ok(word)
}

/// Check that every slot in `template` names a radical position.
pub fn validate(template: &str) -> Result<()> {
    if template.trim().is_empty() {
        return Err(MizanError::MalformedTemplate("empty template".to_string()));
    }
    for caps in slot_pattern().captures_iter(template) {
        if let Some(digits) = caps.get(1) {
            slot_position(digits.as_str(), template)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const KTB: [char; 3] = ['ك', 'ت', 'ب'];

    #[test]
    fn test_active_participle() {
        assert_eq!(expand(&KTB, "{1}ا{2}{3}").unwrap(), "كاتب");
    }

    #[test]
    fn test_passive_participle() {
        assert_eq!(expand(&KTB, "م{1}{2}و{3}").unwrap(), "مكتوب");
    }

    #[test]
    fn test_repeated_and_reordered_slots() {
        assert_eq!(expand(&KTB, "{3}{2}{1}{1}").unwrap(), "بتكك");
        assert_eq!(expand(&KTB, "است{1}{2}{3}").unwrap(), "استكتب");
    }

    #[test]
    fn test_non_slot_braces_are_literal() {
        assert_eq!(expand(&KTB, "{x}{1}").unwrap(), "{x}ك");
    }

    #[test]
    fn test_out_of_range_slot() {
        assert!(matches!(
            expand(&KTB, "{1}{4}"),
            Err(MizanError::MalformedTemplate(_))
        ));
        assert!(matches!(
            expand(&KTB, "{0}"),
            Err(MizanError::MalformedTemplate(_))
        ));
        assert!(matches!(
            expand(&KTB, "{99999999999999999999999}"),
            Err(MizanError::MalformedTemplate(_))
        ));
    }

    #[test]
    fn test_wrong_root_length() {
        assert!(matches!(
            expand(&['ك', 'ت'], "{1}{2}"),
            Err(MizanError::RootLength(_))
        ));
        assert!(matches!(split_root("كتاب"), Err(MizanError::RootLength(_))));
        assert_eq!(split_root("كتب").unwrap(), KTB);
    }

    #[test]
    fn test_validate() {
        assert!(validate("م{1}{2}و{3}").is_ok());
        assert!(validate("{1}{2}{5}").is_err());
        assert!(validate("  ").is_err());
    }
}
