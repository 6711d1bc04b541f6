//! INI document parsing.

use crate::{ConfigError, Section};

/// Parse a full config document into sections.
///
/// Lines are `[section]`, `[section "subsection"]`, `key = value`, blank,
/// or comments starting with `#` or `;`.
pub fn parse_document(text: &str) -> Result<Vec<Section>, ConfigError> {
    let mut sections: Vec<Section> = Vec::new();

    for (lineno, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(header) = line.strip_prefix('[') {
            let header = header.strip_suffix(']').ok_or_else(|| ConfigError::Parse {
                line: lineno + 1,
                reason: "unterminated section header".into(),
            })?;
            sections.push(parse_section_header(header, lineno + 1)?);
            continue;
        }

        let (key, value) = line.split_once('=').ok_or_else(|| ConfigError::Parse {
            line: lineno + 1,
            reason: "expected 'key = value'".into(),
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(ConfigError::Parse {
                line: lineno + 1,
                reason: "empty key".into(),
            });
        }

        let section = sections.last_mut().ok_or_else(|| ConfigError::Parse {
            line: lineno + 1,
            reason: "entry before any section header".into(),
        })?;
        section
            .entries
            .push((key.to_string(), value.trim().to_string()));
    }

    Ok(sections)
}

fn parse_section_header(header: &str, line: usize) -> Result<Section, ConfigError> {
    let header = header.trim();

    if let Some((name, rest)) = header.split_once(' ') {
        let sub = rest.trim();
        let sub = sub
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .ok_or_else(|| ConfigError::Parse {
                line,
                reason: "subsection must be double-quoted".into(),
            })?;
        Ok(Section {
            name: name.to_string(),
            subsection: Some(sub.to_string()),
            entries: Vec::new(),
        })
    } else {
        if header.is_empty() {
            return Err(ConfigError::Parse {
                line,
                reason: "empty section name".into(),
            });
        }
        Ok(Section {
            name: header.to_string(),
            subsection: None,
            entries: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sections_and_entries() {
        let text = "# comment\n[user]\n\tname = Jane Doe\n\temail = j@d.com\n\n[remote \"origin\"]\n\turl = localhost:9418/p\n";
        let sections = parse_document(text).unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].name, "user");
        assert_eq!(sections[0].entries[0], ("name".into(), "Jane Doe".into()));
        assert_eq!(sections[1].subsection.as_deref(), Some("origin"));
    }

    #[test]
    fn value_keeps_inner_spaces() {
        let sections = parse_document("[user]\nname = Jane  Q.  Doe\n").unwrap();
        assert_eq!(sections[0].entries[0].1, "Jane  Q.  Doe");
    }

    #[test]
    fn entry_before_section_fails() {
        assert!(matches!(
            parse_document("key = value\n"),
            Err(ConfigError::Parse { line: 1, .. })
        ));
    }

    #[test]
    fn unterminated_header_fails() {
        assert!(parse_document("[user\n").is_err());
    }

    #[test]
    fn unquoted_subsection_fails() {
        assert!(parse_document("[remote origin]\n").is_err());
    }

    #[test]
    fn semicolon_comments_skipped() {
        let sections = parse_document("; note\n[a]\nk = v\n").unwrap();
        assert_eq!(sections.len(), 1);
    }
}
