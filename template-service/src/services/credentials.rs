//! Credential lookup: the properties file first, then the process environment.
//!
//! The file is read on every lookup so a key can be rotated without a restart.

use secrecy::Secret;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credential {
    SendGrid,
    OpenAi,
}

impl Credential {
    pub fn property_key(self) -> &'static str {
        match self {
            Credential::SendGrid => "sendgrid.api.key",
            Credential::OpenAi => "openai.api.key",
        }
    }

    pub fn env_var(self) -> &'static str {
        match self {
            Credential::SendGrid => "SENDGRID_API_KEY",
            Credential::OpenAi => "OPENAI_API_KEY",
        }
    }
}

pub trait CredentialProvider: Send + Sync {
    /// Non-blank, trimmed secret for `credential`, if one is configured.
    fn resolve(&self, credential: Credential) -> Option<Secret<String>>;

    /// Non-secret setting from the properties file, trimmed and non-blank.
    fn setting(&self, key: &str) -> Option<String>;
}

type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Properties file layered over environment variables.
#[derive(Clone)]
pub struct LayeredCredentials {
    properties_path: PathBuf,
    env_lookup: EnvLookup,
}

impl LayeredCredentials {
    pub fn new(properties_path: impl Into<PathBuf>) -> Self {
        Self::with_env_lookup(properties_path, |key| std::env::var(key).ok())
    }

    pub fn with_env_lookup<F>(properties_path: impl Into<PathBuf>, env_lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            properties_path: properties_path.into(),
            env_lookup: Arc::new(env_lookup),
        }
    }

    fn properties(&self) -> HashMap<String, String> {
        load_properties(&self.properties_path)
    }
}

impl CredentialProvider for LayeredCredentials {
    fn resolve(&self, credential: Credential) -> Option<Secret<String>> {
        let from_file = non_blank(self.properties().remove(credential.property_key()));

        from_file
            .or_else(|| non_blank((self.env_lookup)(credential.env_var())))
            .map(Secret::new)
    }

    fn setting(&self, key: &str) -> Option<String> {
        non_blank(self.properties().remove(key))
    }
}

/// Fixed values, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    sendgrid_key: Option<String>,
    openai_key: Option<String>,
    settings: HashMap<String, String>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sendgrid_key(mut self, key: impl Into<String>) -> Self {
        self.sendgrid_key = Some(key.into());
        self
    }

    pub fn openai_key(mut self, key: impl Into<String>) -> Self {
        self.openai_key = Some(key.into());
        self
    }

    pub fn setting(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.settings.insert(key.into(), value.into());
        self
    }
}

impl CredentialProvider for StaticCredentials {
    fn resolve(&self, credential: Credential) -> Option<Secret<String>> {
        let value = match credential {
            Credential::SendGrid => self.sendgrid_key.clone(),
            Credential::OpenAi => self.openai_key.clone(),
        };
        non_blank(value).map(Secret::new)
    }

    fn setting(&self, key: &str) -> Option<String> {
        non_blank(self.settings.get(key).cloned())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read a properties file. A missing or unreadable file yields no entries.
pub fn load_properties(path: &Path) -> HashMap<String, String> {
    match std::fs::read_to_string(path) {
        Ok(contents) => parse_properties(&contents),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Credentials file not readable");
            HashMap::new()
        }
    }
}

/// Parse the `.properties` format read by `java.util.Properties::load`.
///
/// Keys end at the first unescaped `=`, `:` or whitespace. A line ending in
/// an odd number of backslashes continues on the next line, whose leading
/// whitespace is dropped. `\t`, `\n`, `\r`, `\f` and `\uXXXX` escapes are
/// decoded in keys and values. Later entries override earlier ones.
pub fn parse_properties(contents: &str) -> HashMap<String, String> {
    let mut properties = HashMap::new();
    let mut lines = contents.lines();

    while let Some(line) = lines.next() {
        let line = line.trim_start_matches(is_blank);
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }

        let mut logical = line.to_string();
        while continues(&logical) {
            logical.pop();
            match lines.next() {
                Some(next) => logical.push_str(next.trim_start_matches(is_blank)),
                None => break,
            }
        }

        let (key, value) = split_entry(&logical);
        properties.insert(unescape(key), unescape(value));
    }

    properties
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\u{0C}')
}

fn continues(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

fn split_entry(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();

    for (idx, c) in line.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '=' || c == ':' || is_blank(c) {
            key_end = idx;
            break;
        }
    }

    let rest = line[key_end..].trim_start_matches(is_blank);
    let rest = rest
        .strip_prefix(['=', ':'])
        .map(|r| r.trim_start_matches(is_blank))
        .unwrap_or(rest);

    (&line[..key_end], rest)
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{0C}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) if hex.len() == 4 => out.push(decoded),
                    _ => {
                        tracing::warn!(escape = %hex, "Malformed \\uXXXX escape in properties file");
                        out.push('u');
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::io::Write;

    fn properties_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_parse_properties() {
        let props = parse_properties(
            "# SendGrid\n\
             sendgrid.api.key = SG.abc\n\
             ! comment\n\
             openai.api.key: sk-123\n\
             \n\
             openai.system.prompt=Use tables: always\n\
             empty.value=\n",
        );

        assert_eq!(props.get("sendgrid.api.key").map(String::as_str), Some("SG.abc"));
        assert_eq!(props.get("openai.api.key").map(String::as_str), Some("sk-123"));
        assert_eq!(
            props.get("openai.system.prompt").map(String::as_str),
            Some("Use tables: always")
        );
        assert_eq!(props.get("empty.value").map(String::as_str), Some(""));
        assert_eq!(props.len(), 4);
    }

    #[test]
    fn test_whitespace_separates_key_and_value() {
        let props = parse_properties("sendgrid.api.key SG.abc\n\topenai.api.key\t  =  sk-1\n");

        assert_eq!(props.get("sendgrid.api.key").map(String::as_str), Some("SG.abc"));
        assert_eq!(props.get("openai.api.key").map(String::as_str), Some("sk-1"));
        assert_eq!(props.len(), 2);
    }

    #[test]
    fn test_backslash_continues_value_on_next_line() {
        let props = parse_properties(
            "openai.system.prompt=line one \\\n    line two \\\n\tline three\nsendgrid.api.key=SG.abc\n",
        );

        assert_eq!(
            props.get("openai.system.prompt").map(String::as_str),
            Some("line one line two line three")
        );
        assert_eq!(props.get("sendgrid.api.key").map(String::as_str), Some("SG.abc"));
    }

    #[test]
    fn test_escaped_backslash_does_not_continue() {
        let props = parse_properties("path=C:\\\\temp\\\\\nnext=1\n# comment \\\nafter=2\n");

        assert_eq!(props.get("path").map(String::as_str), Some("C:\\temp\\"));
        assert_eq!(props.get("next").map(String::as_str), Some("1"));
        assert_eq!(props.get("after").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_escapes_are_decoded() {
        let props = parse_properties(
            "openai.system.prompt=Caf\\u00e9 line\\nnext\\ttab\nkey\\=with\\:sep\\ space=v\n",
        );

        assert_eq!(
            props.get("openai.system.prompt").map(String::as_str),
            Some("Café line\nnext\ttab")
        );
        assert_eq!(props.get("key=with:sep space").map(String::as_str), Some("v"));
    }

    #[test]
    fn test_continued_key_resolves_through_credentials() {
        let file = properties_file("sendgrid.api.key \\\n    SG.continued\n");
        let creds = LayeredCredentials::with_env_lookup(file.path(), no_env);

        assert_eq!(
            creds.resolve(Credential::SendGrid).unwrap().expose_secret(),
            "SG.continued"
        );
    }

    #[test]
    fn test_file_value_wins_over_environment() {
        let file = properties_file("sendgrid.api.key=from-file\n");
        let creds = LayeredCredentials::with_env_lookup(file.path(), |_| {
            Some("from-env".to_string())
        });

        let key = creds.resolve(Credential::SendGrid).unwrap();
        assert_eq!(key.expose_secret(), "from-file");
    }

    #[test]
    fn test_blank_file_value_falls_back_to_environment() {
        let file = properties_file("openai.api.key=   \n");
        let creds = LayeredCredentials::with_env_lookup(file.path(), |key| {
            (key == "OPENAI_API_KEY").then(|| " sk-env ".to_string())
        });

        let key = creds.resolve(Credential::OpenAi).unwrap();
        assert_eq!(key.expose_secret(), "sk-env");
    }

    #[test]
    fn test_missing_file_and_environment_resolve_to_none() {
        let dir = tempfile::tempdir().unwrap();
        let creds = LayeredCredentials::with_env_lookup(dir.path().join("absent.properties"), no_env);

        assert!(creds.resolve(Credential::SendGrid).is_none());
        assert!(creds.setting("openai.system.prompt").is_none());
    }

    #[test]
    fn test_file_is_reread_on_each_lookup() {
        let file = properties_file("sendgrid.api.key=first\n");
        let creds = LayeredCredentials::with_env_lookup(file.path(), no_env);
        assert_eq!(creds.resolve(Credential::SendGrid).unwrap().expose_secret(), "first");

        std::fs::write(file.path(), "sendgrid.api.key=second\n").unwrap();
        assert_eq!(creds.resolve(Credential::SendGrid).unwrap().expose_secret(), "second");
    }

    #[test]
    fn test_static_credentials_treat_blank_as_missing() {
        let creds = StaticCredentials::new().sendgrid_key("  ").openai_key("sk-1");

        assert!(creds.resolve(Credential::SendGrid).is_none());
        assert_eq!(creds.resolve(Credential::OpenAi).unwrap().expose_secret(), "sk-1");
    }
}
