//! Turning a `curl` command line into a plain-text API test description.

use std::fmt;

use serde_json::Value;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CurlError {
    #[error("no URL found in curl command")]
    MissingUrl,

    #[error("header without ':' separator: {0:?}")]
    MalformedHeader(String),

    #[error("unterminated quote in curl command")]
    UnterminatedQuote,

    #[error("option {0} expects a value")]
    MissingValue(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(Value),
    Raw(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurlRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
    /// Query parameters grouped by key, in first-seen order.
    pub query: Vec<(String, Vec<String>)>,
}

// Options whose value is irrelevant to the description but must not be taken for the URL.
const IGNORED_WITH_VALUE: &[&str] = &[
    "-u",
    "--user",
    "-A",
    "--user-agent",
    "-b",
    "--cookie",
    "-e",
    "--referer",
    "-o",
    "--output",
    "-m",
    "--max-time",
    "--connect-timeout",
    "-x",
    "--proxy",
];

impl CurlRequest {
    /// Parse a `curl` invocation. A leading `curl` word is optional.
    ///
    /// # Errors
    ///
    /// Returns [`CurlError`] if the command has no URL, a header lacks `:`, a quote is left
    /// open, or an option is missing its value.
    pub fn parse(command: &str) -> Result<Self, CurlError> {
        let words = shell_words(command)?;
        let mut args = words.into_iter().peekable();
        if args.peek().is_some_and(|w| w == "curl") {
            args.next();
        }

        let mut method = None;
        let mut url = None;
        let mut headers = Vec::new();
        let mut body = None;

        while let Some(arg) = args.next() {
            if !arg.starts_with('-') {
                if url.is_none() {
                    url = Some(arg);
                }
                continue;
            }
            match arg.as_str() {
                "-X" | "--request" => method = Some(next_value(&mut args, &arg)?.to_ascii_uppercase()),
                "-H" | "--header" => {
                    let raw = next_value(&mut args, &arg)?;
                    let (name, value) = raw
                        .split_once(':')
                        .ok_or_else(|| CurlError::MalformedHeader(raw.clone()))?;
                    headers.push((name.trim().to_owned(), value.trim().to_owned()));
                }
                "-d" | "--data" | "--data-raw" | "--data-binary" | "--data-ascii" => {
                    let raw = next_value(&mut args, &arg)?;
                    body = Some(match serde_json::from_str::<Value>(&raw) {
                        Ok(json) => RequestBody::Json(json),
                        Err(_) => RequestBody::Raw(raw),
                    });
                }
                "--url" => url = Some(next_value(&mut args, &arg)?),
                flag if IGNORED_WITH_VALUE.contains(&flag) => {
                    next_value(&mut args, flag)?;
                }
                flag => {
                    if let Some(joined) = flag.strip_prefix("-X")
                        && !joined.is_empty()
                    {
                        method = Some(joined.to_ascii_uppercase());
                    }
                }
            }
        }

        let url = url.ok_or(CurlError::MissingUrl)?;
        let method = method.unwrap_or_else(|| {
            let default = if body.is_some() { "POST" } else { "GET" };
            default.to_owned()
        });
        let query = query_params(&url);

        Ok(Self {
            method,
            url,
            headers,
            body,
            query,
        })
    }

    /// Plain-text description used as generation requirements.
    #[must_use]
    pub fn describe(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CurlRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "API test for {} request", self.method)?;
        writeln!(f, "URL: {}", self.url)?;
        if !self.headers.is_empty() {
            writeln!(f, "Headers:")?;
            for (name, value) in &self.headers {
                writeln!(f, "- {name}: {value}")?;
            }
        }
        match &self.body {
            Some(RequestBody::Json(json)) => {
                let pretty = serde_json::to_string_pretty(json).map_err(|_| fmt::Error)?;
                writeln!(f, "Request body:\n{pretty}")?;
            }
            Some(RequestBody::Raw(raw)) => writeln!(f, "Request body:\n{raw}")?,
            None => {}
        }
        if !self.query.is_empty() {
            writeln!(f, "Query parameters:")?;
            for (key, values) in &self.query {
                writeln!(f, "- {key}: {}", values.join(", "))?;
            }
        }
        Ok(())
    }
}

fn next_value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, CurlError> {
    args.next()
        .ok_or_else(|| CurlError::MissingValue(flag.to_owned()))
}

fn query_params(raw: &str) -> Vec<(String, Vec<String>)> {
    let parsed = url::Url::parse(raw).or_else(|_| url::Url::parse(&format!("http://{raw}")));
    let Ok(parsed) = parsed else {
        tracing::debug!(url = raw, "unparseable URL, no query parameters extracted");
        return Vec::new();
    };

    let mut grouped: Vec<(String, Vec<String>)> = Vec::new();
    for (key, value) in parsed.query_pairs() {
        match grouped.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value.into_owned()),
            None => grouped.push((key.into_owned(), vec![value.into_owned()])),
        }
    }
    grouped
}

/// Split a command line into words, honoring single quotes, double quotes, backslash
/// escapes and backslash-newline continuations.
fn shell_words(input: &str) -> Result<Vec<String>, CurlError> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(ch) => current.push(ch),
                        None => return Err(CurlError::UnterminatedQuote),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(ch @ ('"' | '\\' | '$' | '`')) => current.push(ch),
                            Some('\n') => {}
                            Some(ch) => {
                                current.push('\\');
                                current.push(ch);
                            }
                            None => return Err(CurlError::UnterminatedQuote),
                        },
                        Some(ch) => current.push(ch),
                        None => return Err(CurlError::UnterminatedQuote),
                    }
                }
            }
            '\\' => match chars.next() {
                Some('\n') | None => {}
                Some('\r') => {
                    let _ = chars.next();
                }
                Some(ch) => {
                    in_word = true;
                    current.push(ch);
                }
            },
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                in_word = true;
                current.push(c);
            }
        }
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

/// Convenience wrapper for callers that only need the description.
///
/// # Errors
///
/// See [`CurlRequest::parse`].
pub fn describe_curl(command: &str) -> Result<String, CurlError> {
    Ok(CurlRequest::parse(command)?.describe())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_multiline_get_with_header() {
        let cmd = "curl -X GET \"https://jsonplaceholder.typicode.com/users/1\" \\\n-H \"Accept: application/json\"";
        let req = CurlRequest::parse(cmd).unwrap();
        assert_eq!(req.method, "GET");
        assert_eq!(req.url, "https://jsonplaceholder.typicode.com/users/1");
        assert_eq!(req.headers, vec![("Accept".into(), "application/json".into())]);
        assert!(req.body.is_none());
        assert!(req.query.is_empty());
    }

    #[test]
    fn body_without_method_defaults_to_post() {
        let req = CurlRequest::parse(r#"curl https://api.test/users -d '{"name":"Ann","age":30}'"#).unwrap();
        assert_eq!(req.method, "POST");
        assert_eq!(
            req.body,
            Some(RequestBody::Json(serde_json::json!({"name": "Ann", "age": 30})))
        );
    }

    #[test]
    fn explicit_method_wins_over_body() {
        let req = CurlRequest::parse("curl --request put 'https://api.test/x' --data-raw 'plain text'").unwrap();
        assert_eq!(req.method, "PUT");
        assert_eq!(req.body, Some(RequestBody::Raw("plain text".into())));
    }

    #[test]
    fn joined_method_flag() {
        let req = CurlRequest::parse("curl -XDELETE https://api.test/users/7").unwrap();
        assert_eq!(req.method, "DELETE");
    }

    #[test]
    fn query_params_are_grouped_in_first_seen_order() {
        let req = CurlRequest::parse("curl 'https://api.test/search?tag=a&q=rust&tag=b'").unwrap();
        assert_eq!(
            req.query,
            vec![
                ("tag".into(), vec!["a".into(), "b".into()]),
                ("q".into(), vec!["rust".into()]),
            ]
        );
    }

    #[test]
    fn schemeless_url_still_yields_query() {
        let req = CurlRequest::parse("curl localhost:8080/items?page=2").unwrap();
        assert_eq!(req.url, "localhost:8080/items?page=2");
        assert_eq!(req.query, vec![("page".into(), vec!["2".into()])]);
    }

    #[test]
    fn ignored_options_do_not_steal_url() {
        let req = CurlRequest::parse("curl -s -u admin:secret -L https://api.test/me").unwrap();
        assert_eq!(req.url, "https://api.test/me");
    }

    #[test]
    fn errors() {
        assert_eq!(CurlRequest::parse("curl -X GET"), Err(CurlError::MissingUrl));
        assert_eq!(
            CurlRequest::parse("curl https://a.test -H 'NoColon'"),
            Err(CurlError::MalformedHeader("NoColon".into()))
        );
        assert_eq!(
            CurlRequest::parse("curl 'https://a.test"),
            Err(CurlError::UnterminatedQuote)
        );
        assert_eq!(
            CurlRequest::parse("curl https://a.test -H"),
            Err(CurlError::MissingValue("-H".into()))
        );
    }

    #[test]
    fn header_value_keeps_later_colons() {
        let req = CurlRequest::parse("curl https://a.test -H 'X-Time: 12:30'").unwrap();
        assert_eq!(req.headers, vec![("X-Time".into(), "12:30".into())]);
    }

    #[test]
    fn describe_renders_all_sections() {
        let req = CurlRequest::parse(
            r#"curl -X POST "https://api.test/users?team=qa&team=dev" -H "Content-Type: application/json" -d '{"name":"Ann"}'"#,
        )
        .unwrap();
        assert_eq!(
            req.describe(),
            "API test for POST request\n\
             URL: https://api.test/users?team=qa&team=dev\n\
             Headers:\n\
             - Content-Type: application/json\n\
             Request body:\n\
             {\n  \"name\": \"Ann\"\n}\n\
             Query parameters:\n\
             - team: qa, dev\n"
        );
    }

    #[test]
    fn describe_omits_empty_sections() {
        let text = describe_curl("curl https://api.test/ping").unwrap();
        assert_eq!(text, "API test for GET request\nURL: https://api.test/ping\n");
    }

    #[test]
    fn shell_words_joins_adjacent_quoted_segments() {
        assert_eq!(shell_words(r"echo 'a'\''b'").unwrap(), vec!["echo", "a'b"]);
        assert_eq!(shell_words(r#"x"y z"'w'"#).unwrap(), vec!["xy zw"]);
    }

    #[test]
    fn shell_words_escapes() {
        assert_eq!(
            shell_words(r#"-d "say \"hi\" to \$USER" a\ b"#).unwrap(),
            vec!["-d", r#"say "hi" to $USER"#, "a b"]
        );
        assert_eq!(shell_words(r#""keep \n literal""#).unwrap(), vec![r"keep \n literal"]);
        assert_eq!(shell_words(r"'no \ escapes'").unwrap(), vec![r"no \ escapes"]);
    }

    #[test]
    fn shell_words_line_continuations_and_empty_words() {
        assert_eq!(
            shell_words("curl \\\n  -H 'A: b' \\\r\n  url").unwrap(),
            vec!["curl", "-H", "A: b", "url"]
        );
        assert_eq!(shell_words("a '' b").unwrap(), vec!["a", "", "b"]);
        assert!(shell_words("   ").unwrap().is_empty());
    }

    #[test]
    fn shell_words_unterminated_quotes() {
        assert_eq!(shell_words("'open"), Err(CurlError::UnterminatedQuote));
        assert_eq!(shell_words("\"open"), Err(CurlError::UnterminatedQuote));
        assert_eq!(shell_words(r#""ends in \"#), Err(CurlError::UnterminatedQuote));
        assert_eq!(shell_words(r"'a'\''b"), Err(CurlError::UnterminatedQuote));
    }
}
