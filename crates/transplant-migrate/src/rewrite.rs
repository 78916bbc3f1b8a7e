//! Rewriting scope references inside entity bodies.
//!
//! Bodies copied from one scope still name the source organization and
//! project. Before a create call every `orgIdentifier`/`projectIdentifier`
//! value is pointed at the target scope.
//!
//! Documents that parse as YAML (JSON included) are rewritten in place: the
//! parser locates each scope value and only those bytes are replaced, so
//! comments, quoting and layout survive. Documents that do not parse fall
//! back to textual substitution, which also appends any scope key the body
//! lacks.

use std::collections::HashMap;

use regex::{Captures, Regex};
use serde_json::Value as JsonValue;
use tracing::debug;
use transplant_platform::Scope;
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser};
use yaml_rust2::scanner::{Marker, TScalarStyle};

/// Keys whose values reference the owning scope.
pub const SCOPE_KEYS: [&str; 2] = ["orgIdentifier", "projectIdentifier"];

/// Which path produced a rewritten body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewritePath {
    Structured,
    Fallback,
}

/// A rewritten document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewritten {
    pub body: String,
    pub path: RewritePath,
}

/// The value a scope key takes in `scope`.
fn scope_value<'a>(key: &str, scope: &'a Scope) -> &'a str {
    if key == "orgIdentifier" {
        &scope.org
    } else {
        &scope.project
    }
}

/// Rewrite a serialized document so its scope references name `target`.
///
/// Never fails: a document that cannot be parsed, whose root is a bare
/// scalar, or whose scope values cannot be located in the text is handled
/// by [`rewrite_text`]. Blank input comes back unchanged.
pub fn rewrite_document(body: &str, source: &Scope, target: &Scope) -> Rewritten {
    if body.trim().is_empty() {
        return Rewritten {
            body: body.to_string(),
            path: RewritePath::Structured,
        };
    }

    match rewrite_in_place(body, target) {
        Some(rewritten) => Rewritten {
            body: rewritten,
            path: RewritePath::Structured,
        },
        None => {
            debug!("document did not parse, using text substitution");
            Rewritten {
                body: rewrite_text(body, source, target),
                path: RewritePath::Fallback,
            }
        }
    }
}

// =============================================================================
// In-place rewrite
// =============================================================================

#[derive(Default)]
struct EventLog {
    events: Vec<(Event, Marker)>,
}

impl MarkedEventReceiver for EventLog {
    fn on_event(&mut self, event: Event, mark: Marker) {
        self.events.push((event, mark));
    }
}

/// A scalar as it appears in the source text.
#[derive(Debug, Clone)]
struct ScalarAt {
    value: String,
    style: TScalarStyle,
    mark: Marker,
}

enum Frame {
    Sequence,
    Mapping {
        expect_key: bool,
        scope_key: Option<&'static str>,
    },
}

/// Scope-key value scalars in document order, with aliases resolved to the
/// anchored scalar. `None` when the root of the first document is not a
/// mapping or sequence.
fn scope_scalars(events: Vec<(Event, Marker)>) -> Option<Vec<(&'static str, ScalarAt)>> {
    let mut stack: Vec<Frame> = Vec::new();
    let mut anchors: HashMap<usize, ScalarAt> = HashMap::new();
    let mut found = Vec::new();
    let mut root_checked = false;

    for (event, mark) in events {
        let starts_mapping = matches!(event, Event::MappingStart(..));
        let starts_container = starts_mapping || matches!(event, Event::SequenceStart(..));
        let is_node = starts_container || matches!(event, Event::Scalar(..) | Event::Alias(..));
        if is_node && !root_checked {
            if !starts_container {
                return None;
            }
            root_checked = true;
        }

        // The scalar this node resolves to, if any.
        let scalar = match event {
            Event::Scalar(value, style, anchor, _) => {
                let scalar = ScalarAt { value, style, mark };
                if anchor > 0 {
                    anchors.insert(anchor, scalar.clone());
                }
                Some(scalar)
            }
            Event::Alias(anchor) => anchors.get(&anchor).cloned(),
            Event::MappingEnd | Event::SequenceEnd => {
                stack.pop();
                continue;
            }
            _ => None,
        };

        if is_node {
            if let Some(Frame::Mapping {
                expect_key,
                scope_key,
            }) = stack.last_mut()
            {
                if *expect_key {
                    *scope_key = scalar
                        .as_ref()
                        .filter(|_| !starts_container)
                        .and_then(|s| SCOPE_KEYS.iter().copied().find(|key| *key == s.value));
                    *expect_key = false;
                } else {
                    if let (Some(key), Some(scalar)) = (scope_key.take(), scalar) {
                        found.push((key, scalar));
                    }
                    *expect_key = true;
                }
            }
        }

        if starts_container {
            stack.push(if starts_mapping {
                Frame::Mapping {
                    expect_key: true,
                    scope_key: None,
                }
            } else {
                Frame::Sequence
            });
        }
    }

    root_checked.then_some(found)
}

/// Byte range of a scalar's source text, checked against its parsed value.
///
/// The parser's mark counts characters; a byte reading of the same index is
/// tried as well so a mismatch is caught by the check rather than spliced.
fn scalar_span(body: &str, scalar: &ScalarAt) -> Option<(usize, usize)> {
    let index = scalar.mark.index();
    let by_char = body.char_indices().nth(index).map(|(byte, _)| byte);
    let by_byte = body.is_char_boundary(index).then_some(index);

    [by_char, by_byte]
        .into_iter()
        .flatten()
        .find_map(|start| scalar_len(&body[start..], scalar).map(|len| (start, start + len)))
}

fn scalar_len(rest: &str, scalar: &ScalarAt) -> Option<usize> {
    match scalar.style {
        TScalarStyle::Plain => rest.starts_with(&scalar.value).then_some(scalar.value.len()),
        TScalarStyle::DoubleQuoted => {
            if !rest.starts_with('"') {
                return None;
            }
            let mut escaped = false;
            let close = rest.char_indices().skip(1).find_map(|(i, c)| match c {
                _ if escaped => {
                    escaped = false;
                    None
                }
                '\\' => {
                    escaped = true;
                    None
                }
                '"' => Some(i),
                _ => None,
            })?;
            Some(close + 1)
        }
        TScalarStyle::SingleQuoted => {
            let bytes = rest.as_bytes();
            if bytes.first() != Some(&b'\'') {
                return None;
            }
            let mut i = 1;
            loop {
                match bytes.get(i)? {
                    b'\'' if bytes.get(i + 1) == Some(&b'\'') => i += 2,
                    b'\'' => return Some(i + 1),
                    _ => i += 1,
                }
            }
        }
        _ => None,
    }
}

/// `value` written in `style`, quoting plain scalars that would not read
/// back as the same string.
fn render_scalar(value: &str, style: TScalarStyle) -> String {
    match style {
        TScalarStyle::SingleQuoted => format!("'{}'", value.replace('\'', "''")),
        TScalarStyle::Plain if reads_back_plain(value) => value.to_string(),
        _ => serde_json::to_string(value).unwrap_or_else(|_| format!("\"{value}\"")),
    }
}

fn reads_back_plain(value: &str) -> bool {
    let simple = value
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    simple
        && matches!(
            serde_yaml::from_str::<serde_yaml::Value>(value),
            Ok(serde_yaml::Value::String(ref parsed)) if parsed == value
        )
}

fn rewrite_in_place(body: &str, target: &Scope) -> Option<String> {
    let mut log = EventLog::default();
    Parser::new(body.chars()).load(&mut log, true).ok()?;

    let mut edits: Vec<(usize, usize, String)> = Vec::new();
    for (key, scalar) in scope_scalars(log.events)? {
        // An empty value has no text to replace.
        if matches!(scalar.style, TScalarStyle::Plain) && scalar.value.is_empty() {
            continue;
        }
        let (start, end) = scalar_span(body, &scalar)?;
        if edits.iter().any(|(s, _, _)| *s == start) {
            continue;
        }
        edits.push((start, end, render_scalar(scope_value(key, target), scalar.style)));
    }

    edits.sort_by_key(|(start, _, _)| *start);
    if edits.windows(2).any(|pair| pair[0].1 > pair[1].0) {
        return None;
    }

    let mut out = body.to_string();
    for (start, end, replacement) in edits.into_iter().rev() {
        out.replace_range(start..end, &replacement);
    }
    Some(out)
}

/// Rewrite the scope references in a JSON tree, returning a new tree.
pub fn rewrite_json(value: &JsonValue, target: &Scope) -> JsonValue {
    let mut out = value.clone();
    walk_json(&mut out, target);
    out
}

fn walk_json(node: &mut JsonValue, target: &Scope) {
    match node {
        JsonValue::Object(map) => {
            for (key, value) in map.iter_mut() {
                if SCOPE_KEYS.contains(&key.as_str()) {
                    *value = JsonValue::String(scope_value(key, target).to_string());
                } else {
                    walk_json(value, target);
                }
            }
        }
        JsonValue::Array(items) => {
            for item in items {
                walk_json(item, target);
            }
        }
        _ => {}
    }
}

// =============================================================================
// Text fallback
// =============================================================================

/// How a scope key is written in a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyStyle {
    Quoted,
    Bare,
}

/// Textual rewrite for bodies that do not parse.
///
/// Each key written as `key`, `"key"` or `'key'` whose value is the source value,
/// bare or quoted, gets the target value in the same quoting. A key missing
/// from the body is appended.
pub fn rewrite_text(body: &str, source: &Scope, target: &Scope) -> String {
    let mut out = body.to_string();

    for key in SCOPE_KEYS {
        let Some(pattern) = value_pattern(key, scope_value(key, source)) else {
            continue;
        };
        let replacement = scope_value(key, target);
        out = pattern
            .replace_all(&out, |caps: &Captures| {
                let value = &caps["value"];
                let quoted = match value.chars().next() {
                    Some(q @ ('"' | '\'')) => format!("{q}{replacement}{q}"),
                    _ => replacement.to_string(),
                };
                format!(
                    "{}{}{}{}{}",
                    &caps["lead"], &caps["key"], &caps["sep"], quoted, &caps["end"]
                )
            })
            .into_owned();
    }

    for (index, key) in SCOPE_KEYS.iter().enumerate() {
        if key_style(&out, key).is_some() {
            continue;
        }
        let other = SCOPE_KEYS[1 - index];
        let json_style = match key_style(&out, other) {
            Some(KeyStyle::Quoted) => true,
            Some(KeyStyle::Bare) => false,
            None => out.trim_start().starts_with('{'),
        };
        out = append_key(&out, key, scope_value(key, target), json_style);
    }

    out
}

fn value_pattern(key: &str, source: &str) -> Option<Regex> {
    let key = regex::escape(key);
    let value = regex::escape(source);
    Regex::new(&format!(
        r#"(?m)(?P<lead>^|[^A-Za-z0-9_])(?P<key>['"]?{key}['"]?)(?P<sep>\s*:\s*)(?P<value>"{value}"|'{value}'|{value})(?P<end>[\s,}}\]]|$)"#
    ))
    .ok()
}

fn key_style(body: &str, key: &str) -> Option<KeyStyle> {
    let key = regex::escape(key);
    let pattern = Regex::new(&format!(r#"(?m)(?:^|[^A-Za-z0-9_"'])(['"]?){key}['"]?\s*:"#)).ok()?;
    let caps = pattern.captures(body)?;
    if caps.get(1).is_some_and(|quote| !quote.as_str().is_empty()) {
        Some(KeyStyle::Quoted)
    } else {
        Some(KeyStyle::Bare)
    }
}

fn append_key(body: &str, key: &str, value: &str, json_style: bool) -> String {
    if json_style {
        if let Some(close) = body.rfind('}') {
            let head = &body[..close];
            let comma = if head.trim_end().ends_with('{') { "" } else { "," };
            return format!("{head}{comma}\"{key}\":\"{value}\"{}", &body[close..]);
        }
        return format!("{}\"{key}\": \"{value}\"\n", line_prefix(body));
    }
    format!("{}{key}: {value}\n", line_prefix(body))
}

fn line_prefix(body: &str) -> String {
    if body.is_empty() || body.ends_with('\n') {
        body.to_string()
    } else {
        format!("{body}\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use test_case::test_case;

    fn source() -> Scope {
        Scope::new("src_org", "src_proj")
    }

    fn target() -> Scope {
        Scope::new("tgt_org", "tgt_proj")
    }

    fn parse(body: &str) -> JsonValue {
        serde_yaml::from_str(body).unwrap()
    }

    /// What an in-place rewrite must produce for bodies that only mention
    /// the source scope in scope values.
    fn swapped(body: &str) -> String {
        body.replace("src_org", "tgt_org").replace("src_proj", "tgt_proj")
    }

    fn assert_in_place(body: &str) {
        let rewritten = rewrite_document(body, &source(), &target());
        assert_eq!(rewritten.path, RewritePath::Structured);
        assert_eq!(rewritten.body, swapped(body));
    }

    #[test]
    fn test_nested_mappings_and_sequences() {
        assert_in_place(
            "\
pipeline:
  identifier: build
  orgIdentifier: src_org
  projectIdentifier: src_proj
  stages:
    - stage:
        spec:
          service:
            orgIdentifier: src_org
            projectIdentifier: src_proj
",
        );
    }

    #[test]
    fn test_comments_quotes_and_flow_style_survive() {
        assert_in_place(
            "\
# owned by platform team
pipeline:
  name: 'Build'   # display name
  orgIdentifier: src_org
  projectIdentifier: \"src_proj\"  # keep quoted
  tags: {team: core, tier: \"1\"}
  refs: [{orgIdentifier: 'src_org', projectIdentifier: src_proj}, other]
",
        );
    }

    #[test]
    fn test_anchored_mapping_rewritten_once() {
        assert_in_place(
            "\
defaults: &scope
  orgIdentifier: src_org
  name: shared
service:
  ref: *scope
",
        );
    }

    #[test]
    fn test_aliased_scalar_rewritten_at_anchor() {
        let body = "\
org: &org src_org
service:
  orgIdentifier: *org
";
        assert_in_place(body);
        let tree = parse(&rewrite_document(body, &source(), &target()).body);
        assert_eq!(tree["service"]["orgIdentifier"], "tgt_org");
    }

    #[test]
    fn test_tagged_value_keeps_tag() {
        assert_in_place("orgIdentifier: !!str src_org\nprojectIdentifier: src_proj\n");
    }

    #[test]
    fn test_json_document_stays_json() {
        assert_in_place(
            r#"{"inputSet": {"orgIdentifier": "src_org", "tags": ["a"], "projectIdentifier":"src_proj"}}"#,
        );
    }

    #[test]
    fn test_multiline_json_document() {
        assert_in_place(
            "{\n  \"orgIdentifier\": \"src_org\",\n  \"stages\": [\n    {\"projectIdentifier\": \"src_proj\"}\n  ]\n}\n",
        );
    }

    #[test]
    fn test_escaped_quotes_before_scope_value() {
        assert_in_place(
            r#"{"description": "say \"hi\"", "orgIdentifier": "src_org", "note": 'it''s'}"#,
        );
    }

    #[test]
    fn test_structured_path_replaces_any_value() {
        let body = "orgIdentifier: some_other_org  # stale\n";
        let rewritten = rewrite_document(body, &source(), &target());
        assert_eq!(rewritten.body, "orgIdentifier: tgt_org  # stale\n");
    }

    #[test]
    fn test_numeric_looking_target_is_quoted() {
        let body = "projectIdentifier: src_proj\n";
        let rewritten = rewrite_document(body, &source(), &Scope::new("o", "2024"));
        assert_eq!(rewritten.body, "projectIdentifier: \"2024\"\n");
        assert_eq!(parse(&rewritten.body)["projectIdentifier"], "2024");
    }

    #[test]
    fn test_single_quoted_target_escapes_quote() {
        let body = "orgIdentifier: 'src_org'\n";
        let rewritten = rewrite_document(body, &source(), &Scope::new("o'neil", "p"));
        assert_eq!(rewritten.body, "orgIdentifier: 'o''neil'\n");
    }

    #[test]
    fn test_non_ascii_text_before_value() {
        assert_in_place("name: \"déploiement ✓\"\norgIdentifier: src_org\n");
    }

    #[test]
    fn test_blank_input_unchanged() {
        let rewritten = rewrite_document("  \n", &source(), &target());
        assert_eq!(rewritten.body, "  \n");
    }

    #[test]
    fn test_unparseable_document_uses_fallback() {
        let body = "{\"orgIdentifier\": \"src_org\", \"projectIdentifier\": \"src_proj\" }}";
        let rewritten = rewrite_document(body, &source(), &target());
        assert_eq!(rewritten.path, RewritePath::Fallback);
        assert_eq!(
            rewritten.body,
            "{\"orgIdentifier\": \"tgt_org\", \"projectIdentifier\": \"tgt_proj\" }}"
        );
    }

    #[test]
    fn test_scalar_document_uses_fallback() {
        let rewritten = rewrite_document("just text", &source(), &target());
        assert_eq!(rewritten.path, RewritePath::Fallback);
        assert_eq!(
            rewritten.body,
            "just text\norgIdentifier: tgt_org\nprojectIdentifier: tgt_proj\n"
        );
    }

    #[test]
    fn test_rewrite_json_tree() {
        let body = serde_json::json!({
            "connector": {
                "identifier": "git",
                "orgIdentifier": "src_org",
                "spec": [{"projectIdentifier": "src_proj"}]
            }
        });
        let rewritten = rewrite_json(&body, &target());
        assert_eq!(rewritten["connector"]["orgIdentifier"], "tgt_org");
        assert_eq!(rewritten["connector"]["spec"][0]["projectIdentifier"], "tgt_proj");
        assert_eq!(body["connector"]["orgIdentifier"], "src_org");
    }

    // Key quoting x value quoting, with the second key present or absent.
    #[test_case(
        "orgIdentifier: src_org\nprojectIdentifier: src_proj\n",
        "orgIdentifier: tgt_org\nprojectIdentifier: tgt_proj\n";
        "bare key bare value"
    )]
    #[test_case(
        "orgIdentifier: \"src_org\"\nprojectIdentifier: 'src_proj'\n",
        "orgIdentifier: \"tgt_org\"\nprojectIdentifier: 'tgt_proj'\n";
        "bare key quoted value"
    )]
    #[test_case(
        "\"orgIdentifier\": src_org, \"projectIdentifier\": src_proj",
        "\"orgIdentifier\": tgt_org, \"projectIdentifier\": tgt_proj";
        "quoted key bare value"
    )]
    #[test_case(
        "{\"orgIdentifier\": \"src_org\", \"projectIdentifier\": \"src_proj\"",
        "{\"orgIdentifier\": \"tgt_org\", \"projectIdentifier\": \"tgt_proj\"";
        "quoted key quoted value"
    )]
    #[test_case(
        "orgIdentifier: src_org\n",
        "orgIdentifier: tgt_org\nprojectIdentifier: tgt_proj\n";
        "bare key bare value second key absent"
    )]
    #[test_case(
        "orgIdentifier: 'src_org'",
        "orgIdentifier: 'tgt_org'\nprojectIdentifier: tgt_proj\n";
        "bare key quoted value second key absent"
    )]
    #[test_case(
        "\"orgIdentifier\": src_org",
        "\"orgIdentifier\": tgt_org\n\"projectIdentifier\": \"tgt_proj\"\n";
        "quoted key bare value second key absent"
    )]
    #[test_case(
        "{\"orgIdentifier\":\"src_org\"}",
        "{\"orgIdentifier\":\"tgt_org\",\"projectIdentifier\":\"tgt_proj\"}";
        "quoted key quoted value second key absent"
    )]
    fn test_text_fallback(input: &str, expected: &str) {
        assert_eq!(rewrite_text(input, &source(), &target()), expected);
    }

    #[test]
    fn test_text_fallback_single_quoted_keys() {
        let body = "'orgIdentifier': src_org\n'projectIdentifier': 'src_proj'\n";
        assert_eq!(
            rewrite_text(body, &source(), &target()),
            "'orgIdentifier': tgt_org\n'projectIdentifier': 'tgt_proj'\n"
        );
    }

    #[test]
    fn test_text_fallback_both_absent_in_braces() {
        assert_eq!(
            rewrite_text("{}", &source(), &target()),
            "{\"orgIdentifier\":\"tgt_org\",\"projectIdentifier\":\"tgt_proj\"}"
        );
    }

    #[test]
    fn test_text_fallback_leaves_other_values() {
        let body = "orgIdentifier: src_org_2\nprojectIdentifier: other\n";
        assert_eq!(rewrite_text(body, &source(), &target()), body);
    }

    #[test]
    fn test_text_fallback_ignores_longer_key_names() {
        let body = "parentOrgIdentifier: src_org\norgIdentifier: src_org\nprojectIdentifier: src_proj\n";
        assert_eq!(
            rewrite_text(body, &source(), &target()),
            "parentOrgIdentifier: src_org\norgIdentifier: tgt_org\nprojectIdentifier: tgt_proj\n"
        );
    }

    // =========================================================================
    // Properties
    // =========================================================================

    fn arb_key() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("identifier".to_string()),
            Just("spec".to_string()),
            Just("stages".to_string()),
            Just("name".to_string()),
        ]
    }

    /// A mapping that may also carry the scope keys, set to the source scope.
    fn with_scope(
        inner: impl Strategy<Value = JsonValue>,
        size: std::ops::Range<usize>,
    ) -> impl Strategy<Value = JsonValue> {
        (
            prop::collection::btree_map(arb_key(), inner, size),
            any::<bool>(),
            any::<bool>(),
        )
            .prop_map(|(map, org, project)| {
                let mut map: serde_json::Map<String, JsonValue> = map.into_iter().collect();
                if org {
                    map.insert("orgIdentifier".into(), "src_org".into());
                }
                if project {
                    map.insert("projectIdentifier".into(), "src_proj".into());
                }
                JsonValue::Object(map)
            })
    }

    fn arb_tree() -> impl Strategy<Value = JsonValue> {
        let leaf = prop_oneof![
            "v[a-z]{0,6}".prop_map(JsonValue::from),
            any::<i32>().prop_map(JsonValue::from),
            any::<bool>().prop_map(JsonValue::from),
        ];
        leaf.prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(JsonValue::Array),
                with_scope(inner, 0..4),
            ]
        })
    }

    fn collection_root() -> impl Strategy<Value = JsonValue> {
        prop_oneof![
            prop::collection::vec(arb_tree(), 0..4).prop_map(JsonValue::Array),
            with_scope(arb_tree(), 1..5),
        ]
    }

    /// The tree written as block YAML, pretty JSON or compact JSON.
    fn arb_document() -> impl Strategy<Value = String> {
        (collection_root(), 0..3u8).prop_map(|(tree, format)| match format {
            0 => serde_yaml::to_string(&tree).unwrap(),
            1 => serde_json::to_string_pretty(&tree).unwrap(),
            _ => serde_json::to_string(&tree).unwrap(),
        })
    }

    fn scope_values(node: &JsonValue, found: &mut Vec<(String, JsonValue)>) {
        match node {
            JsonValue::Object(map) => {
                for (key, value) in map {
                    if SCOPE_KEYS.contains(&key.as_str()) {
                        found.push((key.clone(), value.clone()));
                    } else {
                        scope_values(value, found);
                    }
                }
            }
            JsonValue::Array(items) => items.iter().for_each(|item| scope_values(item, found)),
            _ => {}
        }
    }

    proptest! {
        #[test]
        fn prop_every_scope_value_targets(body in arb_document()) {
            let rewritten = rewrite_document(&body, &source(), &target());
            prop_assert_eq!(rewritten.path, RewritePath::Structured);

            let mut found = Vec::new();
            scope_values(&parse(&rewritten.body), &mut found);
            for (key, value) in found {
                prop_assert_eq!(value, JsonValue::from(scope_value(&key, &target())));
            }
        }

        #[test]
        fn prop_only_scope_values_change(body in arb_document()) {
            let rewritten = rewrite_document(&body, &source(), &target());
            prop_assert_eq!(rewritten.body, swapped(&body));
        }

        #[test]
        fn prop_rewrite_is_idempotent(body in arb_document()) {
            let once = rewrite_document(&body, &source(), &target());
            let twice = rewrite_document(&once.body, &source(), &target());
            prop_assert_eq!(once.body, twice.body);
        }

        #[test]
        fn prop_text_fallback_is_idempotent(extra in "[a-z]{1,8}: v[a-z]{0,6}") {
            let body = format!("{extra}\norgIdentifier: src_org\n");
            let once = rewrite_text(&body, &source(), &target());
            let twice = rewrite_text(&once, &source(), &target());
            prop_assert_eq!(once, twice);
        }
    }
}
