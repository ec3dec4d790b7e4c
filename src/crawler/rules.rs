//! Field extraction rules
//!
//! Each field category (`company_name`, `description`, `address`, `social`)
//! holds an ordered list of rules. A rule is written in one of three forms:
//!
//! - `//tag[@attr='v']/@content` - a path expression, translated to a CSS
//!   selector when the rule book is built
//! - `regex:<pattern>` - run over the raw markup
//! - anything else - a CSS selector
//!
//! Results of every rule in a category are pooled, deduplicated in first-seen
//! order and joined with `", "`.

use crate::HarvestError;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

/// Prefix marking a regex rule
const REGEX_PREFIX: &str = "regex:";

/// Errors raised while compiling a rule
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("unsupported path expression '{expr}': {reason}")]
    Path { expr: String, reason: String },

    #[error("invalid regex '{pattern}': {source}")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid selector '{selector}': {reason}")]
    Selector { selector: String, reason: String },
}

/// What a matched element contributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleTarget {
    /// Whitespace-normalized element text
    Text,

    /// Value of the named attribute
    Attribute(String),
}

/// A compiled extraction rule
#[derive(Debug, Clone)]
pub enum SelectorRule {
    Path {
        source: String,
        selector: Selector,
        target: RuleTarget,
    },
    Regex {
        source: String,
        pattern: Regex,
    },
    Markup {
        source: String,
        selector: Selector,
        target: RuleTarget,
    },
}

impl SelectorRule {
    /// Compiles a rule from its textual form
    pub fn parse(rule: &str) -> Result<Self, RuleError> {
        let rule = rule.trim();

        if let Some(pattern) = rule.strip_prefix(REGEX_PREFIX) {
            let compiled = Regex::new(pattern).map_err(|source| RuleError::Regex {
                pattern: pattern.to_string(),
                source,
            })?;
            return Ok(Self::Regex {
                source: rule.to_string(),
                pattern: compiled,
            });
        }

        if rule.starts_with('/') {
            let (css, target) = translate_path(rule).map_err(|reason| RuleError::Path {
                expr: rule.to_string(),
                reason,
            })?;
            return Ok(Self::Path {
                source: rule.to_string(),
                selector: parse_selector(&css)?,
                target,
            });
        }

        let target = if rule.contains("meta") {
            RuleTarget::Attribute("content".to_string())
        } else {
            RuleTarget::Text
        };
        Ok(Self::Markup {
            source: rule.to_string(),
            selector: parse_selector(rule)?,
            target,
        })
    }

    /// The rule as it was written
    pub fn source(&self) -> &str {
        match self {
            Self::Path { source, .. } | Self::Regex { source, .. } | Self::Markup { source, .. } => {
                source
            }
        }
    }

    /// Appends every value this rule finds to `out`
    fn apply(&self, document: &Html, markup: &str, out: &mut Vec<String>) {
        match self {
            Self::Path {
                selector, target, ..
            }
            | Self::Markup {
                selector, target, ..
            } => {
                for element in document.select(selector) {
                    if let Some(value) = read_target(&element, target) {
                        out.push(value);
                    }
                }
            }
            Self::Regex { pattern, .. } => {
                let group = usize::from(pattern.captures_len() > 1);
                for caps in pattern.captures_iter(markup) {
                    if let Some(m) = caps.get(group) {
                        out.push(m.as_str().trim().to_string());
                    }
                }
            }
        }
    }
}

fn parse_selector(css: &str) -> Result<Selector, RuleError> {
    Selector::parse(css).map_err(|e| RuleError::Selector {
        selector: css.to_string(),
        reason: format!("{:?}", e),
    })
}

fn read_target(element: &ElementRef<'_>, target: &RuleTarget) -> Option<String> {
    match target {
        RuleTarget::Text => Some(
            element
                .text()
                .flat_map(str::split_whitespace)
                .collect::<Vec<_>>()
                .join(" "),
        ),
        RuleTarget::Attribute(name) => element
            .value()
            .attr(name)
            .map(|value| value.trim().to_string()),
    }
}

/// Compiled rules keyed by field category
#[derive(Debug, Clone, Default)]
pub struct RuleBook {
    categories: BTreeMap<String, Vec<SelectorRule>>,
}

impl RuleBook {
    /// Compiles every category; rules that fail to compile are logged and skipped
    pub fn compile(sources: &BTreeMap<String, Vec<String>>) -> Self {
        let categories = sources
            .iter()
            .map(|(category, rules)| (category.clone(), compile_category(category, rules)))
            .collect();
        Self { categories }
    }

    /// Replaces (never merges) the rule list of each overridden category
    pub fn with_overrides(mut self, overrides: &BTreeMap<String, Vec<String>>) -> Self {
        for (category, rules) in overrides {
            tracing::debug!(category, count = rules.len(), "Overriding selector rules");
            self.categories
                .insert(category.clone(), compile_category(category, rules));
        }
        self
    }

    /// Rules for `category`, empty if none are configured
    pub fn rules(&self, category: &str) -> &[SelectorRule] {
        self.categories
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Pools the values of every rule in `category`
    ///
    /// # Returns
    ///
    /// Non-empty values, deduplicated in first-seen order
    pub fn collect(&self, category: &str, document: &Html, markup: &str) -> Vec<String> {
        let mut raw = Vec::new();
        for rule in self.rules(category) {
            rule.apply(document, markup, &mut raw);
        }

        let mut seen = HashSet::new();
        raw.into_iter()
            .filter(|value| !value.is_empty())
            .filter(|value| seen.insert(value.clone()))
            .collect()
    }

    /// Pooled values of `category` joined with `", "`
    pub fn extract(&self, category: &str, document: &Html, markup: &str) -> String {
        self.collect(category, document, markup).join(", ")
    }
}

fn compile_category(category: &str, rules: &[String]) -> Vec<SelectorRule> {
    rules
        .iter()
        .filter_map(|rule| match SelectorRule::parse(rule) {
            Ok(compiled) => Some(compiled),
            Err(e) => {
                tracing::warn!(category, "Skipping rule: {}", e);
                None
            }
        })
        .collect()
}

/// Parses job-level selector overrides given as a JSON object of string lists
pub fn parse_selector_overrides(json: &str) -> crate::Result<BTreeMap<String, Vec<String>>> {
    serde_json::from_str(json).map_err(|e| HarvestError::InvalidSelectors(e.to_string()))
}

// ===== Path expression translation =====

static NAME_TEST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\*|[A-Za-z][A-Za-z0-9_-]*)$").expect("name pattern is valid"));

static ATTR_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^@([A-Za-z_][A-Za-z0-9_-]*)$").expect("attr pattern is valid"));

static ATTR_EQUALS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^@([A-Za-z_][A-Za-z0-9_-]*)\s*=\s*(?:'([^']*)'|"([^"]*)")$"#)
        .expect("equality pattern is valid")
});

static ATTR_FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^(contains|starts-with)\(\s*@([A-Za-z_][A-Za-z0-9_-]*)\s*,\s*(?:'([^']*)'|"([^"]*)")\s*\)$"#,
    )
    .expect("function pattern is valid")
});

static POSITION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[1-9][0-9]*$").expect("position pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
}

/// Translates the supported path subset into a CSS selector
///
/// Supported: `//` and `/` steps, tag names or `*`, predicates `[@a]`,
/// `[@a='v']`, `[contains(@a,'v')]`, `[starts-with(@a,'v')]`, `[N]`
/// (joined with `and`), and a trailing `/@attr` or `/text()`.
fn translate_path(expr: &str) -> Result<(String, RuleTarget), String> {
    let mut steps = split_steps(expr)?;

    let mut target = RuleTarget::Text;
    if let Some((_, last)) = steps.last() {
        if *last == "text()" {
            steps.pop();
        } else if let Some(caps) = ATTR_NAME.captures(last) {
            target = RuleTarget::Attribute(caps[1].to_string());
            steps.pop();
        }
    }

    if steps.is_empty() {
        return Err("no element step".to_string());
    }

    let mut css = String::new();
    for (idx, (axis, step)) in steps.iter().enumerate() {
        if idx > 0 {
            css.push_str(match axis {
                Axis::Child => " > ",
                Axis::Descendant => " ",
            });
        }
        css.push_str(&translate_step(step)?);
    }

    Ok((css, target))
}

/// Splits a path into `(axis, step)` pairs, ignoring `/` inside predicates
fn split_steps(expr: &str) -> Result<Vec<(Axis, &str)>, String> {
    let bytes = expr.as_bytes();
    let mut steps = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let axis = if expr[i..].starts_with("//") {
            i += 2;
            Axis::Descendant
        } else if bytes[i] == b'/' {
            i += 1;
            Axis::Child
        } else {
            return Err(format!("expected '/' at offset {}", i));
        };

        let start = i;
        let mut depth = 0i32;
        let mut quote: Option<u8> = None;
        while i < bytes.len() {
            let c = bytes[i];
            match quote {
                Some(q) if c == q => quote = None,
                Some(_) => {}
                None => match c {
                    b'\'' | b'"' => quote = Some(c),
                    b'[' => depth += 1,
                    b']' => depth -= 1,
                    b'/' if depth == 0 => break,
                    _ => {}
                },
            }
            i += 1;
        }

        if quote.is_some() || depth != 0 {
            return Err("unbalanced predicate".to_string());
        }

        let step = expr[start..i].trim();
        if step.is_empty() {
            return Err("empty step".to_string());
        }
        steps.push((axis, step));
    }

    Ok(steps)
}

fn translate_step(step: &str) -> Result<String, String> {
    let (name, mut rest) = match step.find('[') {
        Some(idx) => (step[..idx].trim(), &step[idx..]),
        None => (step, ""),
    };

    if !NAME_TEST.is_match(name) {
        return Err(format!("unsupported step '{}'", name));
    }

    let mut css = name.to_string();
    let mut position = None;

    while !rest.is_empty() {
        if !rest.starts_with('[') {
            return Err(format!("unexpected '{}' after predicate", rest));
        }
        let close = closing_bracket(rest).ok_or_else(|| "unbalanced predicate".to_string())?;
        let predicate = &rest[1..close];
        rest = rest[close + 1..].trim_start();

        for condition in predicate.split(" and ") {
            let condition = condition.trim();
            if POSITION.is_match(condition) {
                position = Some(condition.to_string());
            } else {
                css.push_str(&translate_condition(condition)?);
            }
        }
    }

    if let Some(n) = position {
        css.push_str(&format!(":nth-of-type({})", n));
    }

    Ok(css)
}

/// Byte offset of the `]` closing the predicate opened at offset 0
fn closing_bracket(text: &str) -> Option<usize> {
    let mut depth = 0;
    let mut quote: Option<char> = None;
    for (idx, c) in text.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '\'' | '"' => quote = Some(c),
                '[' => depth += 1,
                ']' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(idx);
                    }
                }
                _ => {}
            },
        }
    }
    None
}

fn translate_condition(condition: &str) -> Result<String, String> {
    if let Some(caps) = ATTR_NAME.captures(condition) {
        return Ok(format!("[{}]", &caps[1]));
    }

    if let Some(caps) = ATTR_EQUALS.captures(condition) {
        let value = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
        return Ok(format!("[{}=\"{}\"]", &caps[1], escape_css_string(value)));
    }

    if let Some(caps) = ATTR_FUNCTION.captures(condition) {
        let operator = if &caps[1] == "contains" { "*=" } else { "^=" };
        let value = caps.get(3).or_else(|| caps.get(4)).map_or("", |m| m.as_str());
        return Ok(format!(
            "[{}{}\"{}\"]",
            &caps[2],
            operator,
            escape_css_string(value)
        ));
    }

    Err(format!("unsupported predicate '{}'", condition))
}

fn escape_css_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
