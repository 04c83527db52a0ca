//! Parsers for the registry CLI's listing and usage output.
//!
//! The registry prints either box-drawn tables or plain one-per-line lists
//! depending on version. Every parser accepts both and returns an empty
//! list for empty output or "nothing registered" / connection messages.

use std::sync::LazyLock;

use climb_core::{RegistryGroup, RegistryPrompt, RegistryServer, RegistryTool, ToolSchema, Transport};
use regex::Regex;
use serde_json::{Map, Value, json};

use crate::parser::normalize::strip_ansi;

static LIST_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+[.)]\s+").expect("static regex must compile"));
static SERVER_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^\s(]+)(?:\s+\(([^)]+)\))?").expect("static regex must compile")
});
static GROUP_COLUMNS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("static regex must compile"));
static SCHEMA_BULLET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[-•]\s*(\w+)\s*\((\w+)(?:,\s*(required))?\)(?:\s*:\s*(.+))?")
        .expect("static regex must compile")
});

const CANONICAL_SEPARATOR: &str = "__";

/// Cleans listing output. `None` means "no records" for `kind`.
fn listing_lines(raw: &str, kind: &str) -> Option<Vec<String>> {
    let clean = strip_ansi(raw);
    let clean = clean.trim();
    let lower = clean.to_ascii_lowercase();
    if clean.is_empty()
        || lower.contains(&format!("no {kind}"))
        || lower.contains("connection refused")
    {
        return None;
    }
    let lines = clean
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !is_separator(line))
        .map(|line| LIST_NUMBER_RE.replace(line, "").into_owned())
        .collect();
    Some(lines)
}

/// Table rules such as `───────` or `+------+`.
fn is_separator(line: &str) -> bool {
    line.contains("───") || line.contains("---") || line.chars().all(|ch| "─━┌┐└┘├┤┬┴┼+-=|│ ".contains(ch))
}

fn is_table_row(line: &str) -> bool {
    line.contains('│') || line.contains('|')
}

fn table_cells(line: &str) -> Vec<&str> {
    line.split(['│', '|'])
        .map(str::trim)
        .filter(|cell| !cell.is_empty())
        .collect()
}

/// Header rows start with a column title such as `NAME`.
fn is_header_row(line: &str, titles: &[&str]) -> bool {
    let first = if is_table_row(line) {
        table_cells(line).first().copied()
    } else {
        line.split_whitespace().next()
    };
    first.is_some_and(|cell| {
        let cell = cell.to_ascii_lowercase();
        titles.iter().any(|title| cell == *title)
    })
}

fn is_disabled(cell: &str) -> bool {
    cell.eq_ignore_ascii_case("disabled") || cell.eq_ignore_ascii_case("false")
}

/// Parses `list servers` output.
pub fn parse_servers(raw: &str) -> Vec<RegistryServer> {
    let Some(lines) = listing_lines(raw, "servers") else {
        return Vec::new();
    };
    let mut servers = Vec::new();
    for line in &lines {
        if is_header_row(line, &["name", "server"]) {
            continue;
        }
        if is_table_row(line) {
            let cells = table_cells(line);
            if cells.len() < 2 {
                continue;
            }
            servers.push(RegistryServer {
                name: cells[0].to_string(),
                transport: Transport::from_label(cells[1]),
                url: cells.get(2).map(|url| url.to_string()),
                enabled: !cells.get(3).is_some_and(|state| is_disabled(state)),
            });
        } else if let Some(captures) = SERVER_LINE_RE.captures(line) {
            servers.push(RegistryServer {
                name: captures[1].to_string(),
                transport: captures
                    .get(2)
                    .map_or_else(Transport::default, |label| Transport::from_label(label.as_str())),
                url: None,
                enabled: true,
            });
        }
    }
    servers
}

/// Splits `server__name` into its server and item parts.
fn split_canonical(canonical: &str) -> Option<(&str, &str)> {
    canonical
        .split_once(CANONICAL_SEPARATOR)
        .filter(|(server, name)| !server.is_empty() && !name.is_empty())
}

/// Parses `list tools` output. Only canonical `server__tool` names count.
pub fn parse_tools(raw: &str) -> Vec<RegistryTool> {
    let Some(lines) = listing_lines(raw, "tools") else {
        return Vec::new();
    };
    let mut tools = Vec::new();
    for line in &lines {
        if is_header_row(line, &["name", "tool", "canonical"]) {
            continue;
        }
        let (canonical, description, enabled) = if is_table_row(line) {
            let cells = table_cells(line);
            let Some(&canonical) = cells.first() else {
                continue;
            };
            let enabled = !cells.iter().skip(1).any(|cell| is_disabled(cell));
            (canonical, cells.get(1).copied(), enabled)
        } else {
            let mut parts = line.splitn(2, char::is_whitespace);
            let Some(canonical) = parts.next() else {
                continue;
            };
            let description = parts.next().map(str::trim).filter(|text| !text.is_empty());
            (canonical, description, true)
        };
        let Some((server, name)) = split_canonical(canonical) else {
            continue;
        };
        tools.push(RegistryTool {
            name: name.to_string(),
            server_name: server.to_string(),
            canonical_name: canonical.to_string(),
            description: description.map(str::to_string),
            enabled,
        });
    }
    tools
}

/// Parses `list prompts` output.
pub fn parse_prompts(raw: &str) -> Vec<RegistryPrompt> {
    let Some(lines) = listing_lines(raw, "prompts") else {
        return Vec::new();
    };
    lines
        .iter()
        .filter_map(|line| {
            let mut words = line.split_whitespace();
            let canonical = words.next()?;
            let (server, name) = split_canonical(canonical)?;
            let description = words.collect::<Vec<_>>().join(" ");
            Some(RegistryPrompt {
                name: name.to_string(),
                server_name: server.to_string(),
                canonical_name: canonical.to_string(),
                description: (!description.is_empty()).then_some(description),
                enabled: true,
            })
        })
        .collect()
}

/// Parses `list groups` output: name, description and endpoint columns
/// separated by runs of spaces.
pub fn parse_groups(raw: &str) -> Vec<RegistryGroup> {
    let Some(lines) = listing_lines(raw, "groups") else {
        return Vec::new();
    };
    lines
        .iter()
        .filter(|line| !is_header_row(line, &["name", "group"]))
        .filter_map(|line| {
            let mut columns = if is_table_row(line) {
                table_cells(line)
            } else {
                GROUP_COLUMNS_RE.split(line).map(str::trim).collect()
            }
            .into_iter()
            .filter(|column| !column.is_empty());
            let name = columns.next()?;
            Some(RegistryGroup {
                name: name.to_string(),
                description: columns.next().map(str::to_string),
                endpoint: columns.next().map(str::to_string),
            })
        })
        .collect()
}

/// Extracts a tool's input schema from `usage <tool>` output.
///
/// The first embedded JSON object that looks like a schema wins. Failing
/// that, `- name (type): description` bullets form one. `None` means the
/// schema is unavailable.
pub fn parse_tool_schema(raw: &str) -> Option<ToolSchema> {
    let clean = strip_ansi(raw);
    json_schema(&clean).or_else(|| bullet_schema(&clean))
}

fn json_schema(text: &str) -> Option<ToolSchema> {
    text.match_indices('{').find_map(|(start, _)| {
        let end = balanced_object_end(&text[start..])?;
        let value: Value = serde_json::from_str(&text[start..start + end]).ok()?;
        let object = value.as_object()?;
        let looks_like_schema = object.contains_key("properties")
            || object.contains_key("required")
            || object.get("type").and_then(Value::as_str) == Some("object");
        if !looks_like_schema {
            return None;
        }
        serde_json::from_value(value).ok()
    })
}

/// Byte length of the JSON object starting at `text[0] == '{'`.
fn balanced_object_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (index, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(index + 1);
                }
            }
            _ => {}
        }
    }
    None
}

fn bullet_schema(text: &str) -> Option<ToolSchema> {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for captures in SCHEMA_BULLET_RE.captures_iter(text) {
        let name = captures[1].to_string();
        let mut property = json!({ "type": captures[2].to_ascii_lowercase() });
        if let Some(description) = captures.get(4) {
            property["description"] = Value::String(description.as_str().trim().to_string());
        }
        if captures.get(3).is_some() && !required.contains(&name) {
            required.push(name.clone());
        }
        properties.insert(name, property);
    }
    if properties.is_empty() {
        return None;
    }
    Some(ToolSchema {
        schema_type: Some("object".to_string()),
        properties,
        required,
    })
}
