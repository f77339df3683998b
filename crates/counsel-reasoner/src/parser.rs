//! Parse LLM output into plans, IRAC sections and critiques

use crate::config::Severity;
use crate::error::ReasonerError;
use crate::reflection::CritiqueIssue;
use counsel_domain::{AnswerSections, PlannedStep, ReasoningPlan, StepId, StepKind};
use serde_json::Value;
use std::collections::HashMap;

/// Extract JSON from a response, handling markdown code blocks and chatter
pub(crate) fn extract_json(response: &str) -> Result<String, String> {
    let trimmed = response.trim();

    if trimmed.starts_with("```") {
        let lines: Vec<&str> = trimmed.lines().collect();
        if lines.len() < 2 {
            return Err("Empty code block".to_string());
        }

        // Skip the opening fence line and a closing fence if present
        let end = if lines[lines.len() - 1].trim_start().starts_with("```") {
            lines.len() - 1
        } else {
            lines.len()
        };
        return Ok(lines[1..end].join("\n"));
    }

    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return Ok(trimmed.to_string());
    }

    // Prose around a single JSON object
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => Ok(trimmed[start..=end].to_string()),
        _ => Err("No JSON found in response".to_string()),
    }
}

fn parse_value(response: &str) -> Result<Value, String> {
    let json_str = extract_json(response)?;
    serde_json::from_str(&json_str).map_err(|e| format!("JSON parse error: {}", e))
}

/// Items of `key` in an object, or a bare top-level array
fn list_field<'v>(value: &'v Value, key: &str) -> Result<&'v Vec<Value>, String> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(obj) => obj
            .get(key)
            .and_then(|v| v.as_array())
            .ok_or_else(|| format!("Expected a '{}' array", key)),
        _ => Err(format!("Expected a JSON object with '{}'", key)),
    }
}

/// Step identifiers may arrive as numbers or strings
fn raw_id(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

/// Parse and validate a planning response
///
/// Step ids are renumbered by position; `depends_on` entries are resolved
/// against the ids the model used, and must name earlier steps.
pub fn parse_plan(
    response: &str,
    min_steps: usize,
    max_steps: usize,
) -> Result<ReasoningPlan, ReasonerError> {
    let invalid = |reason: String| ReasonerError::PlanGeneration(reason);

    let json = parse_value(response).map_err(invalid)?;
    let items = list_field(&json, "steps").map_err(invalid)?;

    if items.len() < min_steps || items.len() > max_steps {
        return Err(invalid(format!(
            "plan has {} steps; expected between {} and {}",
            items.len(),
            min_steps,
            max_steps
        )));
    }

    let all_ids: Vec<Option<String>> = items
        .iter()
        .map(|item| item.get("id").and_then(raw_id))
        .collect();

    let mut positions: HashMap<String, StepId> = HashMap::new();
    let mut steps = Vec::with_capacity(items.len());

    for (idx, item) in items.iter().enumerate() {
        let id = StepId::new(idx as u32 + 1);
        let obj = item
            .as_object()
            .ok_or_else(|| invalid(format!("step {} is not a JSON object", id)))?;

        let kind_str = obj
            .get("kind")
            .and_then(|v| v.as_str())
            .ok_or_else(|| invalid(format!("step {} is missing 'kind'", id)))?;
        let kind = StepKind::parse(kind_str)
            .ok_or_else(|| invalid(format!("step {} has unknown kind '{}'", id, kind_str)))?;

        let description = obj
            .get("description")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .ok_or_else(|| invalid(format!("step {} is missing a description", id)))?
            .to_string();

        let query = obj
            .get("query")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_string);

        let depends_on = match obj.get("depends_on") {
            None | Some(Value::Null) => (1..id.value()).map(StepId::new).collect(),
            Some(Value::Array(deps)) => {
                let mut resolved = Vec::with_capacity(deps.len());
                for dep in deps {
                    let key = raw_id(dep).ok_or_else(|| {
                        invalid(format!("step {} has a malformed dependency", id))
                    })?;
                    match positions.get(&key) {
                        Some(dep_id) => resolved.push(*dep_id),
                        None if all_ids.iter().flatten().any(|k| *k == key) => {
                            return Err(invalid(format!(
                                "step {} depends on '{}', which does not precede it",
                                id, key
                            )));
                        }
                        None => {
                            return Err(invalid(format!(
                                "step {} depends on unknown step '{}'",
                                id, key
                            )));
                        }
                    }
                }
                resolved
            }
            Some(_) => {
                return Err(invalid(format!("step {} has a malformed 'depends_on'", id)));
            }
        };

        let key = all_ids[idx].clone().unwrap_or_else(|| id.to_string());
        if positions.insert(key.clone(), id).is_some() {
            return Err(invalid(format!("duplicate step id '{}'", key)));
        }

        steps.push(PlannedStep {
            id,
            kind,
            description,
            query,
            depends_on,
        });
    }

    ReasoningPlan::new(steps).map_err(|e| invalid(e.to_string()))
}

/// Parse an IRAC response
pub fn parse_sections(response: &str) -> Result<AnswerSections, String> {
    let json = parse_value(response)?;
    let obj = json
        .as_object()
        .ok_or_else(|| "Expected a JSON object with IRAC sections".to_string())?;

    let field = |name: &str| {
        obj.get(name)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .trim()
            .to_string()
    };

    let sections = AnswerSections {
        issue: field("issue"),
        rule: field("rule"),
        application: field("application"),
        conclusion: field("conclusion"),
    };

    if sections.iter().iter().all(|(_, text)| text.is_empty()) {
        return Err("Response has none of issue, rule, application, conclusion".to_string());
    }
    Ok(sections)
}

/// Sections for a synthesis response that is not structured
///
/// The whole text becomes the conclusion; the other sections are left empty
/// for the placeholder.
pub fn fallback_sections(response: &str) -> AnswerSections {
    AnswerSections {
        conclusion: response.trim().to_string(),
        ..AnswerSections::default()
    }
}

/// Parse a critique response
pub fn parse_critique(response: &str) -> Result<Vec<CritiqueIssue>, String> {
    let json = parse_value(response)?;
    let items = list_field(&json, "issues")?;

    items
        .iter()
        .enumerate()
        .map(|(idx, item)| -> Result<CritiqueIssue, String> {
            let severity_str = item
                .get("severity")
                .and_then(|v| v.as_str())
                .ok_or_else(|| format!("issue {} is missing 'severity'", idx + 1))?;
            let severity = Severity::parse(severity_str)
                .ok_or_else(|| format!("issue {} has unknown severity '{}'", idx + 1, severity_str))?;
            let description = item
                .get("description")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .trim()
                .to_string();
            Ok(CritiqueIssue {
                severity,
                description,
            })
        })
        .collect()
}

/// Strip `[n]` markers that do not name one of `citation_count` citations
///
/// Returns the cleaned sections and the stripped marker numbers, sorted.
pub fn resolve_markers(sections: AnswerSections, citation_count: usize) -> (AnswerSections, Vec<u32>) {
    let mut unresolved = Vec::new();
    let cleaned = AnswerSections {
        issue: strip_unresolved(&sections.issue, citation_count, &mut unresolved),
        rule: strip_unresolved(&sections.rule, citation_count, &mut unresolved),
        application: strip_unresolved(&sections.application, citation_count, &mut unresolved),
        conclusion: strip_unresolved(&sections.conclusion, citation_count, &mut unresolved),
    };
    unresolved.sort_unstable();
    unresolved.dedup();
    (cleaned, unresolved)
}

fn strip_unresolved(text: &str, citation_count: usize, unresolved: &mut Vec<u32>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('[') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let digits = after
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(after.len());

        if digits == 0 || !after[digits..].starts_with(']') {
            out.push('[');
            rest = after;
            continue;
        }

        let marker = &after[..digits];
        match marker.parse::<u32>() {
            Ok(n) if n >= 1 && (n as usize) <= citation_count => {
                out.push('[');
                out.push_str(marker);
                out.push(']');
            }
            parsed => {
                if let Ok(n) = parsed {
                    unresolved.push(n);
                }
                if out.ends_with(' ') {
                    out.pop();
                }
            }
        }
        rest = &after[digits + 1..];
    }

    out.push_str(rest);
    out
}
