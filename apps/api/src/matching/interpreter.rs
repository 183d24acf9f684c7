//! Response Interpreter — turns raw model text into structured outcomes.
//!
//! Model answers are natural language and do not follow a strict template.
//! Match scores therefore degrade to 0 rather than failing the request, while
//! work-experience lists fail as a whole: a partial or garbled record in the
//! experience history is worse than none.
//!
//! The interpreter does not strip "thinking" preambles some models emit before
//! their answer. A stray `%` or `.` in such a preamble will be picked up.

use serde::Deserialize;
use thiserror::Error;

use crate::models::experience::{MatchResult, WorkExperienceRecord};

/// Characters before the first `%` considered part of the number.
const PERCENT_LOOKBEHIND: usize = 3;

#[derive(Debug, Error, PartialEq)]
pub enum InterpretError {
    #[error("no JSON array found in model output")]
    NoArray,

    #[error("model output is not a valid work-experience array: {0}")]
    InvalidJson(String),
}

/// Work-experience records plus the bracketed JSON text they were parsed from.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedExperience {
    pub records: Vec<WorkExperienceRecord>,
    pub raw_json: String,
}

/// Pluggable parser for model responses. Carried as `Arc<dyn ResponseInterpreter>`
/// so a schema-validated implementation can replace the heuristics.
pub trait ResponseInterpreter: Send + Sync {
    fn match_result(&self, response: &str) -> MatchResult;

    fn work_experience(&self, response: &str) -> Result<ParsedExperience, InterpretError>;
}

/// String-slicing heuristics tuned for free-form model answers.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicInterpreter;

impl ResponseInterpreter for HeuristicInterpreter {
    fn match_result(&self, response: &str) -> MatchResult {
        MatchResult {
            match_percentage: parse_match_percentage(response),
            explanation: parse_explanation(response),
        }
    }

    fn work_experience(&self, response: &str) -> Result<ParsedExperience, InterpretError> {
        parse_work_experience(response)
    }
}

/// Reads the number written just before the first `%`.
///
/// Takes up to three characters before the sign plus the sign itself, drops
/// the sign and surrounding whitespace, parses a number and truncates it.
/// Anything unparsable is 0; the result is clamped into `0..=100`.
pub fn parse_match_percentage(response: &str) -> u8 {
    let chars: Vec<char> = response.chars().collect();
    let Some(percent_at) = chars.iter().position(|&c| c == '%') else {
        return 0;
    };

    let start = percent_at.saturating_sub(PERCENT_LOOKBEHIND);
    let candidate: String = chars[start..=percent_at]
        .iter()
        .filter(|&&c| c != '%')
        .collect();

    match candidate.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value.trunc().clamp(0.0, 100.0) as u8,
        _ => 0,
    }
}

/// Everything after the first `.`, trimmed; the whole response when there is none.
pub fn parse_explanation(response: &str) -> String {
    match response.find('.') {
        Some(dot) => response[dot + 1..].trim().to_string(),
        None => response.trim().to_string(),
    }
}

/// One element of the model's JSON array. Every field is required.
#[derive(Debug, Deserialize)]
struct RawExperience {
    job_title: String,
    company_name: String,
    location: String,
    duration: String,
    description: String,
    skills: RawSkills,
}

/// Skills are requested as a list; a model that copies the prompt's example
/// verbatim answers with a single string instead.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawSkills {
    List(Vec<String>),
    Text(String),
}

impl RawSkills {
    fn joined(self) -> String {
        match self {
            RawSkills::List(items) => items.join(","),
            RawSkills::Text(text) => text,
        }
    }
}

impl From<RawExperience> for WorkExperienceRecord {
    fn from(raw: RawExperience) -> Self {
        WorkExperienceRecord {
            job_title: raw.job_title,
            company_name: raw.company_name,
            location: raw.location,
            duration: raw.duration,
            description: raw.description,
            skills: raw.skills.joined(),
        }
    }
}

/// The text from the first `[` through the last `]`, inclusive.
pub fn bracket_span(response: &str) -> Option<&str> {
    let start = response.find('[')?;
    let end = response.rfind(']')?;
    (start < end).then(|| &response[start..=end])
}

/// Strictly parses the bracketed JSON array. All elements or nothing.
pub fn parse_work_experience(response: &str) -> Result<ParsedExperience, InterpretError> {
    let span = bracket_span(response).ok_or(InterpretError::NoArray)?;

    let raw: Vec<RawExperience> =
        serde_json::from_str(span).map_err(|e| InterpretError::InvalidJson(e.to_string()))?;

    Ok(ParsedExperience {
        records: raw.into_iter().map(WorkExperienceRecord::from).collect(),
        raw_json: span.to_string(),
    })
}
