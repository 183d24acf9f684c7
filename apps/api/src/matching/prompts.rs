// Matching pipeline prompt templates.
// All prompts for the matching module are defined here.

pub const MATCH_PROMPT_TEMPLATE: &str = "Analyze the following resume:\n\n{resume_text}\n\n\
and compare it to the following job description:\n\n{job_description}\n\n\
Provide a percentage match (0-100) indicating how well the resume aligns with the job \
requirements. Also, briefly explain the key reasons for this score.";

pub const WORK_EXPERIENCE_PROMPT_TEMPLATE: &str = r#"Categorize the work experience you see in the following resume into the following categories:
job_title,
company_name,
location,
duration,
description,
skills.

Extract work experience ONLY from the experience / professional experience section of the resume.
Do not parse the whole resume and do not invent entries.
Return an array of JSON objects, one per position. "skills" must be an array of strings.
Your answer must contain only the JSON array so that it can be parsed by a program.

Sample output:
[{"job_title": "", "company_name": "", "location": "", "duration": "", "description": "", "skills": [""]},
 {"job_title": "", "company_name": "", "location": "", "duration": "", "description": "", "skills": [""]}]

The resume is:
{resume_text}"#;

pub const RESUME_ADVICE_PROMPT_TEMPLATE: &str =
    "Give improvement suggestions for this resume: {resume_text}";

/// Substitutes `{name}` placeholders in one left-to-right pass over the
/// template. Inserted values are never scanned again.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let hit = values.iter().find_map(|(name, value)| {
            let key = format!("{{{name}}}");
            tail.starts_with(&key).then_some((key.len(), *value))
        });
        match hit {
            Some((len, value)) => {
                out.push_str(value);
                rest = &tail[len..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

pub fn match_prompt(resume_text: &str, job_description: &str) -> String {
    fill(
        MATCH_PROMPT_TEMPLATE,
        &[("resume_text", resume_text), ("job_description", job_description)],
    )
}

pub fn work_experience_prompt(resume_text: &str) -> String {
    fill(WORK_EXPERIENCE_PROMPT_TEMPLATE, &[("resume_text", resume_text)])
}

pub fn resume_advice_prompt(resume_text: &str) -> String {
    fill(RESUME_ADVICE_PROMPT_TEMPLATE, &[("resume_text", resume_text)])
}
