// ── Prompt templates ──
//
// Framing text wrapped around user input before it is sent to the
// generative-AI API. Each builder rejects blank input.

use std::fmt::Write as _;

use crate::error::CoreError;

/// Tone used by [`write`] when the caller does not pick one.
pub const DEFAULT_TONE: &str = "professional";

/// Structure used by [`enhance_note`] when the caller does not pick one.
pub const DEFAULT_NOTE_TYPE: &str = "SOAP";

fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, CoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::invalid_input(field, "must not be empty"));
    }
    Ok(trimmed)
}

fn optional(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Free-form medical content generation.
pub fn generate(prompt: &str) -> Result<String, CoreError> {
    let prompt = required("prompt", prompt)?;
    Ok(format!(
        "You are a medical content assistant helping a clinician. \
         Respond accurately and concisely, using standard medical terminology. \
         If the request is ambiguous, state your assumptions.\n\n\
         Request:\n{prompt}"
    ))
}

/// Writing assistance that continues or rewrites `existing_content`.
pub fn write(
    prompt: &str,
    existing_content: Option<&str>,
    tone: Option<&str>,
) -> Result<String, CoreError> {
    let prompt = required("prompt", prompt)?;
    let tone = optional(tone).unwrap_or(DEFAULT_TONE);

    let mut out = format!(
        "You are a writing assistant for clinical documentation. \
         Write in a {tone} tone.\n\n\
         Instruction:\n{prompt}\n"
    );
    if let Some(existing) = optional(existing_content) {
        let _ = write!(
            out,
            "\nExisting content (continue or revise it as instructed; \
             return only the resulting text):\n{existing}\n"
        );
    }
    Ok(out)
}

/// Restructure a clinical note without adding findings.
pub fn enhance_note(note: &str, note_type: Option<&str>) -> Result<String, CoreError> {
    let note = required("noteContent", note)?;
    let note_type = optional(note_type).unwrap_or(DEFAULT_NOTE_TYPE);

    let structure = if note_type.eq_ignore_ascii_case(DEFAULT_NOTE_TYPE) {
        "Use the sections Subjective, Objective, Assessment and Plan."
    } else {
        "Use the section headings customary for this note type."
    };

    Ok(format!(
        "You are a clinical documentation specialist. Rewrite the following \
         note as a well-structured {note_type} note. {structure} \
         Correct spelling and expand unambiguous abbreviations. \
         Do not invent findings, diagnoses, medications or measurements that \
         are not present in the original; leave a section empty if nothing \
         in the note supports it.\n\n\
         Original note:\n{note}"
    ))
}
