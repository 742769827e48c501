//! Generative-AI and transcription command handlers.

use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::info;

use medscribe_core::Assistant;

use crate::cli::{EnhanceArgs, GenerateArgs, GlobalOpts, TranscribeArgs, WriteArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util;

/// Structured formats wrap the text under the same key the HTTP routes use.
#[derive(Debug)]
struct TextView {
    key: &'static str,
    text: String,
}

impl TextView {
    fn new(key: &'static str, text: String) -> Self {
        Self { key, text }
    }

    fn text(&self) -> String {
        self.text.clone()
    }
}

impl Serialize for TextView {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.key, &self.text)?;
        map.end()
    }
}

fn assistant(global: &GlobalOpts) -> Result<Assistant, CliError> {
    Ok(config::service_config(global)?.assistant()?)
}

fn print_text(view: &TextView, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_single(global.output, view, TextView::text, TextView::text)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn generate(args: &GenerateArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let text = assistant(global)?.generate(&args.prompt).await?;
    print_text(&TextView::new("generatedText", text), global)
}

pub async fn write(args: &WriteArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let existing = args.existing.as_deref().map(util::read_text).transpose()?;
    let text = assistant(global)?
        .write(&args.prompt, existing.as_deref(), args.tone.as_deref())
        .await?;
    print_text(&TextView::new("generatedText", text), global)
}

pub async fn enhance(args: &EnhanceArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let note = util::read_text(&args.file)?;
    let text = assistant(global)?
        .enhance_note(&note, args.note_type.as_deref())
        .await?;
    print_text(&TextView::new("enhancedNote", text), global)
}

pub async fn transcribe(args: &TranscribeArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let assistant = assistant(global)?;
    let text = if args.base64 {
        let encoded = util::read_text(&args.file)?;
        assistant.transcribe_base64(&encoded).await?
    } else {
        let bytes = util::read_bytes(&args.file)?;
        info!(path = %args.file.display(), bytes = bytes.len(), "transcribing file");
        assistant.transcribe_bytes(bytes, &args.mime_type).await?
    };
    print_text(&TextView::new("text", text), global)
}
