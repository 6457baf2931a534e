//! Interactive conflict prompt

use importer::{ConflictContext, ConflictHandler, ConflictPolicy, ConflictResolution};
use std::io::{BufRead, Write};

/// Asks on the terminal how to resolve each collision
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptHandler;

impl ConflictHandler for PromptHandler {
    async fn resolve(&self, context: &ConflictContext) -> ConflictResolution {
        let question = format!(
            "Template \"{}\" is already installed (v{} by {}). [o]verwrite, [d]uplicate or [s]kip? ",
            context.name, context.existing.manifest.version, context.existing.manifest.author
        );

        let answer = tokio::task::spawn_blocking(move || {
            let stdin = std::io::stdin();
            ask(&mut stdin.lock(), &mut std::io::stderr(), &question)
        })
        .await;

        match answer {
            Ok(resolution) => resolution,
            Err(e) => {
                tracing::warn!("Conflict prompt failed: {}", e);
                ConflictResolution::Skip
            }
        }
    }
}

/// Keep asking until a valid answer arrives; end of input skips
fn ask(input: &mut impl BufRead, output: &mut impl Write, question: &str) -> ConflictResolution {
    loop {
        let _ = write!(output, "{question}");
        let _ = output.flush();

        let mut line = String::new();
        match input.read_line(&mut line) {
            Ok(0) | Err(_) => return ConflictResolution::Skip,
            Ok(_) => {}
        }
        match line.parse() {
            Ok(resolution) => return resolution,
            Err(e) => {
                let _ = writeln!(output, "{e}");
            }
        }
    }
}

/// Either a fixed policy or the interactive prompt
#[derive(Debug, Clone, Copy)]
pub enum CliConflictHandler {
    Fixed(ConflictPolicy),
    Prompt(PromptHandler),
}

impl CliConflictHandler {
    pub fn new(policy: Option<ConflictResolution>) -> Self {
        match policy {
            Some(resolution) => Self::Fixed(ConflictPolicy(resolution)),
            None => Self::Prompt(PromptHandler),
        }
    }
}

impl ConflictHandler for CliConflictHandler {
    async fn resolve(&self, context: &ConflictContext) -> ConflictResolution {
        match self {
            Self::Fixed(policy) => policy.resolve(context).await,
            Self::Prompt(prompt) => prompt.resolve(context).await,
        }
    }
}
