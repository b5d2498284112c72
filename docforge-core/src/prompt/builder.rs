use super::engine::TemplateEngine;
use super::PromptError;
use crate::protocol::{PromptMode, ReferenceDocument, TypographyDefaults};
use tera::Context;

/// The six typography-protocol rules, in the order they are numbered for the
/// model. The inline-style rule stays first: it is the highest-leverage
/// constraint for paste fidelity.
pub const PROTOCOL_RULES: [&str; 6] = [
    "Only inline style=\"...\" attributes are allowed; <style> tags and external stylesheets are forbidden.",
    "Every length must be expressed in pt; px, rem, em, %, vw and vh are forbidden.",
    "Tables must declare: <table align=\"center\" style=\"width:440pt; border-collapse:collapse; border:1pt solid #000;\">.",
    "Mathematical formulas stay as literal $...$ or $$...$$ LaTeX text; MathML or any other math markup is forbidden.",
    "Paragraphs use <p> tags; control spacing with margin-bottom (for example margin-bottom:12pt).",
    "Never use script, iframe, object or embed tags; word processors reject them.",
];

const GENERATE_ROLE: &str = "\
You are a professional word-processor typesetting assistant.
Whatever the user asks you to write, respond with raw HTML only.
Never emit Markdown, fenced code blocks (```) or any explanatory prose.";

const FIX_ROLE: &str = "\
You are a professional word-processor typesetting assistant and HTML repair tool.
The HTML you receive may contain invalid styles, wrong units or incompatible tags.
Repair it until it complies with the typography protocol below, then respond with the raw HTML only.
Never emit Markdown, fenced code blocks (```) or any explanatory prose.";

const SYSTEM_PROMPT_TEMPLATE: &str = "\
{{ role_narrative }}

[Typography protocol - follow strictly]
Body style is fixed to: <body style=\"margin:0; padding:0; font-family:'{{ font_family }}'; font-size:{{ font_size }}pt;\">
{{ rules_block }}\
{% if custom_instruction %}

[User instructions]
{{ custom_instruction }}\
{% endif %}\
{% if reference_context %}

[Reference documents]
The documents below were uploaded by the user; match their structure and style when composing:
{{ reference_context }}\
{% endif %}";

const SYSTEM_PROMPT_NAME: &str = "system_prompt";

/// Assembles the hidden system instruction injected ahead of every exchange.
///
/// Pure with respect to its inputs: identical arguments always render
/// byte-identical output, so prompts can be replayed and diffed.
#[derive(Clone)]
pub struct PromptBuilder {
    engine: TemplateEngine,
}

impl PromptBuilder {
    pub fn new() -> Result<Self, PromptError> {
        let mut engine = TemplateEngine::new();
        engine.add_template(SYSTEM_PROMPT_NAME, SYSTEM_PROMPT_TEMPLATE)?;
        Ok(Self { engine })
    }

    /// Build the system prompt for one exchange.
    ///
    /// The custom instruction and reference context are trimmed first; an
    /// input that is empty after trimming omits its section entirely, header
    /// included.
    pub fn build(
        &self,
        mode: PromptMode,
        typography: &TypographyDefaults,
        custom_instruction: Option<&str>,
        reference_context: Option<&str>,
    ) -> Result<String, PromptError> {
        let rules_block = PROTOCOL_RULES
            .iter()
            .enumerate()
            .map(|(index, rule)| format!("{}. {}", index + 1, rule))
            .collect::<Vec<_>>()
            .join("\n");

        let mut ctx = Context::new();
        ctx.insert(
            "role_narrative",
            match mode {
                PromptMode::Generate => GENERATE_ROLE,
                PromptMode::Fix => FIX_ROLE,
            },
        );
        ctx.insert("font_family", &typography.font_family);
        ctx.insert("font_size", &typography.font_size());
        ctx.insert("rules_block", &rules_block);
        ctx.insert(
            "custom_instruction",
            custom_instruction.map(str::trim).unwrap_or(""),
        );
        ctx.insert(
            "reference_context",
            reference_context.map(str::trim).unwrap_or(""),
        );

        self.engine.render(SYSTEM_PROMPT_NAME, &ctx)
    }
}

/// Render reference documents into a single context block: each document is
/// labelled `--- Document N: <name> ---` with 1-based numbering, joined by
/// blank lines, order preserved.
pub fn build_reference_context(documents: &[ReferenceDocument]) -> String {
    documents
        .iter()
        .enumerate()
        .map(|(index, doc)| format!("--- Document {}: {} ---\n{}", index + 1, doc.name, doc.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}
