//! Step-by-step construction of a first prompt.

use crate::render::Renderer;

/// One question of the guided prompt builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptStep {
    /// Explanation printed before asking.
    pub heading: &'static str,
    /// An example answer.
    pub example: &'static str,
    /// The input prompt.
    pub prompt: &'static str,
}

/// The questions, in order.
pub const PROMPT_STEPS: [PromptStep; 4] = [
    PromptStep {
        heading: "Step 1: Who should the AI act as? (Role/Persona)",
        example: "Expert Chef",
        prompt: "Enter a role/persona: ",
    },
    PromptStep {
        heading: "Step 2: What do you want the AI to do? (Task)",
        example: "Suggest a three-course vegetarian meal",
        prompt: "Enter a task: ",
    },
    PromptStep {
        heading: "Step 3: Any relevant context, constraints, or details?",
        example: "Considering a Mediterranean diet, with a focus on fresh herbs and olive oil",
        prompt: "Enter context/details: ",
    },
    PromptStep {
        heading: "Step 4: How should the answer be presented? (Format/Output Request)",
        example: "Provide the recipes in a clear, step-by-step format with estimated prep and cook times.",
        prompt: "Enter format/output request: ",
    },
];

const CONFIRM_PROMPT: &str = "Press Enter to continue or type 'edit' to start over: ";

/// Walks the user through [`PROMPT_STEPS`] and joins the answers with `" - "`.
///
/// `ask` shows a prompt and returns the entered line, or `None` once input
/// is closed, in which case the builder gives up and returns `None`.
/// Answering `edit` at the confirmation starts over.
pub fn build_guided_prompt<F>(renderer: &mut dyn Renderer, mut ask: F) -> Option<String>
where
    F: FnMut(&str) -> Option<String>,
{
    renderer.print_info("Let's build your first prompt step by step for best results.");
    loop {
        let mut answers = Vec::with_capacity(PROMPT_STEPS.len());
        for step in &PROMPT_STEPS {
            renderer.print_info("");
            renderer.print_info(step.heading);
            renderer.print_info(&format!("Example: {}", step.example));
            answers.push(ask(step.prompt)?.trim().to_string());
        }
        let prompt = answers.join(" - ");

        renderer.print_info("");
        renderer.print_info("Your full prompt:");
        renderer.print_info(&prompt);
        let confirm = ask(CONFIRM_PROMPT)?;
        if confirm.trim().eq_ignore_ascii_case("edit") {
            renderer.print_info("Restarting prompt setup...");
            continue;
        }
        return Some(prompt);
    }
}
