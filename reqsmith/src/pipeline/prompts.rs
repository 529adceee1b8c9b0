//! Prompt text for every generating stage and every human gate.

use crate::generator::Prompt;
use crate::workspace::{HTML_FILE, JS_FILE};

const ENGINEER: &str = "You are an expert Requirements Engineer.";

const WEB_RULES: &str = "Rules:
1. Use modern HTML5 and JavaScript
2. Keep the design simple, minimal and functional
3. Make sure the layout is responsive and the JavaScript file is included properly
4. Make sure every functionality and requirement is correctly implemented
5. Be as brief as possible while keeping the code complete
6. The HTML file is named 'index.html' and the JavaScript file is named 'main.js'
7. Avoid unnecessary styling but keep the UI aligned, structured and usable";

const REPLY_HELP: &str = "➡️ Reply with one word:
  • 'approve' (or yes / ok / looks good) → continue
  • 'reject' (or no / needs changes) → revise";

pub fn extract_requirements(context: &str) -> Prompt {
    Prompt::new(
        format!(
            "{ENGINEER} Analyze the CONTEXT below and extract every software requirement it \
             implies, using the provided schema. Give each requirement a stable id, a clear \
             description and a category such as Functional or Non-Functional.\n\nCONTEXT:\n{context}"
        ),
        "Extract all requirements from the provided document context.",
    )
}

pub fn clarifying_questions(requirements: &str, max: usize) -> Prompt {
    Prompt::new(
        format!(
            "{ENGINEER} Analyze the requirements below and write at most {max} questions that \
             would remove the most important ambiguities before implementation starts.\n\n\
             REQUIREMENTS:\n{requirements}"
        ),
        "What important things do I need to ask my supervisor about these requirements?",
    )
}

pub fn amend_requirements(requirements: &str, answers: &str) -> Prompt {
    Prompt::new(
        format!(
            "{ENGINEER} Analyze the original requirements and the Q&A feedback below, then \
             produce updated requirements that incorporate the feedback.\n\n\
             Original requirements:\n{requirements}\n\n\
             Feedback from Q&A:\n{answers}\n\n\
             Rules:\n\
             Update descriptions based on the feedback\n\
             Keep every requirement clear and testable"
        ),
        "Please update the requirements based on the Q&A feedback provided.",
    )
}

pub fn implement(requirements: &str) -> Prompt {
    Prompt::new(
        format!(
            "You are an expert Web Developer. Create a simple but modern web application that \
             implements the following requirements, as one HTML file and one JavaScript file.\n\n\
             Requirements:\n{requirements}\n\n{WEB_RULES}"
        ),
        "Please generate the web application code based on these requirements.",
    )
}

pub fn review(html: &str, js: &str) -> Prompt {
    Prompt::new(
        "You are a principal front-end engineer. Read the provided HTML and JavaScript and \
         return specific, actionable refactoring comments. Reference selectors, functions or \
         snippets. Cover semantics and accessibility, performance, architecture, security, UX \
         and testing. Do not restate the original code; focus on improvements.",
        format!(
            "Review the following files.\n\n=== {HTML_FILE} ===\n```html\n{html}\n```\n\n\
             === {JS_FILE} ===\n```javascript\n{js}\n```"
        ),
    )
}

pub fn refactor(html: &str, js: &str, notes: &str) -> Prompt {
    Prompt::new(
        format!(
            "You are an expert Web Developer. Refactor the web application below following \
             best practices and the notes.\n\n{WEB_RULES}\n\n\
             ```html\n{html}\n```\n\n```javascript\n{js}\n```\n\nNotes: {notes}\n"
        ),
        "Help me refactor my simple web app implemented in HTML and JavaScript.",
    )
}

pub fn approval_request(summary: &str) -> String {
    format!("📝 Please review the requirements below:\n\n{summary}\n\n{REPLY_HELP}")
}

pub fn feedback_request(url: &str) -> String {
    format!("📝 The app is running at {url}\nDoes it look okay to you?\n\n{REPLY_HELP}")
}

pub const NOTES_REQUEST: &str = "📝 What do you want to improve?";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_lands_in_system_prompt() {
        let p = extract_requirements("users sign in with email");
        assert!(p.system.ends_with("users sign in with email"));
        assert!(!p.user.contains("email"));
    }

    #[test]
    fn question_cap_is_stated() {
        assert!(clarifying_questions("[]", 3).system.contains("at most 3 questions"));
    }

    #[test]
    fn review_names_both_files() {
        let p = review("<p></p>", "<missing main.js>");
        assert!(p.user.contains("=== index.html ==="));
        assert!(p.user.contains("<missing main.js>"));
    }
}
