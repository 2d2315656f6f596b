use serde::{Deserialize, Serialize};

const CODE_PROMPT: &str = "You are a senior software engineer. Your answers must contain:
- clean, optimized code that follows best practices
- clear comments and explanations
- appropriate error handling
- the conventions of the language in use
- usage examples when relevant

For every coding problem:
1. Analyze the problem
2. Propose an elegant solution
3. Explain the technical choices
4. Suggest possible improvements";

const DESIGN_PROMPT: &str = "You are a UI/UX design and front-end expert.

First decide what the user wants:

1. If the user asks a QUESTION or wants an EXPLANATION (\"how do I\", \"explain\", \"what is\"),
   answer in plain TEXT without generating code.

2. If the user EXPLICITLY asks you to CREATE or DESIGN something (\"build a page\",
   \"design a form\", \"make me a site\", \"code a button\"), generate complete HTML/CSS/JS.

When you create HTML, always include:
1. semantic HTML5 with a clean structure
2. modern CSS: harmonious gradients, smooth transitions, depth, responsive mobile-first layout
3. Font Awesome icons (https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.4.0/css/all.min.css)
4. Google Fonts typography
5. interactive JavaScript where useful
6. a coherent color palette

ALWAYS put the code inside a ```html fenced block so it can be detected and previewed.

Design principles: generous spacing, clear visual hierarchy, sufficient contrast,
engaging micro-interactions, accessibility (WCAG), good performance.";

/// How the assistant is primed for a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    #[default]
    General,
    Code,
    Design,
}

impl ChatMode {
    pub fn system_prompt(&self) -> Option<&'static str> {
        match self {
            ChatMode::General => None,
            ChatMode::Code => Some(CODE_PROMPT),
            ChatMode::Design => Some(DESIGN_PROMPT),
        }
    }

    pub fn temperature(&self) -> f32 {
        match self {
            ChatMode::General => 0.7,
            ChatMode::Code => 0.3,
            ChatMode::Design => 0.8,
        }
    }

    pub fn max_tokens(&self) -> u32 {
        match self {
            ChatMode::General => 2048,
            ChatMode::Code | ChatMode::Design => 4096,
        }
    }

    /// Models offered for this mode, best first.
    pub fn models(&self) -> &'static [&'static str] {
        match self {
            ChatMode::General => &[
                "llama-3.3-70b-versatile",
                "llama-3.1-8b-instant",
                "mixtral-8x7b-32768",
                "gemma2-9b-it",
            ],
            ChatMode::Code => &[
                "llama-3.3-70b-versatile",
                "llama-3.1-70b-versatile",
                "mixtral-8x7b-32768",
            ],
            ChatMode::Design => &["llama-3.3-70b-versatile", "mixtral-8x7b-32768"],
        }
    }

    /// Assistant replies in this mode may carry HTML worth previewing.
    pub fn renders_html(&self) -> bool {
        matches!(self, ChatMode::Design)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sampling_parameters_per_mode() {
        assert_eq!(ChatMode::General.temperature(), 0.7);
        assert_eq!(ChatMode::General.max_tokens(), 2048);
        assert!(ChatMode::General.system_prompt().is_none());

        assert_eq!(ChatMode::Code.temperature(), 0.3);
        assert_eq!(ChatMode::Code.max_tokens(), 4096);

        assert_eq!(ChatMode::Design.temperature(), 0.8);
        assert!(ChatMode::Design.system_prompt().unwrap().contains("```html"));
        assert!(ChatMode::Design.renders_html());
        assert!(!ChatMode::Code.renders_html());
    }

    #[test]
    fn every_mode_offers_the_default_model() {
        for mode in [ChatMode::General, ChatMode::Code, ChatMode::Design] {
            assert_eq!(mode.models()[0], crate::config::DEFAULT_CHAT_MODEL);
        }
    }
}
