//! Reply prompt construction.

use std::borrow::Cow;

use crate::pipeline::format::PARAGRAPH_OPEN;
use crate::pipeline::types::{LanguageKind, ReplyRequest};

/// Appended when the email body was cut.
pub const TRUNCATION_MARKER: &str = "...";

/// Cut `content` to `max_chars` characters, appending the truncation marker.
pub fn truncate_content(content: &str, max_chars: usize) -> Cow<'_, str> {
    match content.char_indices().nth(max_chars) {
        Some((idx, _)) => Cow::Owned(format!("{}{TRUNCATION_MARKER}", &content[..idx])),
        None => Cow::Borrowed(content),
    }
}

/// Build the single generation prompt for `request`.
pub fn build_prompt(request: &ReplyRequest, max_chars: usize) -> String {
    let tone = request.tone.as_str();
    let language = match request.language {
        LanguageKind::Fixed(code) => code.display_name().to_string(),
        LanguageKind::Detect => format!(
            "the same language as the original email (detected: {})",
            request.original_language.display_name()
        ),
    };
    let body = truncate_content(&request.email_content, max_chars);

    let unknown = if request.unknown_content {
        "\nThe original email could not be read. Write a polite, brief reply that works \
         without knowing its content, and do not invent details.\n"
    } else {
        ""
    };

    format!(
        "You are an experienced email assistant. Write a {tone}, thoughtful reply to the email below.\n\
         \n\
         Analyse first:\n\
         1. What kind of email this is (business, inquiry, job application, ...)\n\
         2. Who the sender is and what they want\n\
         3. The key information and requests in the email\n\
         4. Any names, forms of address, dates, events or places mentioned\n\
         \n\
         Requirements:\n\
         1. Write in {language}\n\
         2. Be specific to this email; avoid generic filler\n\
         3. Keep a {tone} voice that still reads naturally\n\
         4. Include a suitable greeting and closing\n\
         5. Propose clear next steps or questions where appropriate\n\
         6. Keep the body between 100 and 300 words\n\
         {unknown}\
         \n\
         Formatting (important):\n\
         1. Wrap every paragraph on its own as: {PARAGRAPH_OPEN}paragraph text</div>\n\
         2. The greeting goes in its own <div>\n\
         3. Every natural paragraph gets its own <div>\n\
         4. The closing and signature are separate paragraphs\n\
         5. Do not use bare line breaks; use the <div> markup instead\n\
         \n\
         Original email:\n\
         {body}\n\
         \n\
         Reply with the complete email only, including greeting and closing. If the \
         email is unclear, make reasonable assumptions from the available information."
    )
}
