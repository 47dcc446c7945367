//! Template fallback replies.
//!
//! Used when every provider endpoint fails. The matrix is built once and
//! shared read-only; lookup falls back to the English row and then to the
//! row's professional template.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::language::LanguageCode;
use crate::pipeline::format::paragraph;
use crate::pipeline::types::ToneKind;

/// Two capitalised words, or failing that any two tokens.
static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Z][a-z]+)\s+([A-Z][a-z]+)|([^\s,]+)\s+([^\s,]+)").unwrap()
});

static BUILTIN: LazyLock<TemplateMatrix> = LazyLock::new(builtin_matrix);

/// Text placed around the addressee name in the opening line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Salutation {
    pub prefix: &'static str,
    pub suffix: &'static str,
}

const fn salutation(prefix: &'static str, suffix: &'static str) -> Salutation {
    Salutation { prefix, suffix }
}

/// One canned reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyTemplate {
    pub salutation: Salutation,
    pub paragraphs: &'static [&'static str],
}

impl ReplyTemplate {
    /// Render to paragraph markup. The salutation line is omitted without a name.
    pub fn render(&self, name: Option<&str>) -> String {
        let greeting = name.map(|n| {
            format!(
                "{}{}{}",
                self.salutation.prefix,
                escape_markup(n),
                self.salutation.suffix
            )
        });
        greeting
            .iter()
            .map(String::as_str)
            .chain(self.paragraphs.iter().copied())
            .map(paragraph)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Templates for one language. `professional` is mandatory.
#[derive(Debug, Clone)]
pub struct ToneRow {
    professional: ReplyTemplate,
    variants: Vec<(ToneKind, ReplyTemplate)>,
}

impl ToneRow {
    pub fn new(professional: ReplyTemplate) -> Self {
        Self {
            professional,
            variants: Vec::new(),
        }
    }

    pub fn with(mut self, tone: ToneKind, template: ReplyTemplate) -> Self {
        self.variants.retain(|(t, _)| *t != tone);
        self.variants.push((tone, template));
        self
    }

    /// Template for `tone`, or this row's professional template.
    pub fn template(&self, tone: ToneKind) -> &ReplyTemplate {
        if tone == ToneKind::Professional {
            return &self.professional;
        }
        self.variants
            .iter()
            .find(|(t, _)| *t == tone)
            .map(|(_, template)| template)
            .unwrap_or(&self.professional)
    }
}

/// language → tone → template. English is the mandatory default row.
#[derive(Debug, Clone)]
pub struct TemplateMatrix {
    english: ToneRow,
    rows: Vec<(LanguageCode, ToneRow)>,
}

impl TemplateMatrix {
    pub fn new(english: ToneRow) -> Self {
        Self {
            english,
            rows: Vec::new(),
        }
    }

    pub fn with_language(mut self, language: LanguageCode, row: ToneRow) -> Self {
        if language == LanguageCode::En {
            self.english = row;
        } else {
            self.rows.retain(|(l, _)| *l != language);
            self.rows.push((language, row));
        }
        self
    }

    /// The process-wide built-in matrix.
    pub fn builtin() -> &'static TemplateMatrix {
        &BUILTIN
    }

    /// Row for `language`, or the English row.
    pub fn row(&self, language: LanguageCode) -> &ToneRow {
        self.rows
            .iter()
            .find(|(l, _)| *l == language)
            .map(|(_, row)| row)
            .unwrap_or(&self.english)
    }

    pub fn has_language(&self, language: LanguageCode) -> bool {
        language == LanguageCode::En || self.rows.iter().any(|(l, _)| *l == language)
    }

    /// Two-level lookup with fallback: language → English, tone → professional.
    pub fn lookup(&self, language: LanguageCode, tone: ToneKind) -> &ReplyTemplate {
        self.row(language).template(tone)
    }

    /// Render the fallback reply for `content`. Never fails.
    pub fn fallback(&self, content: &str, tone: ToneKind, language: LanguageCode) -> String {
        let name = salutation_name(content);
        if !self.has_language(language) {
            debug!(language = %language, "No templates for language, using English");
        }
        debug!(
            language = %language,
            tone = %tone,
            has_name = name.is_some(),
            "Rendering template fallback reply"
        );
        self.lookup(language, tone).render(name.as_deref())
    }
}

/// Fallback reply from the built-in matrix.
pub fn fallback_reply(content: &str, tone: ToneKind, language: LanguageCode) -> String {
    TemplateMatrix::builtin().fallback(content, tone, language)
}

/// Best-guess addressee name for the greeting line.
pub fn salutation_name(content: &str) -> Option<String> {
    NAME_PATTERN
        .find(content)
        .map(|m| m.as_str().to_string())
}

fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn builtin_matrix() -> TemplateMatrix {
    let english = ToneRow::new(ReplyTemplate {
        salutation: salutation("Dear ", ","),
        paragraphs: &[
            "Thank you for your email.",
            "I have carefully reviewed your message and I'm very interested in what you've shared.",
            "I would like to suggest arranging a detailed discussion to better understand your needs and explore potential collaboration opportunities.",
            "Please let me know what times would be convenient for you, and I'll do my best to accommodate your schedule.",
            "I look forward to your reply.",
            "Best regards,",
        ],
    })
    .with(
        ToneKind::Friendly,
        ReplyTemplate {
            salutation: salutation("Hi ", ","),
            paragraphs: &[
                "Thanks so much for your email!",
                "I was really happy to hear from you. What you mentioned sounds really interesting, and I'd love to chat more about it.",
                "If you're free, maybe we could set up a time to talk in more detail, or we could hop on a call if that works better for you.",
                "Looking forward to hearing back from you soon!",
                "Cheers,",
            ],
        },
    )
    .with(
        ToneKind::Concise,
        ReplyTemplate {
            salutation: salutation("", ","),
            paragraphs: &[
                "Received your email and I'm interested in the matter you've raised.",
                "I suggest we arrange a meeting or call to discuss further.",
                "Please advise your availability.",
                "Regards,",
            ],
        },
    )
    .with(
        ToneKind::Detailed,
        ReplyTemplate {
            salutation: salutation("Dear ", ","),
            paragraphs: &[
                "Thank you very much for your email.",
                "I have thoroughly reviewed all the information you provided and I'm very interested in what you've shared. Based on your message, I believe there is excellent potential for collaboration between us.",
                "I would like to propose scheduling a detailed meeting where we can dive deeper into all aspects of this project. During this meeting, we can explore your specific requirements, expected outcomes, timelines, and other relevant details.",
                "Please let me know what dates and times would be convenient for you, and I will adjust my schedule accordingly. If you have any other questions or need additional information, please don't hesitate to ask.",
                "I look forward to our future collaboration.",
                "Sincerely,",
            ],
        },
    );

    let chinese = ToneRow::new(ReplyTemplate {
        salutation: salutation("", "，"),
        paragraphs: &[
            "感谢您的邮件。",
            "我已仔细阅读了您的信息，并对您提出的内容非常感兴趣。",
            "我们可以安排一次详细的讨论，以便更好地了解您的需求和探讨可能的合作机会。",
            "请告诉我您方便的时间，我会尽量配合您的日程安排。",
            "期待您的回复。",
            "此致,",
        ],
    })
    .with(
        ToneKind::Friendly,
        ReplyTemplate {
            salutation: salutation("", "，"),
            paragraphs: &[
                "谢谢你的邮件！",
                "看到你的来信我真的很高兴。关于你提到的事情，我觉得非常有意思，很愿意进一步交流。",
                "如果你有空，我们可以约个时间详细聊聊，或者如果你愿意的话，也可以直接通过电话沟通。",
                "期待很快听到你的回音！",
                "祝好,",
            ],
        },
    )
    .with(
        ToneKind::Concise,
        ReplyTemplate {
            salutation: salutation("", "，"),
            paragraphs: &[
                "已收到您的邮件，对您提出的事项很感兴趣。",
                "建议我们安排一次会面或通话进一步讨论。",
                "请告知您的可用时间。",
                "谢谢,",
            ],
        },
    )
    .with(
        ToneKind::Detailed,
        ReplyTemplate {
            salutation: salutation("", "，"),
            paragraphs: &[
                "非常感谢您发送这封邮件。",
                "我已经仔细阅读了您提供的所有信息，并且对您提出的内容非常感兴趣。基于您所述的情况，我认为我们有很好的合作空间。",
                "我想提议安排一次详细的会议，以便我们能够更深入地讨论这个项目的各个方面。在会议中，我们可以探讨您的具体需求、预期目标、时间表以及其他相关细节。",
                "请告诉我您方便的日期和时间，我会尽量调整我的日程来配合您。如果您有任何其他问题或需要更多信息，请随时告知我。",
                "期待与您进一步合作。",
                "此致敬礼,",
            ],
        },
    );

    let japanese = ToneRow::new(ReplyTemplate {
        salutation: salutation("", "様"),
        paragraphs: &[
            "お世話になっております。",
            "メールをいただきありがとうございます。",
            "内容を拝見し、大変興味深く思いました。",
            "ご提案について詳しく理解し、潜在的な協力の可能性を探るため、詳細な議論の機会を設けさせていただきたいと思います。",
            "ご都合の良い日時をお知らせいただければ、可能な限り調整させていただきます。",
            "ご返信をお待ちしております。",
            "敬具",
        ],
    })
    .with(
        ToneKind::Friendly,
        ReplyTemplate {
            salutation: salutation("", "さん"),
            paragraphs: &[
                "メールありがとうございます！",
                "ご連絡いただき嬉しいです。",
                "ご提案いただいた内容にとても興味があります。",
                "もし良ければ、詳しくお話しする時間を設けることができますか？",
                "または、お電話でのご連絡の方が良ければ、そちらでも構いません。",
                "お返事楽しみにしています！",
                "よろしくお願いいたします。",
            ],
        },
    )
    .with(
        ToneKind::Concise,
        ReplyTemplate {
            salutation: salutation("", "様"),
            paragraphs: &[
                "メールを拝受いたしました。",
                "ご提案に興味があります。",
                "詳細を協議するため、会議またはお電話での打ち合わせをご提案いたします。",
                "ご都合の良い時間をお知らせください。",
                "敬具",
            ],
        },
    )
    .with(
        ToneKind::Detailed,
        ReplyTemplate {
            salutation: salutation("", "様"),
            paragraphs: &[
                "お世話になっております。",
                "メールをお送りいただき、誠にありがとうございます。",
                "ご提供いただいた情報をすべて慎重に検討いたしました。",
                "ご提案の内容に大変興味を持っており、私どもとの間で優れた協力の可能性があると確信しております。",
                "このプロジェクトのすべての側面について詳しく話し合うことができる詳細な会議を設定することを提案させていただきます。",
                "この会議では、お客様の特定の要件、期待される成果、タイムライン、その他の関連詳細を探ることができます。",
                "ご都合の良い日時をお知らせいただければ、それに応じて私のスケジュールを調整いたします。",
                "その他ご質問やさらに詳しい情報が必要な場合は、どうぞお気軽にお尋ねください。",
                "今後の協力を楽しみにしております。",
                "敬具",
            ],
        },
    );

    TemplateMatrix::new(english)
        .with_language(LanguageCode::Zh, chinese)
        .with_language(LanguageCode::Ja, japanese)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::format::{PARAGRAPH_OPEN, format_reply};

    #[test]
    fn chinese_friendly_is_selected_verbatim() {
        let matrix = TemplateMatrix::builtin();
        let expected = matrix
            .lookup(LanguageCode::Zh, ToneKind::Friendly)
            .render(None);
        // No whitespace-separated tokens, so no salutation name.
        let reply = fallback_reply("你好我是李明", ToneKind::Friendly, LanguageCode::Zh);
        assert_eq!(reply, expected);
        assert!(reply.contains("谢谢你的邮件！"));
        assert!(reply.contains("祝好,"));
    }

    #[test]
    fn chinese_friendly_with_name_only_differs_in_salutation() {
        let reply = fallback_reply("Li Ming 你好", ToneKind::Friendly, LanguageCode::Zh);
        let template = TemplateMatrix::builtin().lookup(LanguageCode::Zh, ToneKind::Friendly);
        let expected = format!("{}\n{}", paragraph("Li Ming，"), template.render(None));
        assert_eq!(reply, expected);
    }

    #[test]
    fn unsupported_language_uses_english_row() {
        let matrix = TemplateMatrix::builtin();
        assert!(!matrix.has_language(LanguageCode::De));
        assert_eq!(
            matrix.lookup(LanguageCode::De, ToneKind::Concise),
            matrix.lookup(LanguageCode::En, ToneKind::Concise)
        );
    }

    #[test]
    fn missing_tone_uses_row_professional() {
        let row = ToneRow::new(ReplyTemplate {
            salutation: salutation("", ""),
            paragraphs: &["pro"],
        });
        let matrix = TemplateMatrix::new(row.clone()).with_language(LanguageCode::Fr, row);
        assert_eq!(
            matrix.lookup(LanguageCode::Fr, ToneKind::Detailed).paragraphs,
            &["pro"]
        );
    }

    #[test]
    fn salutation_prefers_capitalised_pair() {
        assert_eq!(
            salutation_name("John Smith wrote about the launch"),
            Some("John Smith".to_string())
        );
        assert_eq!(
            salutation_name("hello there, friend"),
            Some("hello there".to_string())
        );
        assert_eq!(salutation_name("single"), None);
        assert_eq!(salutation_name(""), None);
    }

    #[test]
    fn english_professional_greets_by_name() {
        let reply = fallback_reply("Anna Berg asked about pricing", ToneKind::Professional, LanguageCode::En);
        assert!(reply.starts_with(&paragraph("Dear Anna Berg,")));
        assert!(reply.ends_with(&paragraph("Best regards,")));
    }

    #[test]
    fn salutation_name_is_escaped() {
        let reply = fallback_reply("<b>x</b> y", ToneKind::Concise, LanguageCode::En);
        assert!(reply.starts_with(&paragraph("&lt;b&gt;x&lt;/b&gt; y,")));
    }

    #[test]
    fn every_template_has_paragraphs_and_is_preformatted() {
        let matrix = TemplateMatrix::builtin();
        let tones = [
            ToneKind::Professional,
            ToneKind::Friendly,
            ToneKind::Concise,
            ToneKind::Detailed,
        ];
        for language in LanguageCode::ALL {
            for tone in tones {
                let reply = matrix.fallback("Kim Park says hi", tone, language);
                let template = matrix.lookup(language, tone);
                assert!(reply.matches(PARAGRAPH_OPEN).count() > template.paragraphs.len());
                assert_eq!(format_reply(&reply), reply);
            }
        }
    }
}
