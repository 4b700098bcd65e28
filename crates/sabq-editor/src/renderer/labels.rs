use crate::blocks::BlockType;
use crate::config::Locale;

pub fn field_label(key: &str, locale: Locale) -> &'static str {
    match (key, locale) {
        ("text", Locale::Ar) => "النص",
        ("text", Locale::En) => "Text",
        ("level", Locale::Ar) => "مستوى العنوان",
        ("level", Locale::En) => "Heading level",
        ("author", Locale::Ar) => "القائل",
        ("author", Locale::En) => "Author",
        ("url", Locale::Ar) => "الرابط",
        ("url", Locale::En) => "URL",
        ("caption", Locale::Ar) => "التعليق",
        ("caption", Locale::En) => "Caption",
        ("alt", Locale::Ar) => "النص البديل",
        ("alt", Locale::En) => "Alt text",
        ("ordered", Locale::Ar) => "قائمة مرقمة",
        ("ordered", Locale::En) => "Numbered list",
        ("items", Locale::Ar) => "العناصر",
        ("items", Locale::En) => "Items",
        (_, Locale::Ar) => "حقل",
        (_, Locale::En) => "Field",
    }
}

pub fn block_label(block_type: BlockType, locale: Locale) -> &'static str {
    match locale {
        Locale::Ar => match block_type {
            BlockType::Paragraph => "فقرة",
            BlockType::Heading => "عنوان",
            BlockType::Quote => "اقتباس",
            BlockType::Image => "صورة",
            BlockType::Video => "فيديو",
            BlockType::Tweet => "تغريدة",
            BlockType::List => "قائمة",
            BlockType::Link => "رابط",
            BlockType::Highlight => "تمييز",
        },
        Locale::En => match block_type {
            BlockType::Paragraph => "Paragraph",
            BlockType::Heading => "Heading",
            BlockType::Quote => "Quote",
            BlockType::Image => "Image",
            BlockType::Video => "Video",
            BlockType::Tweet => "Tweet",
            BlockType::List => "List",
            BlockType::Link => "Link",
            BlockType::Highlight => "Highlight",
        },
    }
}

pub(super) fn unimplemented_message(block_type: BlockType, locale: Locale) -> String {
    let label = block_label(block_type, locale);
    match locale {
        Locale::Ar => format!("محرر كتلة «{label}» غير متوفر بعد"),
        Locale::En => format!("The {label} block editor is not available yet"),
    }
}
