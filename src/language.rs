// src/language.rs

/// Response language requested by the mobile client.
///
/// Only Arabic is matched explicitly; any other code falls through to English.
/// An absent code means Arabic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    Ar,
    En,
}

impl Language {
    pub fn from_code(code: Option<&str>) -> Self {
        match code.map(str::trim) {
            None => Language::Ar,
            Some(c) if c.eq_ignore_ascii_case("ar") => Language::Ar,
            Some(_) => Language::En,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Language::Ar => "ar",
            Language::En => "en",
        }
    }

    pub fn unknown_plant(self) -> &'static str {
        match self {
            Language::Ar => "نبات غير معروف",
            Language::En => "Unknown Plant",
        }
    }

    pub fn question_required(self) -> &'static str {
        match self {
            Language::Ar => "السؤال مطلوب",
            Language::En => "Question is required",
        }
    }

    pub fn image_required(self) -> &'static str {
        match self {
            Language::Ar => "الصورة مطلوبة",
            Language::En => "Image is required",
        }
    }

    pub fn body_unreadable(self) -> &'static str {
        match self {
            Language::Ar => "تعذر قراءة الطلب.",
            Language::En => "Request body could not be read.",
        }
    }

    pub fn key_not_configured(self) -> &'static str {
        match self {
            Language::Ar => "مفتاح API غير مُعرّف. يرجى التواصل مع المطور.",
            Language::En => "API Key not configured. Please contact developer.",
        }
    }

    pub fn chat_failed(self) -> &'static str {
        match self {
            Language::Ar => "فشلت الدردشة. يرجى المحاولة مرة أخرى.",
            Language::En => "Chat failed. Please try again.",
        }
    }

    pub fn analysis_failed(self) -> &'static str {
        match self {
            Language::Ar => "فشل التحليل. يرجى المحاولة مرة أخرى.",
            Language::En => "Analysis failed. Please try again.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_code_resolution() {
        assert_eq!(Language::from_code(None), Language::Ar);
        assert_eq!(Language::from_code(Some("ar")), Language::Ar);
        assert_eq!(Language::from_code(Some(" AR ")), Language::Ar);
        assert_eq!(Language::from_code(Some("en")), Language::En);
        // Anything that is not Arabic is answered in English.
        assert_eq!(Language::from_code(Some("fr")), Language::En);
        assert_eq!(Language::from_code(Some("")), Language::En);
    }
}
