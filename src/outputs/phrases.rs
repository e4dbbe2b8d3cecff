//! Fixed localized phrases the core speaks without asking a provider.

use crate::kernel::state::Language;

pub fn apology(lang: Language) -> &'static str {
    match lang {
        Language::ArSa => "عذراً، لم أتمكن من فهم ذلك. الرجاء المحاولة مرة أخرى.",
        Language::EnUs => "I'm sorry, I didn't catch that.",
    }
}

pub fn apology_banner(lang: Language) -> &'static str {
    match lang {
        Language::ArSa => "تعذر معالجة الطلب",
        Language::EnUs => "Error processing request",
    }
}

pub fn welcome(lang: Language) -> &'static str {
    match lang {
        Language::ArSa => "تم تسجيل الدخول بنجاح. مرحباً بك.",
        Language::EnUs => "Login successful. Welcome back.",
    }
}

/// On-screen acknowledgement for field dictation.
pub fn field_filled(lang: Language, text: &str) -> String {
    match lang {
        Language::ArSa => format!("تم إدخال: {text}"),
        Language::EnUs => format!("Filled: {text}"),
    }
}

/// Spoken acknowledgement for field dictation.
pub fn field_entered(lang: Language, text: &str) -> String {
    match lang {
        Language::ArSa => format!("تم إدخال {text}"),
        Language::EnUs => format!("Entered {text}"),
    }
}

pub fn payment_success(lang: Language) -> &'static str {
    match lang {
        Language::ArSa => "تم التحقق من الهوية. تم السداد بنجاح.",
        Language::EnUs => "Identity verified. Payment successful.",
    }
}

pub fn nothing_to_pay(lang: Language) -> &'static str {
    match lang {
        Language::ArSa => "لا توجد مخالفات غير مسددة.",
        Language::EnUs => "You have no unpaid violations.",
    }
}

pub fn renewal_initiated(lang: Language) -> &'static str {
    match lang {
        Language::ArSa => "تم التحقق. تم إنشاء طلب التجديد.",
        Language::EnUs => "Verified. Renewal request initiated.",
    }
}

pub fn renewal_missing_fields(lang: Language) -> &'static str {
    match lang {
        Language::ArSa => "يرجى اختيار المدينة والمدة أولاً.",
        Language::EnUs => "Please select a city and duration first.",
    }
}

pub fn verifying(lang: Language) -> &'static str {
    match lang {
        Language::ArSa => "جاري التحقق من الهوية...",
        Language::EnUs => "Verifying your identity...",
    }
}
