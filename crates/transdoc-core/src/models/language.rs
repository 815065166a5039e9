use serde::Serialize;

/// A target language offered to users.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Language {
    pub code: &'static str,
    pub name: &'static str,
}

const SUPPORTED_LANGUAGES: &[Language] = &[
    Language { code: "en", name: "English" },
    Language { code: "de", name: "German" },
    Language { code: "fr", name: "French" },
    Language { code: "es", name: "Spanish" },
    Language { code: "it", name: "Italian" },
    Language { code: "pt", name: "Portuguese" },
];

/// Languages offered in the target language picker.
pub fn supported_languages() -> &'static [Language] {
    SUPPORTED_LANGUAGES
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid language code '{0}': expected 2-3 letters with an optional region (e.g. 'de' or 'fr-CA')")]
pub struct InvalidLanguageCode(pub String);

/// Validate and normalize an ISO-like language code.
///
/// The service accepts more languages than the picker offers, so any
/// well-formed code is allowed. The language part is lowercased and the
/// region part uppercased.
pub fn validate_language_code(code: &str) -> Result<String, InvalidLanguageCode> {
    let trimmed = code.trim();
    let (lang, region) = match trimmed.split_once('-') {
        Some((lang, region)) => (lang, Some(region)),
        None => (trimmed, None),
    };

    let lang_ok = (2..=3).contains(&lang.len()) && lang.chars().all(|c| c.is_ascii_alphabetic());
    let region_ok = region.map_or(true, |r| {
        (2..=4).contains(&r.len()) && r.chars().all(|c| c.is_ascii_alphanumeric())
    });

    if !lang_ok || !region_ok {
        return Err(InvalidLanguageCode(code.to_string()));
    }

    Ok(match region {
        Some(r) => format!("{}-{}", lang.to_ascii_lowercase(), r.to_ascii_uppercase()),
        None => lang.to_ascii_lowercase(),
    })
}
