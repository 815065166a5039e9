//! Output naming conventions
//!
//! The translation service decides where it writes results, and the layout has
//! changed between service versions. Each layout seen so far is kept here as a
//! named convention. A convention gives a candidate key (checked with `head`)
//! and a suffix used to pick the output out of a listing.

use transdoc_core::{file_name_of, OutputNaming, TranslationJob};

/// `<prefix><account>-<job>-<lang>/<source key>`
pub fn account_job_language_key(
    output_prefix: &str,
    account_id: &str,
    job_id: &str,
    language: &str,
    source_key: &str,
) -> String {
    format!(
        "{}{}-{}-{}/{}",
        output_prefix, account_id, job_id, language, source_key
    )
}

/// `<prefix><account>-TranslateText-<job>/<lang>.<file name>`
pub fn language_prefixed_key(
    output_prefix: &str,
    account_id: &str,
    job_id: &str,
    language: &str,
    source_key: &str,
) -> String {
    format!(
        "{}{}-TranslateText-{}/{}.{}",
        output_prefix,
        account_id,
        job_id,
        language,
        file_name_of(source_key)
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamingConvention {
    AccountJobLanguage,
    LanguagePrefixed,
}

impl NamingConvention {
    pub const ALL: [NamingConvention; 2] = [
        NamingConvention::AccountJobLanguage,
        NamingConvention::LanguagePrefixed,
    ];

    /// All conventions, `primary` first.
    pub fn ordered(primary: OutputNaming) -> Vec<NamingConvention> {
        let primary = NamingConvention::from(primary);
        let mut ordered = vec![primary];
        ordered.extend(Self::ALL.iter().copied().filter(|c| *c != primary));
        ordered
    }

    /// Candidate output key, or `None` when the account id is unknown.
    pub fn candidate_key(
        &self,
        output_prefix: &str,
        account_id: Option<&str>,
        job: &TranslationJob,
    ) -> Option<String> {
        let account_id = account_id?;
        let build = match self {
            NamingConvention::AccountJobLanguage => account_job_language_key,
            NamingConvention::LanguagePrefixed => language_prefixed_key,
        };
        Some(build(
            output_prefix,
            account_id,
            job.job_id(),
            job.target_language(),
            job.source_key(),
        ))
    }

    /// Delimited job id segment of any key this convention produces for
    /// `job`, so `J2` never matches `J20`.
    pub fn job_marker(&self, job: &TranslationJob) -> String {
        match self {
            NamingConvention::AccountJobLanguage => format!("-{}-", job.job_id()),
            NamingConvention::LanguagePrefixed => format!("-TranslateText-{}/", job.job_id()),
        }
    }

    /// Ending of any key this convention produces for `job`.
    pub fn expected_suffix(&self, job: &TranslationJob) -> String {
        match self {
            NamingConvention::AccountJobLanguage => {
                format!("-{}/{}", job.target_language(), job.source_key())
            }
            NamingConvention::LanguagePrefixed => format!(
                "{}.{}",
                job.target_language(),
                file_name_of(job.source_key())
            ),
        }
    }
}

impl From<OutputNaming> for NamingConvention {
    fn from(naming: OutputNaming) -> Self {
        match naming {
            OutputNaming::AccountJobLanguage => NamingConvention::AccountJobLanguage,
            OutputNaming::LanguagePrefixed => NamingConvention::LanguagePrefixed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(id: &str, source: &str, lang: &str) -> TranslationJob {
        TranslationJob::new(id, source, lang)
    }

    #[test]
    fn account_job_language_layout() {
        assert_eq!(
            account_job_language_key("translated/", "ACME", "J1", "de", "uploads/1700000000-report.pdf"),
            "translated/ACME-J1-de/uploads/1700000000-report.pdf"
        );
    }

    #[test]
    fn language_prefixed_layout() {
        assert_eq!(
            language_prefixed_key("translated/", "ACME", "J2", "de", "uploads/report.docx"),
            "translated/ACME-TranslateText-J2/de.report.docx"
        );
    }

    #[test]
    fn candidate_keys_match_layout_functions() {
        let job = job("J1", "uploads/1700000000-report.pdf", "de");
        assert_eq!(
            NamingConvention::AccountJobLanguage
                .candidate_key("translated/", Some("ACME"), &job)
                .as_deref(),
            Some("translated/ACME-J1-de/uploads/1700000000-report.pdf")
        );
        assert_eq!(
            NamingConvention::LanguagePrefixed
                .candidate_key("translated/", Some("ACME"), &job)
                .as_deref(),
            Some("translated/ACME-TranslateText-J1/de.1700000000-report.pdf")
        );
    }

    #[test]
    fn no_candidate_without_account() {
        let job = job("J1", "uploads/a.pdf", "de");
        for convention in NamingConvention::ALL {
            assert_eq!(convention.candidate_key("translated/", None, &job), None);
        }
    }

    #[test]
    fn candidates_end_with_expected_suffix_and_contain_job_id() {
        let job = job("J7", "uploads/1700000000-q3 report.docx", "pt");
        for convention in NamingConvention::ALL {
            let key = convention
                .candidate_key("translated/", Some("123456789012"), &job)
                .unwrap();
            assert!(key.starts_with("translated/"));
            assert!(key.contains(&convention.job_marker(&job)), "{key}");
            assert!(key.ends_with(&convention.expected_suffix(&job)), "{key}");
        }
    }

    #[test]
    fn job_marker_is_delimited() {
        let longer = job("J20", "uploads/report.docx", "de");
        let job = job("J2", "uploads/report.docx", "de");
        for convention in NamingConvention::ALL {
            let key = convention
                .candidate_key("translated/", Some("ACME"), &longer)
                .unwrap();
            assert!(!key.contains(&convention.job_marker(&job)), "{key}");
        }
    }

    #[test]
    fn language_prefixed_suffix() {
        let job = job("J2", "uploads/report.docx", "de");
        assert_eq!(NamingConvention::LanguagePrefixed.expected_suffix(&job), "de.report.docx");
    }

    #[test]
    fn primary_convention_comes_first() {
        assert_eq!(
            NamingConvention::ordered(OutputNaming::LanguagePrefixed),
            vec![NamingConvention::LanguagePrefixed, NamingConvention::AccountJobLanguage]
        );
        assert_eq!(
            NamingConvention::ordered(OutputNaming::AccountJobLanguage),
            vec![NamingConvention::AccountJobLanguage, NamingConvention::LanguagePrefixed]
        );
    }
}
