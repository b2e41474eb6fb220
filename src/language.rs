use std::fmt;
use std::str::FromStr;

use crate::error::{Result, RedubError};

/// Target languages the pipeline can dub into.
///
/// Each language maps to exactly one English-source Marian model; codes
/// outside this set are rejected before any media work starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetLanguage {
    French,
    Spanish,
    German,
    Hindi,
    English,
}

impl TargetLanguage {
    pub const ALL: [TargetLanguage; 5] = [
        Self::French,
        Self::Spanish,
        Self::German,
        Self::Hindi,
        Self::English,
    ];

    /// Parse a two-letter language code
    pub fn from_code(code: &str) -> Result<Self> {
        match code.trim().to_lowercase().as_str() {
            "fr" => Ok(Self::French),
            "es" => Ok(Self::Spanish),
            "de" => Ok(Self::German),
            "hi" => Ok(Self::Hindi),
            "en" => Ok(Self::English),
            _ => Err(RedubError::UnsupportedLanguage(code.to_string())),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::French => "fr",
            Self::Spanish => "es",
            Self::German => "de",
            Self::Hindi => "hi",
            Self::English => "en",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::French => "French",
            Self::Spanish => "Spanish",
            Self::German => "German",
            Self::Hindi => "Hindi",
            Self::English => "English",
        }
    }

    /// Pretrained translation model serving English to this language
    pub fn marian_model(&self) -> &'static str {
        match self {
            Self::French => "Helsinki-NLP/opus-mt-en-fr",
            Self::Spanish => "Helsinki-NLP/opus-mt-en-es",
            Self::German => "Helsinki-NLP/opus-mt-en-de",
            Self::Hindi => "Helsinki-NLP/opus-mt-en-hi",
            Self::English => "Helsinki-NLP/opus-mt-en-en",
        }
    }
}

impl FromStr for TargetLanguage {
    type Err = RedubError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_code(s)
    }
}

impl fmt::Display for TargetLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_codes_round_trip() {
        for language in TargetLanguage::ALL {
            assert_eq!(TargetLanguage::from_code(language.code()).unwrap(), language);
        }
    }

    #[test]
    fn test_codes_are_case_insensitive() {
        assert_eq!(TargetLanguage::from_code("FR").unwrap(), TargetLanguage::French);
        assert_eq!(TargetLanguage::from_code(" de ").unwrap(), TargetLanguage::German);
    }

    #[test]
    fn test_unsupported_codes_are_rejected() {
        for code in ["it", "ja", "", "fra", "english"] {
            match TargetLanguage::from_code(code) {
                Err(RedubError::UnsupportedLanguage(c)) => assert_eq!(c, code),
                other => panic!("expected unsupported language for {:?}, got {:?}", code, other),
            }
        }
    }

    #[test]
    fn test_marian_models_follow_source_target_naming() {
        for language in TargetLanguage::ALL {
            assert_eq!(
                language.marian_model(),
                format!("Helsinki-NLP/opus-mt-en-{}", language.code())
            );
        }
    }
}
