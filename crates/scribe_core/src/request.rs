use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Length and format of the generated book.
///
/// Each variant maps to exactly one remote endpoint; adding a variant is a
/// single-point change checked by the exhaustive matches below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BookVariant {
    Short,
    #[default]
    Medium,
    Long,
    Research,
}

impl BookVariant {
    pub const ALL: [BookVariant; 4] = [
        BookVariant::Short,
        BookVariant::Medium,
        BookVariant::Long,
        BookVariant::Research,
    ];

    pub fn endpoint_path(self) -> &'static str {
        match self {
            BookVariant::Short => "/api/generateBookSmall",
            BookVariant::Medium => "/api/generateBookMed",
            BookVariant::Long => "/api/generateBookLong",
            BookVariant::Research => "/api/generateResearchPaperLong",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            BookVariant::Short => "small",
            BookVariant::Medium => "medium",
            BookVariant::Long => "long",
            BookVariant::Research => "research-long",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BookVariant::Short => "Small Book",
            BookVariant::Medium => "Medium Book",
            BookVariant::Long => "Long Book",
            BookVariant::Research => "Research Paper",
        }
    }
}

impl fmt::Display for BookVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown book variant `{0}` (expected short, medium, long or research)")]
pub struct UnknownVariant(pub String);

impl FromStr for BookVariant {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        match wanted.to_ascii_lowercase().as_str() {
            "short" | "small" => Ok(BookVariant::Short),
            "medium" => Ok(BookVariant::Medium),
            "long" => Ok(BookVariant::Long),
            "research" | "research-long" => Ok(BookVariant::Research),
            _ => Err(UnknownVariant(wanted.to_string())),
        }
    }
}

/// Languages the generation service is asked to write in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    #[default]
    English,
    Amharic,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::English, Language::Amharic];

    pub fn tag(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Amharic => "Amharic",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported language `{0}`")]
pub struct UnknownLanguage(pub String);

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Language::ALL
            .into_iter()
            .find(|language| language.tag().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownLanguage(wanted.to_string()))
    }
}

/// Suffix appended to every prompt before dispatch.
pub fn language_directive(language: Language) -> String {
    format!("(write this content in {})", language.tag())
}

/// One submission as sent to the remote service. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    prompt_text: String,
    variant: BookVariant,
    language: Language,
    owner_id: String,
}

impl GenerationRequest {
    /// Builds the request, appending the language directive to the trimmed prompt.
    pub fn new(
        prompt: &str,
        variant: BookVariant,
        language: Language,
        owner_id: impl Into<String>,
    ) -> Self {
        let prompt_text = format!("{} {}", prompt.trim(), language_directive(language));
        Self {
            prompt_text,
            variant,
            language,
            owner_id: owner_id.into(),
        }
    }

    /// Prompt including the language directive.
    pub fn prompt_text(&self) -> &str {
        &self.prompt_text
    }

    pub fn variant(&self) -> BookVariant {
        self.variant
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn language_tag(&self) -> &'static str {
        self.language.tag()
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    /// Prompt as typed by the user, without the language directive.
    pub fn topic(&self) -> &str {
        let directive = language_directive(self.language);
        self.prompt_text
            .strip_suffix(directive.as_str())
            .map(str::trim_end)
            .unwrap_or(&self.prompt_text)
    }
}
