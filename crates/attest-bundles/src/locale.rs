use std::fmt;

/// A locale split into its lookup parts.
///
/// Tags are accepted in both `de_CH` and `de-CH` spelling; [`Locale::tag`]
/// always renders the underscore form used in bundle file names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Locale {
    pub language: String,
    pub country: String,
    pub variant: String,
}

impl Locale {
    /// The default (root) locale, tag `""`.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn parse(tag: &str) -> Self {
        let mut parts = tag.trim().splitn(3, ['_', '-']);
        let language = parts.next().unwrap_or_default().to_ascii_lowercase();
        let country = parts.next().unwrap_or_default().to_ascii_uppercase();
        let variant = parts.next().unwrap_or_default().to_string();
        Self {
            language,
            country,
            variant,
        }
    }

    pub fn is_root(&self) -> bool {
        self.language.is_empty() && self.country.is_empty() && self.variant.is_empty()
    }

    /// Canonical tag: `de_CH_POSIX`, `de_CH`, `de`, `_CH`, or `""`.
    pub fn tag(&self) -> String {
        match (self.country.is_empty(), self.variant.is_empty()) {
            (true, true) => self.language.clone(),
            (false, true) => format!("{}_{}", self.language, self.country),
            (_, false) => format!("{}_{}_{}", self.language, self.country, self.variant),
        }
    }

    /// Lookup order, most specific first, ending with the root locale.
    pub fn candidates(&self) -> Vec<Locale> {
        let mut out = Vec::with_capacity(4);
        if !self.variant.is_empty() {
            out.push(self.clone());
        }
        if !self.country.is_empty() {
            out.push(Locale {
                variant: String::new(),
                ..self.clone()
            });
        }
        if !self.language.is_empty() {
            out.push(Locale {
                language: self.language.clone(),
                ..Locale::root()
            });
        }
        out.push(Locale::root());
        out
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag())
    }
}
