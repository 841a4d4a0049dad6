// Canonical column vocabulary and alias table.
//
// The built-in table is process-wide and immutable. Callers that need a
// different vocabulary build their own `Vocabulary` and pass it explicitly.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;

use crate::field::CanonicalField;
use crate::text::normalize;

/// One alias: a normalized header phrase that resolves to a canonical field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasEntry {
    pub phrase: String,
    pub field: CanonicalField,
}

/// Known header spellings per canonical field, plus an alias table.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    /// Normalized surface forms in first-seen order (fuzzy matching is order sensitive on ties).
    surface_forms: Vec<(String, CanonicalField)>,
    aliases: BTreeMap<String, CanonicalField>,
}

const BUILTIN_SURFACE_FORMS: &[(&str, CanonicalField)] = &[
    ("Código", CanonicalField::Code),
    ("Denominación de OEI", CanonicalField::NameText),
    ("Indicador", CanonicalField::Indicator),
    ("Denominación", CanonicalField::NameText),
    ("OBJETIVOS ESTRATÉGICOS INSTITUCIONALES", CanonicalField::NameText),
    ("NOMBRE DEL INDICADOR", CanonicalField::Indicator),
    ("ACCIONES ESTRATÉGICAS INSTITUCIONALES", CanonicalField::NameText),
    ("CODIGO", CanonicalField::Code),
    ("OEI", CanonicalField::Code),
    ("AEI", CanonicalField::Code),
    ("OBJETIVOS ESTRATÉGICOS INSTITUCIONAL", CanonicalField::NameText),
    ("Denominación del OEI/AEI", CanonicalField::NameText),
    ("Denominación del OEI / AEI", CanonicalField::NameText),
    ("Denominación de OEI / AEI / AO", CanonicalField::NameText),
    ("Denominación de AEI", CanonicalField::NameText),
    ("Descripción", CanonicalField::Description),
    ("Nombre del Indicador", CanonicalField::Indicator),
    ("OEI/AEI", CanonicalField::Code),
    ("Nombre", CanonicalField::NameText),
    ("Enunciado y Indicador", CanonicalField::NameText),
];

const BUILTIN_ALIASES: &[(&str, CanonicalField)] = &[
    ("cod", CanonicalField::Code),
    ("cod oei", CanonicalField::Code),
    ("cod aei", CanonicalField::Code),
    ("nombre indicador", CanonicalField::Indicator),
    ("objetivo estrategico", CanonicalField::NameText),
    ("objetivo estrategico institucional", CanonicalField::NameText),
    ("accion estrategica", CanonicalField::NameText),
    ("accion estrategica institucional", CanonicalField::NameText),
    ("enunciado e indicador", CanonicalField::NameText),
    ("descripcion del indicador", CanonicalField::Description),
];

static BUILTIN: Lazy<Vocabulary> = Lazy::new(|| {
    let mut vocab = Vocabulary::new();
    for (raw, field) in BUILTIN_SURFACE_FORMS {
        vocab.add_surface_form(raw, *field);
    }
    for (raw, field) in BUILTIN_ALIASES {
        vocab.add_alias(raw, *field);
    }
    vocab
});

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide default table.
    pub fn builtin() -> &'static Vocabulary {
        &BUILTIN
    }

    /// Register a header spelling. Duplicate normalized forms keep their first field.
    pub fn add_surface_form(&mut self, raw: &str, field: CanonicalField) {
        let norm = normalize(raw);
        if norm.is_empty() || self.surface_forms.iter().any(|(s, _)| *s == norm) {
            return;
        }
        self.surface_forms.push((norm, field));
    }

    /// Register or overwrite an alias.
    pub fn add_alias(&mut self, raw: &str, field: CanonicalField) {
        let norm = normalize(raw);
        if !norm.is_empty() {
            self.aliases.insert(norm, field);
        }
    }

    /// Copy of this vocabulary with extra aliases layered on top.
    pub fn extended<'a, I>(&self, aliases: I) -> Vocabulary
    where
        I: IntoIterator<Item = (&'a str, CanonicalField)>,
    {
        let mut vocab = self.clone();
        for (raw, field) in aliases {
            vocab.add_alias(raw, field);
        }
        vocab
    }

    /// Exact alias lookup on a normalized phrase.
    pub fn alias(&self, normalized: &str) -> Option<CanonicalField> {
        self.aliases.get(normalized).copied()
    }

    /// Exact surface-form lookup on a normalized phrase.
    pub fn surface(&self, normalized: &str) -> Option<CanonicalField> {
        self.surface_forms
            .iter()
            .find(|(s, _)| s == normalized)
            .map(|(_, f)| *f)
    }

    pub fn surface_forms(&self) -> impl Iterator<Item = (&str, CanonicalField)> {
        self.surface_forms.iter().map(|(s, f)| (s.as_str(), *f))
    }

    pub fn alias_entries(&self) -> Vec<AliasEntry> {
        self.aliases
            .iter()
            .map(|(phrase, field)| AliasEntry { phrase: phrase.clone(), field: *field })
            .collect()
    }

    /// Normalized surface forms registered for one field.
    pub fn forms_for(&self, field: CanonicalField) -> Vec<&str> {
        self.surface_forms
            .iter()
            .filter(|(_, f)| *f == field)
            .map(|(s, _)| s.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_forms_are_normalized_and_deduplicated() {
        let vocab = Vocabulary::builtin();
        let forms: Vec<&str> = vocab.surface_forms().map(|(s, _)| s).collect();
        for form in &forms {
            assert_eq!(&normalize(form), form);
        }
        let count = forms.iter().filter(|f| **f == "denominacion del oei aei").count();
        assert_eq!(count, 1);
        // "CODIGO" and "Código" collapse to one entry
        assert_eq!(forms.iter().filter(|f| **f == "codigo").count(), 1);
    }

    #[test]
    fn lookups() {
        let vocab = Vocabulary::builtin();
        assert_eq!(vocab.surface("codigo"), Some(CanonicalField::Code));
        assert_eq!(vocab.surface("denominacion de oei aei ao"), Some(CanonicalField::NameText));
        assert_eq!(vocab.surface("nombre del indicador"), Some(CanonicalField::Indicator));
        assert_eq!(vocab.alias("cod"), Some(CanonicalField::Code));
        assert_eq!(vocab.alias("codigo"), None);
        assert_eq!(vocab.surface("meta"), None);
    }

    #[test]
    fn extended_does_not_touch_builtin() {
        let vocab = Vocabulary::builtin().extended([("Meta al 2027", CanonicalField::Description)]);
        assert_eq!(vocab.alias("meta al 2027"), Some(CanonicalField::Description));
        assert_eq!(Vocabulary::builtin().alias("meta al 2027"), None);
    }

    #[test]
    fn empty_phrases_are_ignored() {
        let mut vocab = Vocabulary::new();
        vocab.add_alias(" / ", CanonicalField::Code);
        vocab.add_surface_form("", CanonicalField::Code);
        assert!(vocab.alias_entries().is_empty());
        assert_eq!(vocab.surface_forms().count(), 0);
    }

    #[test]
    fn forms_for_field() {
        let forms = Vocabulary::builtin().forms_for(CanonicalField::Description);
        assert_eq!(forms, vec!["descripcion"]);
    }
}
