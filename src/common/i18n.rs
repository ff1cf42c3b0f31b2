// src/common/i18n.rs

use std::collections::HashMap;

use anyhow::Context;

pub const DEFAULT_LANG: &str = "id";
const FALLBACK_LANG: &str = "en";

// Os catálogos vão embutidos no binário; não dependemos do diretório de trabalho.
const CATALOGS: [(&str, &str); 3] = [
    ("id", include_str!("../../locales/id.json")),
    ("en", include_str!("../../locales/en.json")),
    ("pt", include_str!("../../locales/pt.json")),
];

/// Mensagens traduzidas por idioma (`lang -> chave -> texto`).
#[derive(Debug, Clone, Default)]
pub struct I18nStore {
    messages: HashMap<String, HashMap<String, String>>,
}

impl I18nStore {
    pub fn load_embedded() -> anyhow::Result<Self> {
        let mut messages = HashMap::new();
        for (lang, raw) in CATALOGS {
            let catalog: HashMap<String, String> = serde_json::from_str(raw)
                .with_context(|| format!("Catálogo de mensagens '{lang}' inválido"))?;
            messages.insert(lang.to_string(), catalog);
        }
        Ok(Self { messages })
    }

    /// Busca no idioma pedido, depois em inglês; sem tradução devolve a própria chave.
    pub fn translate(&self, lang: &str, key: &str) -> String {
        [lang, FALLBACK_LANG]
            .iter()
            .find_map(|l| self.messages.get(*l).and_then(|m| m.get(key)))
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    pub fn translate_with(&self, lang: &str, key: &str, detail: Option<&str>) -> String {
        let message = self.translate(lang, key);
        match detail {
            Some(d) => message.replace("{detail}", d),
            None => message.replace(": {detail}", "").replace("{detail}", ""),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_catalog_has_the_same_keys() {
        let store = I18nStore::load_embedded().unwrap();
        let reference = &store.messages[FALLBACK_LANG];

        for (lang, catalog) in &store.messages {
            for key in reference.keys() {
                assert!(catalog.contains_key(key), "'{lang}' sem a chave '{key}'");
            }
        }
    }

    #[test]
    fn falls_back_to_english_then_key() {
        let store = I18nStore::load_embedded().unwrap();

        assert_eq!(store.translate("fr", "error.invalid_token"), "Authentication token is invalid or missing.");
        assert_eq!(store.translate("id", "unknown.key"), "unknown.key");
    }

    #[test]
    fn strips_placeholder_without_detail() {
        let store = I18nStore::load_embedded().unwrap();

        assert_eq!(store.translate_with("en", "error.not_found", None), "Resource not found");
        assert_eq!(
            store.translate_with("pt", "error.conflict", Some("slug")),
            "Registro já existe: slug"
        );
    }
}
