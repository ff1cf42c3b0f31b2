// src/common/patch.rs

use serde::{Deserialize, Deserializer};

use crate::common::error::AppError;

// ---
// Campo "tri-state" para PATCH
// ---
// Ausente  -> não altera
// null     -> limpa a coluna
// valor    -> sobrescreve
//
// Use sempre com `#[serde(default)]`: o serde só chama `deserialize`
// quando a chave existe no JSON, então a ausência cai no `Default`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    Missing,
    Null,
    Value(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Missing
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(|value| match value {
            Some(v) => Patch::Value(v),
            None => Patch::Null,
        })
    }
}

impl<T> Patch<T> {
    pub fn is_missing(&self) -> bool {
        matches!(self, Patch::Missing)
    }

    pub fn as_value(&self) -> Option<&T> {
        match self {
            Patch::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Patch<U> {
        match self {
            Patch::Missing => Patch::Missing,
            Patch::Null => Patch::Null,
            Patch::Value(v) => Patch::Value(f(v)),
        }
    }

    /// Par `(alterar?, novo_valor)` para o padrão
    /// `col = CASE WHEN $n THEN $m ELSE col END` dos repositórios.
    pub fn into_update(self) -> (bool, Option<T>) {
        match self {
            Patch::Missing => (false, None),
            Patch::Null => (true, None),
            Patch::Value(v) => (true, Some(v)),
        }
    }

    /// Para colunas NOT NULL: `null` é erro de validação.
    pub fn require_value(self, field: &str) -> Result<Option<T>, AppError> {
        match self {
            Patch::Missing => Ok(None),
            Patch::Null => Err(AppError::InvalidParam(format!("{field} não pode ser null"))),
            Patch::Value(v) => Ok(Some(v)),
        }
    }
}

impl Patch<String> {
    /// Remove espaços nas pontas; string vazia continua sendo um valor.
    pub fn trimmed(self) -> Patch<String> {
        self.map(|s| s.trim().to_string())
    }

    /// Como `trimmed`, mas string vazia vira `Null` (limpa a coluna).
    pub fn blank_as_null(self) -> Patch<String> {
        match self.trimmed() {
            Patch::Value(v) if v.is_empty() => Patch::Null,
            other => other,
        }
    }

    /// Mesmo limite do `length(max = ..)` dos payloads de criação.
    pub fn max_chars(self, field: &str, max: usize) -> Result<Patch<String>, AppError> {
        match &self {
            Patch::Value(v) if v.chars().count() > max => Err(AppError::InvalidParam(field.to_string())),
            _ => Ok(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Payload {
        #[serde(default)]
        bio: Patch<String>,
        #[serde(default)]
        age: Patch<i32>,
    }

    #[test]
    fn distinguishes_missing_null_and_value() {
        let missing: Payload = serde_json::from_value(json!({})).unwrap();
        let null: Payload = serde_json::from_value(json!({ "bio": null })).unwrap();
        let value: Payload = serde_json::from_value(json!({ "bio": "hi", "age": 3 })).unwrap();

        assert_eq!(missing.bio, Patch::Missing);
        assert_eq!(null.bio, Patch::Null);
        assert_eq!(null.age, Patch::Missing);
        assert_eq!(value.bio, Patch::Value("hi".to_string()));
        assert_eq!(value.age, Patch::Value(3));
    }

    #[test]
    fn blank_strings_clear_the_column() {
        assert_eq!(Patch::Value("   ".to_string()).blank_as_null(), Patch::Null);
        assert_eq!(Patch::Value(" x ".to_string()).blank_as_null(), Patch::Value("x".to_string()));
        assert_eq!(Patch::<String>::Missing.blank_as_null(), Patch::Missing);
    }

    #[test]
    fn max_chars_counts_characters_not_bytes() {
        assert!(Patch::Value("ä".repeat(3)).max_chars("code", 3).is_ok());
        assert!(Patch::Value("abcd".to_string()).max_chars("code", 3).is_err());
        assert!(Patch::<String>::Null.max_chars("code", 0).is_ok());
    }

    #[test]
    fn into_update_flags_only_present_fields() {
        assert_eq!(Patch::<i32>::Missing.into_update(), (false, None));
        assert_eq!(Patch::<i32>::Null.into_update(), (true, None));
        assert_eq!(Patch::Value(5).into_update(), (true, Some(5)));
    }

    #[test]
    fn require_value_rejects_null() {
        assert!(Patch::<String>::Null.require_value("name").is_err());
        assert_eq!(Patch::<String>::Missing.require_value("name").unwrap(), None);
        assert_eq!(
            Patch::Value("x".to_string()).require_value("name").unwrap(),
            Some("x".to_string())
        );
    }
}
