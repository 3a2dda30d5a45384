//! Function registry.
//!
//! The functions the model may call, with hand-maintained argument schemas.
//! The registry is built once at startup and shared read-only by every
//! session.

use crate::error::RegistryError;
use serde::Serialize;
use serde_json::{Value as JsonValue, json};
use std::collections::HashSet;

/// Description of one callable function, in the shape the chat-completion
/// endpoint expects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: JsonValue,
}

impl FunctionDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: JsonValue,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// The language-learning operations exposed to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LanguageFunction {
    TranslateOrLookup,
    Transliterate,
    Breakdown,
    Pronounce,
}

impl LanguageFunction {
    pub const ALL: [LanguageFunction; 4] = [
        Self::TranslateOrLookup,
        Self::Transliterate,
        Self::Breakdown,
        Self::Pronounce,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::TranslateOrLookup => "translate_or_lookup",
            Self::Transliterate => "transliterate",
            Self::Breakdown => "breakdown",
            Self::Pronounce => "pronounce",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::TranslateOrLookup => {
                "Translate or do a dictionary lookup for input text from source language to target language"
            }
            Self::Transliterate => "Transliterate the input text in the given language",
            Self::Breakdown => "Breakdown the given sentence into words",
            Self::Pronounce => {
                "Pronounce input text in the given language (generate text to speech audio)"
            }
        }
    }

    /// JSON schema of the function's argument object.
    pub fn parameters(&self) -> JsonValue {
        let input_text = json!({
            "type": "string",
            "description": "text to process, in the original language"
        });
        let language = json!({
            "type": "string",
            "description": "language code of the input text, e.g. fr, zh-CN, zh-HK, yue"
        });
        let service = json!({
            "type": "string",
            "description": "name of the service to use (Azure, Google, Amazon, ...), only if the user asks for one"
        });

        match self {
            Self::TranslateOrLookup => json!({
                "type": "object",
                "properties": {
                    "input_text": input_text,
                    "source_language": {
                        "type": "string",
                        "description": "language code of the input text"
                    },
                    "target_language": {
                        "type": "string",
                        "description": "language code to translate into"
                    },
                    "service": service,
                },
                "required": ["input_text", "source_language", "target_language"],
            }),
            Self::Transliterate => json!({
                "type": "object",
                "properties": {
                    "input_text": input_text,
                    "language": language,
                    "service": service,
                },
                "required": ["input_text", "language"],
            }),
            Self::Breakdown => json!({
                "type": "object",
                "properties": {
                    "input_text": input_text,
                    "language": language,
                    "translation_service": service,
                    "transliteration_service": service,
                },
                "required": ["input_text", "language"],
            }),
            Self::Pronounce => json!({
                "type": "object",
                "properties": {
                    "input_text": input_text,
                    "language": language,
                    "service": service,
                    "gender": {
                        "type": "string",
                        "enum": ["male", "female"],
                        "description": "voice gender, only if the user asks for one"
                    },
                },
                "required": ["input_text", "language"],
            }),
        }
    }

    pub fn descriptor(&self) -> FunctionDescriptor {
        FunctionDescriptor::new(self.name(), self.description(), self.parameters())
    }
}

/// An immutable, validated set of function descriptors.
#[derive(Debug, Clone)]
pub struct FunctionRegistry {
    functions: Vec<FunctionDescriptor>,
}

impl FunctionRegistry {
    /// Validates and builds a registry. Names must be unique and non-empty,
    /// descriptions non-empty.
    pub fn new(functions: Vec<FunctionDescriptor>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::new();
        for function in &functions {
            if function.name.trim().is_empty() {
                return Err(RegistryError::EmptyName);
            }
            if function.description.trim().is_empty() {
                return Err(RegistryError::EmptyDescription(function.name.clone()));
            }
            if !seen.insert(function.name.as_str()) {
                return Err(RegistryError::DuplicateName(function.name.clone()));
            }
        }
        Ok(Self { functions })
    }

    /// The registry of all language-learning functions.
    pub fn language_functions() -> Result<Self, RegistryError> {
        Self::new(
            LanguageFunction::ALL
                .iter()
                .map(LanguageFunction::descriptor)
                .collect(),
        )
    }

    pub fn descriptors(&self) -> &[FunctionDescriptor] {
        &self.functions
    }
}

#[cfg(test)]
impl FunctionRegistry {
    fn get(&self, name: &str) -> Option<&FunctionDescriptor> {
        self.functions.iter().find(|f| f.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_registry_is_valid() {
        let registry = FunctionRegistry::language_functions().unwrap();
        assert_eq!(registry.descriptors().len(), 4);
        assert!(registry.get("pronounce").is_some());
        assert!(registry.get("speak").is_none());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = FunctionRegistry::new(vec![
            LanguageFunction::Breakdown.descriptor(),
            LanguageFunction::Breakdown.descriptor(),
        ])
        .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateName("breakdown".to_string()));
    }

    #[test]
    fn empty_description_is_rejected() {
        let err = FunctionRegistry::new(vec![FunctionDescriptor::new("noop", "  ", json!({}))])
            .unwrap_err();
        assert_eq!(err, RegistryError::EmptyDescription("noop".to_string()));
    }

    #[test]
    fn empty_name_is_rejected() {
        let err = FunctionRegistry::new(vec![FunctionDescriptor::new("", "does nothing", json!({}))])
            .unwrap_err();
        assert_eq!(err, RegistryError::EmptyName);
    }

    #[test]
    fn names_round_trip() {
        for function in LanguageFunction::ALL {
            assert_eq!(LanguageFunction::from_name(function.name()), Some(function));
        }
    }

    #[test]
    fn schemas_require_input_text() {
        for function in LanguageFunction::ALL {
            let required = function.parameters()["required"].clone();
            assert!(
                required.as_array().unwrap().contains(&json!("input_text")),
                "{} must require input_text",
                function.name()
            );
        }
    }
}
