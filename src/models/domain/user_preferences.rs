use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct UserPreferences {
    pub user_id: String,
    pub main_language: Option<String>,
    pub learning_language: Option<String>,
    pub language_level: Option<String>,
    #[serde(default)]
    pub preferred_categories: Vec<String>,
}

impl UserPreferences {
    pub fn new(user_id: &str, main_language: &str, learning_language: &str, level: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            main_language: Some(main_language.to_string()),
            learning_language: Some(learning_language.to_string()),
            language_level: Some(level.to_string()),
            preferred_categories: Vec::new(),
        }
    }

    pub fn with_categories(mut self, categories: &[&str]) -> Self {
        self.preferred_categories = categories.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Language pair and level needed to adapt new content, if all are known.
    pub fn adaptation_target(&self) -> Option<AdaptationTarget> {
        Some(AdaptationTarget {
            main_language: self.main_language.clone()?,
            learning_language: self.learning_language.clone()?,
            level: self.language_level.clone()?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdaptationTarget {
    pub main_language: String,
    pub learning_language: String,
    pub level: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adaptation_target_requires_every_field() {
        let prefs = UserPreferences::new("u1", "en", "de", "B1");
        let target = prefs.adaptation_target().expect("complete preferences");
        assert_eq!(target.learning_language, "de");

        let partial = UserPreferences {
            language_level: None,
            ..prefs
        };
        assert!(partial.adaptation_target().is_none());
    }

    #[test]
    fn missing_categories_deserialize_as_empty() {
        let prefs: UserPreferences =
            serde_json::from_str(r#"{"user_id":"u1","main_language":"en"}"#).unwrap();
        assert!(prefs.preferred_categories.is_empty());
        assert!(prefs.learning_language.is_none());
    }
}
