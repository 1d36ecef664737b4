use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Navigation {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub created_by: i64,
}

#[derive(Debug, Clone)]
pub struct NewNavigation {
    pub title: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub created_by: i64,
}

/// Partial navigation update.
///
/// The outer `Option` says whether a column is touched at all; for the
/// nullable columns the inner `None` clears the stored value.
#[derive(Debug, Clone, Default)]
pub struct NavigationChanges {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub url: Option<Option<String>>,
}

impl NavigationChanges {
    pub fn apply(self, navigation: &mut Navigation) {
        if let Some(title) = self.title {
            navigation.title = title;
        }
        if let Some(description) = self.description {
            navigation.description = description;
        }
        if let Some(url) = self.url {
            navigation.url = url;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_touches_only_present_fields() {
        let mut nav = Navigation {
            id: 1,
            title: "old".to_string(),
            description: Some("desc".to_string()),
            url: Some("https://example.com".to_string()),
            created_by: 7,
        };

        NavigationChanges {
            title: Some("new".to_string()),
            description: None,
            url: Some(None),
        }
        .apply(&mut nav);

        assert_eq!(nav.title, "new");
        assert_eq!(nav.description.as_deref(), Some("desc"));
        assert_eq!(nav.url, None);
        assert_eq!(nav.created_by, 7);
    }
}
