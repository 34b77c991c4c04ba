use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::FlowResult;
use crate::storage::{Store, THEME_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn load(store: &Store) -> FlowResult<Theme> {
        Ok(store.get(THEME_KEY)?.unwrap_or_default())
    }

    pub fn toggle(store: &Store) -> FlowResult<Theme> {
        let next = match Theme::load(store)? {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        };
        store.set(THEME_KEY, &next)?;
        Ok(next)
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Light => f.write_str("light"),
            Theme::Dark => f.write_str("dark"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_light_and_toggle_persists() {
        let store = Store::open_in_memory().unwrap();
        assert_eq!(Theme::load(&store).unwrap(), Theme::Light);
        assert_eq!(Theme::toggle(&store).unwrap(), Theme::Dark);
        assert_eq!(Theme::load(&store).unwrap(), Theme::Dark);
        assert_eq!(store.get::<String>(THEME_KEY).unwrap().as_deref(), Some("dark"));
    }
}
