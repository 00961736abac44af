use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum ThemeLayout {
    #[default]
    Vertical,
    Horizontal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum ContentWidth {
    #[default]
    Full,
    Boxed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct ThemeConfig {
    pub primary_color: String,
    pub mode: ThemeMode,
    pub layout: ThemeLayout,
    pub content_width: ContentWidth,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            primary_color: "#696cff".to_string(),
            mode: ThemeMode::Light,
            layout: ThemeLayout::Vertical,
            content_width: ContentWidth::Full,
        }
    }
}

/// Partial theme update; unset fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemePatch {
    pub primary_color: Option<String>,
    pub mode: Option<ThemeMode>,
    pub layout: Option<ThemeLayout>,
    pub content_width: Option<ContentWidth>,
}

impl ThemeConfig {
    pub fn apply(&mut self, patch: ThemePatch) {
        if let Some(color) = patch.primary_color {
            self.primary_color = color;
        }
        if let Some(mode) = patch.mode {
            self.mode = mode;
        }
        if let Some(layout) = patch.layout {
            self.layout = layout;
        }
        if let Some(width) = patch.content_width {
            self.content_width = width;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct NavItem {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NavItem>,
    /// Roles allowed to see this item; empty means everyone.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub permissions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl NavItem {
    pub fn link(id: &str, label: &str, route: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            icon: None,
            route: Some(route.to_string()),
            children: Vec::new(),
            permissions: Vec::new(),
            is_active: None,
        }
    }

    pub fn visible_to(&self, user: Option<&User>) -> bool {
        if self.permissions.is_empty() {
            return true;
        }
        user.map(|u| u.has_any_role(self.permissions.as_slice())).unwrap_or(false)
    }
}

/// Keep the items `user` may see, pruning children the same way.
pub fn visible_navigation(items: &[NavItem], user: Option<&User>) -> Vec<NavItem> {
    items
        .iter()
        .filter(|item| item.visible_to(user))
        .map(|item| NavItem {
            children: visible_navigation(&item.children, user),
            ..item.clone()
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub app_id: String,
    pub app_name: String,
    pub logo_url: String,
    pub theme: ThemeConfig,
    #[serde(default)]
    pub navigation: Vec<NavItem>,
    #[serde(default)]
    pub feature_flags: HashMap<String, bool>,
    pub page_size: u32,
}

impl AppConfig {
    /// Built-in configuration used when the backend cannot provide one.
    pub fn fallback(app_id: &str) -> Self {
        Self {
            app_id: app_id.to_string(),
            app_name: "VicBts".to_string(),
            logo_url: "/assets/logo.svg".to_string(),
            theme: ThemeConfig::default(),
            navigation: vec![
                NavItem::link("home", "Home", "/"),
                NavItem::link("services", "Services", "/services"),
                NavItem::link("contact", "Contact", "/contact"),
                NavItem::link("about", "About", "/about"),
            ],
            feature_flags: HashMap::new(),
            page_size: 20,
        }
    }

    pub fn is_feature_enabled(&self, name: &str) -> bool {
        self.feature_flags.get(name).copied().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_role(role: &str) -> User {
        serde_json::from_value(serde_json::json!({
            "id": "u1",
            "email": "u1@example.com",
            "role": role
        }))
        .unwrap()
    }

    #[test]
    fn test_parse_app_config() {
        let json = r##"{
            "appId": "admin",
            "appName": "Admin Portal",
            "logoUrl": "/logo.png",
            "theme": {"primaryColor": "#111111", "mode": "dark", "layout": "horizontal", "contentWidth": "boxed"},
            "navigation": [{"id": "users", "label": "Users", "route": "/users", "permissions": ["admin"]}],
            "featureFlags": {"betaDashboard": true},
            "pageSize": 50
        }"##;
        let config: AppConfig = serde_json::from_str(json).expect("Failed to parse app config");
        assert_eq!(config.theme.mode, ThemeMode::Dark);
        assert_eq!(config.theme.content_width, ContentWidth::Boxed);
        assert_eq!(config.navigation[0].permissions, vec!["admin"]);
        assert!(config.is_feature_enabled("betaDashboard"));
        assert!(!config.is_feature_enabled("missing"));
        assert_eq!(config.page_size, 50);
    }

    #[test]
    fn test_fallback_config() {
        let config = AppConfig::fallback("public-web");
        assert_eq!(config.app_id, "public-web");
        assert_eq!(config.page_size, 20);
        assert_eq!(config.theme.primary_color, "#696cff");
        let ids: Vec<&str> = config.navigation.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["home", "services", "contact", "about"]);
        assert!(config.feature_flags.is_empty());
    }

    #[test]
    fn test_theme_patch_keeps_unset_fields() {
        let mut theme = ThemeConfig::default();
        theme.apply(ThemePatch {
            mode: Some(ThemeMode::Dark),
            ..Default::default()
        });
        assert_eq!(theme.mode, ThemeMode::Dark);
        assert_eq!(theme.primary_color, "#696cff");
        assert_eq!(theme.layout, ThemeLayout::Vertical);
    }

    #[test]
    fn test_visible_navigation_filters_by_role() {
        let mut admin_only = NavItem::link("users", "Users", "/users");
        admin_only.permissions = vec!["admin".to_string()];

        let mut settings = NavItem::link("settings", "Settings", "/settings");
        settings.children = vec![admin_only.clone(), NavItem::link("profile", "Profile", "/profile")];

        let items = vec![NavItem::link("home", "Home", "/"), admin_only, settings];

        let anonymous = visible_navigation(&items, None);
        assert_eq!(anonymous.len(), 2);
        assert_eq!(anonymous[1].children.len(), 1);
        assert_eq!(anonymous[1].children[0].id, "profile");

        let admin = user_with_role("admin");
        let visible = visible_navigation(&items, Some(&admin));
        assert_eq!(visible.len(), 3);
        assert_eq!(visible[2].children.len(), 2);
    }
}
