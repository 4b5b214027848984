//! Canonical default document
//!
//! Every fetched document is hydrated against this template, so after
//! loading every property the renderer reads has a value. The backend also
//! serves it for slots that have never been written.

use crate::ConfigDocument;
use serde_json::json;

pub fn default_document() -> ConfigDocument {
    let value = json!({
        "header": {
            "logoText": "My Portfolio",
            "logoImage": null,
            "sticky": true,
            "transparent": false,
            "navLinks": [
                { "label": "Work", "href": "#gallery" },
                { "label": "About", "href": "#about" },
                { "label": "Contact", "href": "#contact" }
            ],
            "height": 72
        },
        "hero": {
            "title": "Hello, I make things",
            "subtitle": "Designer & developer",
            "ctaText": "See my work",
            "ctaLink": "#gallery",
            "backgroundImage": null,
            "overlayOpacity": 0.4,
            "alignment": "center",
            "titleSize": 64,
            "subtitleSize": 24,
            "minHeight": "100vh"
        },
        "gallery": {
            "title": "Selected work",
            "layout": "grid",
            "columns": 3,
            "gap": 16,
            "aspectRatio": "4:3",
            "showCaptions": true,
            "items": []
        },
        "footer": {
            "text": "© My Portfolio",
            "showSocial": true,
            "socialLinks": [],
            "alignment": "center"
        },
        "theme": {
            "primaryColor": "#3366ff",
            "secondaryColor": "#ff6b6b",
            "backgroundColor": "#0f0f13",
            "textColor": "#f5f5f7",
            "headingFont": "Inter",
            "bodyFont": "Inter",
            "borderRadius": 8,
            "mode": "dark"
        },
        "effects": {
            "particles": {
                "enabled": false,
                "count": 80,
                "color": "#ffffff",
                "speed": 1.0
            },
            "cursorTrail": {
                "enabled": false,
                "color": "#3366ff",
                "length": 12
            },
            "grain": {
                "enabled": false,
                "opacity": 0.08
            },
            "scrollReveal": true
        }
    });

    // The literal above is an object, so this never falls through
    ConfigDocument::from_value(value).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::OVERRIDE_SECTIONS;

    #[test]
    fn test_default_document_has_all_sections() {
        let doc = default_document();
        for section in ["header", "hero", "gallery", "footer", "theme", "effects"] {
            assert!(doc.section(section).is_some(), "missing section {}", section);
        }
    }

    #[test]
    fn test_default_document_carries_no_overrides() {
        let doc = default_document();
        for section in OVERRIDE_SECTIONS {
            let value = doc.section(section).unwrap().as_object().unwrap();
            assert!(!value.contains_key("tablet"));
            assert!(!value.contains_key("mobile"));
        }
    }
}
