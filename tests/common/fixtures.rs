/// A small repository: three units in several versions plus one feature.
pub fn repository_json() -> &'static str {
    r#"[
        { "kind": "unit", "id": "org.example.core", "version": "1.0.0", "name": "%core.name" },
        { "kind": "unit", "id": "org.example.ui", "version": "1.0.0", "name": "UI" },
        { "kind": "unit", "id": "org.example.core", "version": "1.2.0", "name": "%core.name" },
        { "kind": "feature", "id": "org.example.feature", "version": "3.0.0" },
        { "kind": "unit", "id": "com.other.tool", "version": "0.9.0" },
        { "kind": "unit", "id": "org.example.core", "version": "2.0.0.beta", "name": "%core.name" },
        { "kind": "unit", "id": "org.example.ui", "version": "1.1.0", "name": "UI" }
    ]"#
}

pub fn translations_json() -> &'static str {
    r#"{
        "en": { "core.name": "Core Runtime" },
        "de": { "core.name": "Kernlaufzeit" }
    }"#
}
