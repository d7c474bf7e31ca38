use crate::shared::json_fields::{
    array_field, count_field, non_blank_field, text_field, text_list, value_to_text,
};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DocumentKind {
    SoftwareSpecification,
    WebApplication,
    /// Fallback branch. Keeps the scraper's label when it sent an unrecognized one.
    #[default]
    GeneralWebPage,
    Other(String),
}

impl DocumentKind {
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "software_specification" => DocumentKind::SoftwareSpecification,
            "web_application" => DocumentKind::WebApplication,
            "" | "general_web_page" => DocumentKind::GeneralWebPage,
            other => DocumentKind::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            DocumentKind::SoftwareSpecification => "software_specification",
            DocumentKind::WebApplication => "web_application",
            DocumentKind::GeneralWebPage => "general_web_page",
            DocumentKind::Other(label) => label,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DocumentType {
    pub kind: DocumentKind,
    pub confidence: Option<String>,
    pub format: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Specification {
    pub heading: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct UserStory {
    pub role: String,
    pub want: String,
    pub benefit: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct InteractiveElement {
    pub element_type: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FormSummary {
    pub input_types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataElement {
    pub element_type: String,
    pub item_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageStructure {
    pub headings: usize,
    pub sections: usize,
    pub lists: usize,
    pub tables: usize,
}

/// What the page scraper (or an uploaded document) hands to the prompt builder.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContentDescriptor {
    pub document_type: DocumentType,
    pub title: Option<String>,
    pub url: Option<String>,
    pub text: Option<String>,
    pub requirements: Vec<String>,
    pub specifications: Vec<Specification>,
    pub user_stories: Vec<UserStory>,
    pub acceptance_criteria: Vec<String>,
    pub test_cases: Vec<String>,
    pub interactive_elements: Vec<InteractiveElement>,
    pub forms: Vec<FormSummary>,
    pub data_elements: Vec<DataElement>,
    pub page_structure: PageStructure,
}

impl ContentDescriptor {
    pub fn plain_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Never fails: anything that is not a JSON object is treated as plain text.
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) if value.is_object() => Self::from_value(&value),
            _ => Self::plain_text(raw),
        }
    }

    pub fn from_value(value: &Value) -> Self {
        let document_type = value
            .get("documentType")
            .map(|doc| DocumentType {
                kind: text_field(doc, "type")
                    .map(|label| DocumentKind::from_label(&label))
                    .unwrap_or_default(),
                confidence: non_blank_field(doc, "confidence"),
                format: non_blank_field(doc, "format"),
            })
            .unwrap_or_default();

        let page_structure = value
            .get("pageStructure")
            .map(|structure| PageStructure {
                headings: count_field(structure, "headings"),
                sections: count_field(structure, "sections"),
                lists: count_field(structure, "lists"),
                tables: count_field(structure, "tables"),
            })
            .unwrap_or_default();

        Self {
            document_type,
            title: non_blank_field(value, "title"),
            url: non_blank_field(value, "url"),
            text: non_blank_field(value, "text"),
            requirements: text_list(value, "requirements"),
            specifications: array_field(value, "specifications")
                .iter()
                .map(|spec| Specification {
                    heading: text_field(spec, "heading").unwrap_or_default(),
                    content: text_field(spec, "content").unwrap_or_default(),
                })
                .collect(),
            user_stories: array_field(value, "userStories")
                .iter()
                .map(|story| UserStory {
                    role: text_field(story, "role").unwrap_or_default(),
                    want: text_field(story, "want").unwrap_or_default(),
                    benefit: text_field(story, "benefit").unwrap_or_default(),
                })
                .collect(),
            acceptance_criteria: text_items(value, "acceptanceCriteria"),
            test_cases: text_items(value, "testCases"),
            interactive_elements: array_field(value, "interactiveElements")
                .iter()
                .map(|element| InteractiveElement {
                    element_type: text_field(element, "type").unwrap_or_default(),
                    label: non_blank_field(element, "text")
                        .or_else(|| non_blank_field(element, "name"))
                        .or_else(|| non_blank_field(element, "href"))
                        .unwrap_or_default(),
                })
                .collect(),
            forms: array_field(value, "forms")
                .iter()
                .map(|form| FormSummary {
                    input_types: array_field(form, "inputs")
                        .iter()
                        .map(|input| text_field(input, "type").unwrap_or_else(|| "text".to_string()))
                        .collect(),
                })
                .collect(),
            data_elements: array_field(value, "dataElements")
                .iter()
                .map(|data| DataElement {
                    element_type: text_field(data, "type").unwrap_or_default(),
                    item_count: match count_field(data, "rowCount") {
                        0 => count_field(data, "itemCount"),
                        rows => rows,
                    },
                })
                .collect(),
            page_structure,
        }
    }
}

// Items shaped either as plain strings or as `{ "text": ... }` objects.
fn text_items(value: &Value, key: &str) -> Vec<String> {
    array_field(value, key)
        .iter()
        .filter_map(|item| match item {
            Value::Object(_) => text_field(item, "text"),
            other => value_to_text(other),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_json_input_becomes_plain_text() {
        let descriptor = ContentDescriptor::parse("Login page with email and password");
        assert_eq!(descriptor.document_type.kind, DocumentKind::GeneralWebPage);
        assert_eq!(descriptor.text.as_deref(), Some("Login page with email and password"));
    }

    #[test]
    fn json_scalars_are_also_plain_text() {
        let descriptor = ContentDescriptor::parse("42");
        assert_eq!(descriptor.text.as_deref(), Some("42"));
    }

    #[test]
    fn reads_specification_fields() {
        let raw = r#"{
            "documentType": {"type": "software_specification", "confidence": 0.9},
            "title": "Checkout spec",
            "requirements": ["The system shall accept cards"],
            "userStories": [{"role": "a buyer", "want": "to pay", "benefit": "I get goods"}],
            "acceptanceCriteria": [{"text": "Given a cart"}],
            "testCases": ["TC-1 pay with visa"],
            "text": "body"
        }"#;
        let descriptor = ContentDescriptor::parse(raw);
        assert_eq!(descriptor.document_type.kind, DocumentKind::SoftwareSpecification);
        assert_eq!(descriptor.document_type.confidence.as_deref(), Some("0.9"));
        assert_eq!(descriptor.requirements.len(), 1);
        assert_eq!(descriptor.user_stories[0].want, "to pay");
        assert_eq!(descriptor.acceptance_criteria, vec!["Given a cart".to_string()]);
        assert_eq!(descriptor.test_cases, vec!["TC-1 pay with visa".to_string()]);
    }

    #[test]
    fn reads_web_application_inventories() {
        let raw = r#"{
            "documentType": {"type": "web_application"},
            "interactiveElements": [{"type": "button", "name": "submit"}, {"type": "link", "href": "/home"}],
            "forms": [{"inputs": [{"type": "email"}, {"type": "password"}]}],
            "dataElements": [{"type": "table", "rowCount": 12}, {"type": "list", "itemCount": 4}]
        }"#;
        let descriptor = ContentDescriptor::parse(raw);
        assert_eq!(descriptor.document_type.kind, DocumentKind::WebApplication);
        assert_eq!(descriptor.interactive_elements[0].label, "submit");
        assert_eq!(descriptor.interactive_elements[1].label, "/home");
        assert_eq!(descriptor.forms[0].input_types, vec!["email", "password"]);
        assert_eq!(descriptor.data_elements[0].item_count, 12);
        assert_eq!(descriptor.data_elements[1].item_count, 4);
    }

    #[test]
    fn wrong_types_are_ignored() {
        let raw = r#"{"documentType": "web_application", "requirements": {"x": 1}, "pageStructure": {"headings": [1, 2]}}"#;
        let descriptor = ContentDescriptor::parse(raw);
        assert_eq!(descriptor.document_type.kind, DocumentKind::GeneralWebPage);
        assert!(descriptor.requirements.is_empty());
        assert_eq!(descriptor.page_structure.headings, 2);
    }

    #[test]
    fn unknown_document_type_keeps_label() {
        let kind = DocumentKind::from_label("blog_post");
        assert_eq!(kind.label(), "blog_post");
    }
}
