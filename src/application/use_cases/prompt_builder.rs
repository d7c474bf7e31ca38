//! Prompt construction for scenario generation.
//!
//! One of three templates is chosen from the descriptor's document kind.
//! Long fields are cut down to previews so the prompt stays inside vendor
//! token budgets; the projection is lossy on purpose.

use crate::domain::content::{ContentDescriptor, DocumentKind};
use crate::shared::text::{preview, truncate_chars};
use std::fmt::Write;

/// System message sent alongside every generation prompt.
pub const SYSTEM_PROMPT: &str =
    "You are an expert QA engineer specializing in comprehensive test scenario generation.";

const NOT_AVAILABLE: &str = "N/A";
const NO_MAIN_CONTENT: &str = "No main content available";

const OUTPUT_FORMAT: &str = r#"Please provide test scenarios in the following JSON format:
{
  "testScenarios": [
    {
      "testCaseID": "TS001",
      "testObjective": "Verify login with invalid email and password",
      "testCaseDescription": "A detailed description of the test case, covering the overall scenario including context, preconditions, and expected system behavior.",
      "precondition": "User is on the login page.",
      "steps": [
        "1. Enter invalid email",
        "2. Enter invalid password",
        "3. Click login button"
      ],
      "testData": "invalid_email@test.com, password123",
      "expectedResult": "Error message for invalid credentials.",
      "actualResult": "",
      "status": "NOT RUN",
      "scenarioType": "Negative",
      "priority": "High",
      "comments": "Includes edge cases like empty fields, SQL injection attempts. Also consider account lockout scenarios."
    }
  ],
  "summary": {
    "totalScenarios": 0,
    "functionalTests": 0,
    "edgeCases": 0,
    "priorityBreakdown": {
      "high": 0,
      "medium": 0,
      "low": 0
    }
  }
}

Focus on:
1. Functional test scenarios
2. Edge cases and boundary conditions
3. Negative test cases
4. Error handling scenarios
5. Performance considerations
6. Security aspects
7. Usability tests
8. Integration scenarios

Generate at least 15-20 comprehensive test scenarios."#;

const SPECIFICATION_GOALS: &[&str] = &[
    "Cover all functional requirements mentioned",
    "Test each user story with positive and negative scenarios",
    "Validate all acceptance criteria",
    "Include edge cases for data validation and boundary conditions",
    "Test error handling and exception scenarios",
    "Consider integration points and dependencies",
    "Include performance and security test scenarios",
];

const WEB_APPLICATION_GOALS: &[&str] = &[
    "Test all interactive elements (buttons, links, inputs)",
    "Validate form submissions with valid and invalid data",
    "Test data display and manipulation",
    "Include navigation and user flow testing",
    "Test responsive design and cross-browser compatibility",
    "Include accessibility testing scenarios",
    "Test error handling and validation messages",
    "Include performance testing for data loading",
];

const GENERAL_PAGE_GOALS: &[&str] = &[
    "Test content accuracy and completeness",
    "Validate information presentation and formatting",
    "Test user interaction with available elements",
    "Include content accessibility testing",
    "Test page loading and performance",
    "Validate links and navigation",
    "Test responsive design if applicable",
    "Include content management and update scenarios",
];

pub struct PromptBuilder {
    max_text_chars: usize,
    preview_chars: usize,
    max_requirements: usize,
    max_list_items: usize,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self {
            max_text_chars: 2000,
            preview_chars: 100,
            max_requirements: 5,
            max_list_items: 10,
        }
    }
}

impl PromptBuilder {
    /// Raw content straight from the scraper or a document: JSON objects are
    /// read as descriptors, anything else as plain text.
    pub fn build_from_raw(&self, raw: &str) -> String {
        self.build(&ContentDescriptor::parse(raw))
    }

    pub fn build(&self, content: &ContentDescriptor) -> String {
        let document_type = &content.document_type;
        let mut prompt = String::new();

        writeln!(
            prompt,
            "You are an expert QA engineer. Analyze the following content and generate comprehensive test scenarios including edge cases.\n"
        )
        .unwrap();
        writeln!(prompt, "Document Type: {}", document_type.kind.label()).unwrap();
        writeln!(
            prompt,
            "Confidence: {}",
            document_type.confidence.as_deref().unwrap_or("unknown")
        )
        .unwrap();
        writeln!(
            prompt,
            "Format: {}\n",
            document_type.format.as_deref().unwrap_or("unknown")
        )
        .unwrap();
        writeln!(prompt, "Content to analyze:\n").unwrap();

        match document_type.kind {
            DocumentKind::SoftwareSpecification => self.add_specification(&mut prompt, content),
            DocumentKind::WebApplication => self.add_web_application(&mut prompt, content),
            DocumentKind::GeneralWebPage | DocumentKind::Other(_) => self.add_general_page(&mut prompt, content),
        }

        writeln!(prompt).unwrap();
        prompt.push_str(OUTPUT_FORMAT);
        prompt
    }

    fn add_specification(&self, prompt: &mut String, content: &ContentDescriptor) {
        writeln!(prompt, "SOFTWARE SPECIFICATION DOCUMENT ANALYSIS:\n").unwrap();
        add_title_and_url(prompt, content);

        self.add_section(
            prompt,
            "Requirements Found",
            content.requirements.len(),
            content
                .requirements
                .iter()
                .take(self.max_requirements)
                .map(|req| preview(req, self.preview_chars)),
        );
        self.add_section(
            prompt,
            "Specifications",
            content.specifications.len(),
            content
                .specifications
                .iter()
                .take(self.max_list_items)
                .map(|spec| format!("{}: {}", spec.heading, preview(&spec.content, self.preview_chars))),
        );
        self.add_section(
            prompt,
            "User Stories",
            content.user_stories.len(),
            content
                .user_stories
                .iter()
                .take(self.max_list_items)
                .map(|story| format!("As {}, I want {}, so that {}", story.role, story.want, story.benefit)),
        );
        self.add_section(
            prompt,
            "Acceptance Criteria",
            content.acceptance_criteria.len(),
            content
                .acceptance_criteria
                .iter()
                .take(self.max_list_items)
                .map(|criteria| preview(criteria, self.preview_chars)),
        );
        self.add_section(
            prompt,
            "Test Cases Found",
            content.test_cases.len(),
            content
                .test_cases
                .iter()
                .take(self.max_list_items)
                .map(|case| preview(case, self.preview_chars)),
        );

        self.add_main_content(prompt, content);
        add_goals(prompt, "software specification document", SPECIFICATION_GOALS);
    }

    fn add_web_application(&self, prompt: &mut String, content: &ContentDescriptor) {
        writeln!(prompt, "WEB APPLICATION ANALYSIS:\n").unwrap();
        add_title_and_url(prompt, content);

        self.add_section(
            prompt,
            "Interactive Elements",
            content.interactive_elements.len(),
            content
                .interactive_elements
                .iter()
                .take(self.max_list_items)
                .map(|element| format!("{}: {}", element.element_type, element.label)),
        );
        self.add_section(
            prompt,
            "Forms",
            content.forms.len(),
            content.forms.iter().take(self.max_list_items).map(|form| {
                format!(
                    "Form with {} inputs ({})",
                    form.input_types.len(),
                    form.input_types.join(", ")
                )
            }),
        );
        self.add_section(
            prompt,
            "Data Elements",
            content.data_elements.len(),
            content
                .data_elements
                .iter()
                .take(self.max_list_items)
                .map(|data| format!("{}: {} items", data.element_type, data.item_count)),
        );

        self.add_main_content(prompt, content);
        add_goals(prompt, "web application", WEB_APPLICATION_GOALS);
    }

    fn add_general_page(&self, prompt: &mut String, content: &ContentDescriptor) {
        writeln!(prompt, "GENERAL WEB PAGE ANALYSIS:\n").unwrap();
        add_title_and_url(prompt, content);

        let structure = &content.page_structure;
        writeln!(prompt, "Page Structure:").unwrap();
        writeln!(prompt, "- Headings: {}", structure.headings).unwrap();
        writeln!(prompt, "- Sections: {}", structure.sections).unwrap();
        writeln!(prompt, "- Lists: {}", structure.lists).unwrap();
        writeln!(prompt, "- Tables: {}\n", structure.tables).unwrap();

        self.add_main_content(prompt, content);
        add_goals(prompt, "web page content", GENERAL_PAGE_GOALS);
    }

    /// `label: total` followed by one `- item` line per previewed item.
    fn add_section(
        &self,
        prompt: &mut String,
        label: &str,
        total: usize,
        items: impl Iterator<Item = String>,
    ) {
        writeln!(prompt, "{}: {}", label, total).unwrap();
        for item in items {
            writeln!(prompt, "- {}", item).unwrap();
        }
        writeln!(prompt).unwrap();
    }

    fn add_main_content(&self, prompt: &mut String, content: &ContentDescriptor) {
        let text = content
            .text
            .as_deref()
            .filter(|text| !text.trim().is_empty())
            .map(|text| truncate_chars(text, self.max_text_chars))
            .unwrap_or(NO_MAIN_CONTENT);
        writeln!(prompt, "Main Content:\n{}\n", text).unwrap();
    }
}

fn add_title_and_url(prompt: &mut String, content: &ContentDescriptor) {
    writeln!(prompt, "Title: {}", content.title.as_deref().unwrap_or(NOT_AVAILABLE)).unwrap();
    writeln!(prompt, "URL: {}\n", content.url.as_deref().unwrap_or(NOT_AVAILABLE)).unwrap();
}

fn add_goals(prompt: &mut String, subject: &str, goals: &[&str]) {
    writeln!(
        prompt,
        "Based on this {}, generate granular and detailed test scenarios that:",
        subject
    )
    .unwrap();
    for (idx, goal) in goals.iter().enumerate() {
        writeln!(prompt, "{}. {}", idx + 1, goal).unwrap();
    }
}
