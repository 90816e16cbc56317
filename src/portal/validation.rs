use super::categories::{ActiveFlags, CategoryRegistry};
use super::form::FormState;
use regex::Regex;
use std::sync::OnceLock;

pub const EMAIL_REQUIRED: &str = "Email address is required";
pub const EMAIL_INVALID: &str = "Please enter a valid email address";
pub const TITLE_REQUIRED: &str = "Project title is required";

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
    })
}

pub fn category_required_message(label: &str) -> String {
    format!("{} is required", label)
}

/// Outcome of a validation pass. Only `errors` block submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

pub fn is_valid_email(email: &str) -> bool {
    email_pattern().is_match(email)
}

/// Checks email, title and every category's requirement rule, in that order.
pub fn validate(
    form: &FormState,
    categories: &CategoryRegistry,
    flags: &ActiveFlags,
) -> ValidationReport {
    let mut report = ValidationReport::default();

    if form.email.trim().is_empty() {
        report.errors.push(EMAIL_REQUIRED.to_string());
    } else if !is_valid_email(&form.email) {
        report.errors.push(EMAIL_INVALID.to_string());
    }

    if form.project_title.trim().is_empty() {
        report.errors.push(TITLE_REQUIRED.to_string());
    }

    for category in categories.iter() {
        if category.is_required(flags) && category.files.is_empty() {
            report
                .errors
                .push(category_required_message(category.label()));
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::{AttachedFile, FileFilter};
    use pretty_assertions::assert_eq;

    fn valid_form() -> FormState {
        FormState {
            email: "researcher@uni-frankfurt.de".to_string(),
            uploader_name: "Dr. Max Mustermann".to_string(),
            project_title: "Compliance study".to_string(),
            project_details: String::new(),
            is_prospective_study: false,
        }
    }

    fn filled_registry(skip: &[&str]) -> CategoryRegistry {
        let mut registry = CategoryRegistry::default();
        let filter = FileFilter::default();
        let keys: Vec<String> = registry
            .iter()
            .map(|c| c.key().to_string())
            .filter(|k| !skip.contains(&k.as_str()))
            .collect();
        for key in keys {
            registry
                .add_files(&key, vec![AttachedFile::new(format!("/d/{key}.pdf"), 10)], &filter)
                .unwrap();
        }
        registry
    }

    #[test]
    fn complete_submission_is_valid() {
        let form = valid_form();
        let report = validate(&form, &filled_registry(&[]), &form.active_flags());
        assert!(report.is_valid());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn optional_categories_may_stay_empty() {
        let form = valid_form();
        let registry = filled_registry(&["ethikvotum", "sonstiges", "einwilligung"]);
        assert!(validate(&form, &registry, &form.active_flags()).is_valid());
    }

    #[test]
    fn missing_email_reports_presence_only() {
        let mut form = valid_form();
        form.email = "   ".to_string();
        let report = validate(&form, &filled_registry(&[]), &form.active_flags());
        assert_eq!(report.errors, vec![EMAIL_REQUIRED.to_string()]);
    }

    #[test]
    fn malformed_emails_report_format_only() {
        for email in ["no-at.example.org", "user@nodot", "us er@example.org", "a@b.c d"] {
            let mut form = valid_form();
            form.email = email.to_string();
            let report = validate(&form, &filled_registry(&[]), &form.active_flags());
            assert_eq!(report.errors, vec![EMAIL_INVALID.to_string()], "email {email:?}");
        }
    }

    #[test]
    fn blank_title_is_an_error() {
        let mut form = valid_form();
        form.project_title = " \t".to_string();
        let report = validate(&form, &filled_registry(&[]), &form.active_flags());
        assert_eq!(report.errors, vec![TITLE_REQUIRED.to_string()]);
    }

    #[test]
    fn prospective_flag_makes_consent_required() {
        let mut form = valid_form();
        let registry = filled_registry(&["einwilligung"]);
        assert!(validate(&form, &registry, &form.active_flags()).is_valid());

        form.is_prospective_study = true;
        let report = validate(&form, &registry, &form.active_flags());
        assert_eq!(
            report.errors,
            vec![category_required_message("Consent form")]
        );
    }

    #[test]
    fn errors_follow_rule_order() {
        let form = FormState::default();
        let report = validate(&form, &CategoryRegistry::default(), &form.active_flags());
        assert_eq!(
            report.errors,
            vec![
                EMAIL_REQUIRED.to_string(),
                TITLE_REQUIRED.to_string(),
                category_required_message("Privacy concept"),
                category_required_message("Assumption of responsibility"),
                category_required_message("University training certificate"),
                category_required_message("University hospital training certificate"),
            ]
        );
    }
}
