use chrono::NaiveDate;
use console::style;
use dialoguer::{Confirm, Input, theme::ColorfulTheme};

use crate::dates::{DateRange, parse_date};
use crate::error::{Error, Result};
use crate::filters::{Author, Replacement, push_replacement};
use crate::remote::validate_repo_url;
use crate::transfer::TransferRequest;

/// Abstraction over a string input prompt.
///
/// Implementors define how string input is collected from the user,
/// including any styling or interactivity. This trait enables testability
/// by decoupling user input from the logic that consumes it.
pub trait StringPrompter {
    /// Prompt the user for a string input.
    ///
    /// # Parameters
    /// - `prompt`: The message shown to the user.
    /// - `default`: Value used if the user presses Enter without input. An
    ///   empty default means there is none.
    ///
    /// # Returns
    /// `Ok(String)` if input is successfully collected, or an `Err(String)` describing the failure.
    fn prompt(&mut self, prompt: &str, default: &str) -> std::result::Result<String, String>;
}

/// Abstraction over a boolean (yes/no) confirmation prompt.
pub trait ConfirmPrompter {
    /// Prompt the user for a yes/no confirmation.
    ///
    /// Returns `Ok(true)` if confirmed, `Ok(false)` if declined, or
    /// `Err(String)` on input failure.
    fn confirm(&mut self, prompt: &str, default: bool) -> std::result::Result<bool, String>;
}

/// Default implementation of `StringPrompter` using `dialoguer::Input`.
pub struct DialoguerStringPrompter;

impl StringPrompter for DialoguerStringPrompter {
    fn prompt(&mut self, prompt: &str, default: &str) -> std::result::Result<String, String> {
        let theme = ColorfulTheme::default();
        let mut input = Input::<String>::with_theme(&theme)
            .with_prompt(prompt)
            .allow_empty(true);
        if !default.is_empty() {
            input = input.default(default.to_string());
        }
        input.interact_text().map_err(|e| e.to_string())
    }
}

/// Default implementation of `ConfirmPrompter` using `dialoguer::Confirm`.
pub struct DialoguerConfirmPrompter;

impl ConfirmPrompter for DialoguerConfirmPrompter {
    fn confirm(&mut self, prompt: &str, default: bool) -> std::result::Result<bool, String> {
        let theme = ColorfulTheme::default();
        Confirm::with_theme(&theme)
            .with_prompt(prompt)
            .default(default)
            .interact()
            .map_err(|e| e.to_string())
    }
}

/// Asks for a value that may not be blank; the answer is trimmed.
pub fn ask_required<P: StringPrompter>(
    prompter: &mut P,
    label: &str,
    default: &str,
) -> Result<String> {
    let answer = prompter.prompt(label, default).map_err(Error::Prompt)?;
    let answer = answer.trim();
    if answer.is_empty() {
        return Err(Error::InvalidInput(format!("{label} is required")));
    }
    Ok(answer.to_string())
}

/// Asks for a `YYYY-MM-DD` date.
pub fn ask_date<P: StringPrompter>(prompter: &mut P, label: &str) -> Result<NaiveDate> {
    let answer = ask_required(prompter, &format!("{label} (YYYY-MM-DD)"), "")?;
    parse_date(&answer).ok_or(Error::InvalidDate(answer))
}

/// Asks for start and end dates and checks that they form a range.
pub fn ask_date_range<P: StringPrompter>(prompter: &mut P) -> Result<DateRange> {
    let start = ask_date(prompter, "Start date")?;
    let end = ask_date(prompter, "End date")?;
    Ok(DateRange::new(start, end)?)
}

/// Collects message replacements until the user declines to add another.
///
/// The search text must not be empty; the replacement may be.
pub fn ask_replacements<S: StringPrompter, C: ConfirmPrompter>(
    strings: &mut S,
    confirms: &mut C,
) -> Result<Vec<Replacement>> {
    let mut replacements = Vec::new();
    loop {
        let more = confirms
            .confirm("Do you want to replace text in commit messages?", false)
            .map_err(Error::Prompt)?;
        if !more {
            return Ok(replacements);
        }

        let from = ask_required(strings, "Text to replace in commit messages", "")?;
        let to = strings
            .prompt("Replacement text", "")
            .map_err(Error::Prompt)?
            .trim()
            .to_string();
        println!(
            "{}",
            style(format!("Added replacement: '{from}' → '{to}'")).green()
        );
        push_replacement(&mut replacements, Replacement { from, to });
    }
}

/// Ask the user to confirm the transfer. Declining is the default.
pub fn confirm_transfer<P: ConfirmPrompter>(prompter: &mut P) -> Result<bool> {
    prompter
        .confirm(
            "Proceed with transfer? (history will be rewritten and mirror-pushed)",
            false,
        )
        .map_err(Error::Prompt)
}

/// Values already known before prompting, typically from the command line.
#[derive(Debug, Clone, Default)]
pub struct Draft {
    pub old_url: Option<String>,
    pub new_url: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub replacements: Vec<Replacement>,
}

/// Author identity suggested when none is given, usually from `git config`.
#[derive(Debug, Clone, Default)]
pub struct AuthorDefaults {
    pub name: String,
    pub email: String,
}

fn required<S: StringPrompter>(
    given: Option<String>,
    interactive: bool,
    strings: &mut S,
    label: &str,
    default: &str,
    flag: &str,
) -> Result<String> {
    match given.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        Some(v) => Ok(v),
        None if interactive => ask_required(strings, label, default),
        None if !default.trim().is_empty() => Ok(default.trim().to_string()),
        None => Err(Error::InvalidInput(format!("missing {flag}"))),
    }
}

/// Fills the gaps in `draft` and returns a complete [`TransferRequest`].
///
/// With `interactive == false` nothing is asked: missing URLs are errors,
/// missing author fields fall back to `defaults`, dates stay untouched unless
/// both ends were given and no replacements are added.
pub fn complete_request<S: StringPrompter, C: ConfirmPrompter>(
    draft: Draft,
    defaults: &AuthorDefaults,
    interactive: bool,
    strings: &mut S,
    confirms: &mut C,
) -> Result<TransferRequest> {
    let old_url = required(
        draft.old_url,
        interactive,
        strings,
        "URL of the old repository",
        "",
        "--old-url",
    )?;
    validate_repo_url(&old_url)?;

    let new_url = required(
        draft.new_url,
        interactive,
        strings,
        "URL of the new repository",
        "",
        "--new-url",
    )?;
    validate_repo_url(&new_url)?;

    let name = required(
        draft.name,
        interactive,
        strings,
        "New author name",
        &defaults.name,
        "--name",
    )?;
    let email = required(
        draft.email,
        interactive,
        strings,
        "New author email",
        &defaults.email,
        "--email",
    )?;

    let date_range = match (draft.start_date, draft.end_date) {
        (Some(start), Some(end)) => Some(DateRange::new(start, end)?),
        (Some(_), None) | (None, Some(_)) => {
            return Err(Error::InvalidInput(
                "--start-date and --end-date must be given together".to_string(),
            ));
        }
        (None, None) if interactive => {
            let modify = confirms
                .confirm("Do you want to modify commit dates?", false)
                .map_err(Error::Prompt)?;
            if modify {
                Some(ask_date_range(strings)?)
            } else {
                None
            }
        }
        (None, None) => None,
    };

    let replacements = if draft.replacements.is_empty() && interactive {
        ask_replacements(strings, confirms)?
    } else {
        draft.replacements
    };

    Ok(TransferRequest {
        old_url,
        new_url,
        author: Author { name, email },
        date_range,
        replacements,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Answers prompts from a queue and records what was asked.
    #[derive(Default)]
    struct ScriptedStrings {
        answers: VecDeque<std::result::Result<String, String>>,
        asked: Vec<(String, String)>,
    }

    impl ScriptedStrings {
        fn with(answers: &[&str]) -> Self {
            Self {
                answers: answers.iter().map(|a| Ok(a.to_string())).collect(),
                asked: Vec::new(),
            }
        }
    }

    impl StringPrompter for ScriptedStrings {
        fn prompt(&mut self, prompt: &str, default: &str) -> std::result::Result<String, String> {
            self.asked.push((prompt.to_string(), default.to_string()));
            self.answers
                .pop_front()
                .unwrap_or_else(|| Err(format!("unexpected prompt: {prompt}")))
        }
    }

    #[derive(Default)]
    struct ScriptedConfirms {
        answers: VecDeque<std::result::Result<bool, String>>,
        asked: Vec<(String, bool)>,
    }

    impl ScriptedConfirms {
        fn with(answers: &[bool]) -> Self {
            Self {
                answers: answers.iter().map(|a| Ok(*a)).collect(),
                asked: Vec::new(),
            }
        }
    }

    impl ConfirmPrompter for ScriptedConfirms {
        fn confirm(&mut self, prompt: &str, default: bool) -> std::result::Result<bool, String> {
            self.asked.push((prompt.to_string(), default));
            self.answers
                .pop_front()
                .unwrap_or_else(|| Err(format!("unexpected confirm: {prompt}")))
        }
    }

    fn defaults() -> AuthorDefaults {
        AuthorDefaults {
            name: "Config Name".to_string(),
            email: "config@example.com".to_string(),
        }
    }

    fn day(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[test]
    fn ask_required_trims_answer() {
        let mut strings = ScriptedStrings::with(&["  Alice  "]);
        let answer = ask_required(&mut strings, "Author name", "").unwrap();
        assert_eq!(answer, "Alice");
    }

    #[test]
    fn ask_required_rejects_blank_answer() {
        let mut strings = ScriptedStrings::with(&["   "]);
        let err = ask_required(&mut strings, "Author name", "").unwrap_err();
        assert_eq!(err.to_string(), "Author name is required");
    }

    #[test]
    fn ask_required_passes_default_through() {
        let mut strings = ScriptedStrings::with(&["Jane"]);
        ask_required(&mut strings, "New author name", "Jane").unwrap();
        assert_eq!(
            strings.asked,
            [("New author name".to_string(), "Jane".to_string())]
        );
    }

    #[test]
    fn prompt_failures_become_prompt_errors() {
        let mut strings = ScriptedStrings::default();
        strings.answers.push_back(Err("input failed".to_string()));
        assert!(matches!(
            ask_required(&mut strings, "Label", ""),
            Err(Error::Prompt(msg)) if msg == "input failed"
        ));
    }

    #[test]
    fn ask_date_rejects_bad_format() {
        let mut strings = ScriptedStrings::with(&["2020/01/01"]);
        assert!(matches!(
            ask_date(&mut strings, "Start date"),
            Err(Error::InvalidDate(_))
        ));
    }

    #[test]
    fn ask_date_range_requires_order() {
        let mut strings = ScriptedStrings::with(&["2020-02-01", "2020-01-01"]);
        assert!(matches!(ask_date_range(&mut strings), Err(Error::Dates(_))));
    }

    #[test]
    fn replacements_loop_until_declined() {
        let mut strings = ScriptedStrings::with(&["foo", "bar", "old", ""]);
        let mut confirms = ScriptedConfirms::with(&[true, true, false]);

        let list = ask_replacements(&mut strings, &mut confirms).unwrap();

        assert_eq!(
            list,
            vec![
                Replacement {
                    from: "foo".to_string(),
                    to: "bar".to_string(),
                },
                Replacement {
                    from: "old".to_string(),
                    to: String::new(),
                },
            ]
        );
        assert_eq!(confirms.asked.len(), 3);
    }

    #[test]
    fn replacement_needs_search_text() {
        let mut strings = ScriptedStrings::with(&[""]);
        let mut confirms = ScriptedConfirms::with(&[true]);
        assert!(matches!(
            ask_replacements(&mut strings, &mut confirms),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn confirm_transfer_defaults_to_no() {
        let mut confirms = ScriptedConfirms::with(&[false]);
        assert!(!confirm_transfer(&mut confirms).unwrap());
        assert!(!confirms.asked[0].1);
    }

    #[test]
    fn interactive_request_asks_for_everything() {
        let mut strings = ScriptedStrings::with(&[
            "https://github.com/acme/widgets.git",
            "git@github.com:newco/widgets.git",
            "Jane Doe",
            "jane@example.com",
            "2020-01-01",
            "2020-03-01",
            "acme",
            "newco",
        ]);
        let mut confirms = ScriptedConfirms::with(&[true, true, false]);

        let request = complete_request(
            Draft::default(),
            &defaults(),
            true,
            &mut strings,
            &mut confirms,
        )
        .unwrap();

        assert_eq!(request.old_url, "https://github.com/acme/widgets.git");
        assert_eq!(request.new_url, "git@github.com:newco/widgets.git");
        assert_eq!(request.author.to_string(), "Jane Doe <jane@example.com>");
        assert_eq!(
            request.date_range,
            Some(DateRange::new(day("2020-01-01"), day("2020-03-01")).unwrap())
        );
        assert_eq!(request.replacements.len(), 1);
        assert_eq!(
            strings.asked[2],
            ("New author name".to_string(), "Config Name".to_string())
        );
    }

    #[test]
    fn draft_values_are_not_asked_again() {
        let draft = Draft {
            old_url: Some("https://github.com/acme/widgets.git".to_string()),
            new_url: Some("https://github.com/newco/widgets.git".to_string()),
            name: Some("Jane".to_string()),
            email: Some("jane@example.com".to_string()),
            start_date: Some(day("2021-01-01")),
            end_date: Some(day("2021-02-01")),
            replacements: vec![Replacement {
                from: "a".to_string(),
                to: "b".to_string(),
            }],
        };
        let mut strings = ScriptedStrings::default();
        let mut confirms = ScriptedConfirms::default();

        let request =
            complete_request(draft, &defaults(), true, &mut strings, &mut confirms).unwrap();

        assert!(strings.asked.is_empty());
        assert!(confirms.asked.is_empty());
        assert!(request.date_range.is_some());
    }

    #[test]
    fn non_interactive_uses_config_defaults() {
        let draft = Draft {
            old_url: Some("https://github.com/acme/widgets.git".to_string()),
            new_url: Some("https://github.com/newco/widgets.git".to_string()),
            ..Draft::default()
        };
        let mut strings = ScriptedStrings::default();
        let mut confirms = ScriptedConfirms::default();

        let request =
            complete_request(draft, &defaults(), false, &mut strings, &mut confirms).unwrap();

        assert_eq!(request.author.name, "Config Name");
        assert_eq!(request.author.email, "config@example.com");
        assert!(request.date_range.is_none());
        assert!(request.replacements.is_empty());
    }

    #[test]
    fn non_interactive_missing_url_is_an_error() {
        let mut strings = ScriptedStrings::default();
        let mut confirms = ScriptedConfirms::default();
        let err = complete_request(
            Draft::default(),
            &defaults(),
            false,
            &mut strings,
            &mut confirms,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "missing --old-url");
    }

    #[test]
    fn half_a_date_range_is_an_error() {
        let draft = Draft {
            old_url: Some("https://github.com/acme/widgets.git".to_string()),
            new_url: Some("https://github.com/newco/widgets.git".to_string()),
            start_date: Some(day("2021-01-01")),
            ..Draft::default()
        };
        let mut strings = ScriptedStrings::default();
        let mut confirms = ScriptedConfirms::default();
        assert!(matches!(
            complete_request(draft, &defaults(), false, &mut strings, &mut confirms),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn invalid_old_url_stops_before_other_questions() {
        let mut strings = ScriptedStrings::with(&["ftp://example.com/x.git"]);
        let mut confirms = ScriptedConfirms::default();
        let result = complete_request(
            Draft::default(),
            &defaults(),
            true,
            &mut strings,
            &mut confirms,
        );
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
        assert_eq!(strings.asked.len(), 1);
    }
}
