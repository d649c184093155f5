//! `$`-placeholder message templates: `$NAME` and `${NAME}` are replaced by values,
//! `$$` is a literal dollar sign.

use std::collections::HashMap;

use regex::Regex;
use thiserror::Error;

/// Placeholder for the election identifier.
pub const UUID: &str = "UUID";
/// Placeholder for the voter's credential.
pub const ELECTION_CODE: &str = "ELECTION_CODE";

const PLACEHOLDER: &str = r"\$(?:(?P<escaped>\$)|(?P<named>[_A-Za-z][_A-Za-z0-9]*)|\{(?P<braced>[_A-Za-z][_A-Za-z0-9]*)\}|(?P<invalid>))";

/// The message sent when no template file is configured.
pub const DEFAULT_TEMPLATE: &str = "
Bonjour,

Nous vous invitons à participer à l'élection à l'adresse suivante :

  https://vote.example.org/elections/$UUID/

Vous aurez besoin de vos identifiants habituels, mais aussi du code de
vote personnel (appelé \"credential\") que voici :

  $ELECTION_CODE

Veillez à aller au bout de toutes les étapes pour que votre vote soit pris
en compte. Un mail de confirmation vous sera envoyé.

Merci de votre participation.

==========================================================

Hello,

You are listed as a voter for this election. Please visit the following
link:

  https://vote.example.org/elections/$UUID/

You will need your usual login and password, and also the following
credential (personal code):

  $ELECTION_CODE

Be sure to go through all the steps to ensure that your vote is taken
into account. A confirmation email will be sent.

Thank you for your participation.
";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("No value for placeholder `${0}`")]
    Unknown(String),
    #[error("Invalid placeholder at byte {0}; write `$$` for a literal dollar sign")]
    Invalid(usize),
}

#[derive(Debug, Clone)]
pub struct Template {
    text: String,
    placeholder: Regex,
}

impl Template {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            // The pattern is a constant, so compilation cannot fail.
            placeholder: Regex::new(PLACEHOLDER).unwrap(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace every placeholder. Every placeholder must have a value.
    pub fn substitute(&self, values: &HashMap<&str, &str>) -> Result<String, TemplateError> {
        let mut output = String::with_capacity(self.text.len());
        let mut last = 0;
        for captures in self.placeholder.captures_iter(&self.text) {
            let whole = captures.get(0).unwrap(); // Group 0 is always present.
            output.push_str(&self.text[last..whole.start()]);
            last = whole.end();

            if captures.name("escaped").is_some() {
                output.push('$');
            } else if let Some(name) = captures.name("named").or_else(|| captures.name("braced")) {
                let value = values
                    .get(name.as_str())
                    .ok_or_else(|| TemplateError::Unknown(name.as_str().to_string()))?;
                output.push_str(value);
            } else {
                return Err(TemplateError::Invalid(whole.start()));
            }
        }
        output.push_str(&self.text[last..]);
        Ok(output)
    }
}

impl Default for Template {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE)
    }
}
