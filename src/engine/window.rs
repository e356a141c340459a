//! Window records - the declarative description of every screen
//!
//! Records are stored loosely typed in the document (string tags, tuple
//! choices) and converted here into a closed [`Window`] type. Conversion and
//! cross-window reference checks happen once, when the document loads.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::prompt::PromptTemplate;
use crate::dispatch::Operation;
use crate::error::ConfigError;
use crate::resolver::Token;
use crate::session::{FieldKind, SessionField};
use crate::store::{EntityField, IndexList};

/// First window of every session
pub const HOME: &str = "home";
/// Terminal state; never a real window
pub const EXIT: &str = "exit";

const RUNTIME_PREFIX: &str = "runtime.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    Static(String),
    Dynamic {
        template: PromptTemplate,
        replacements: BTreeMap<String, Token>,
    },
}

/// One entry of a fixed-choice menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedChoice {
    pub label: String,
    pub operation: Option<Operation>,
    /// Windows to visit next, in order
    pub chain: Vec<String>,
}

/// Where a dynamic menu gets its options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceSource {
    Session(SessionField),
    Index(IndexList),
}

impl ChoiceSource {
    /// Kind of value each option carries
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Session(field) => field.kind(),
            Self::Index(IndexList::Resources) => FieldKind::Text,
            Self::Index(_) => FieldKind::Path,
        }
    }
}

/// One step of an input chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputPrompt {
    pub prompt: String,
    pub write_to: SessionField,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choices {
    /// `static_numeric`
    Fixed {
        options: Vec<FixedChoice>,
        next_window: Option<String>,
    },
    /// `dynamic_numeric`
    Dynamic {
        source: ChoiceSource,
        filter: Option<SessionField>,
        labels: Option<EntityField>,
        write_to: SessionField,
        next_window: Option<String>,
    },
    /// `dynamic_paths`
    Paths {
        indexes: Vec<IndexList>,
        write_to: SessionField,
        operation: Option<Operation>,
        next_window: String,
    },
    /// `input_chain`
    InputChain {
        prompts: Vec<InputPrompt>,
        operation: Option<Operation>,
        next_window: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    pub prompt: Prompt,
    pub choices: Choices,
}

impl Window {
    /// Every window name this window can transition to
    pub fn targets(&self) -> Vec<&str> {
        match &self.choices {
            Choices::Fixed {
                options,
                next_window,
            } => options
                .iter()
                .flat_map(|o| o.chain.iter().map(String::as_str))
                .chain(next_window.as_deref())
                .collect(),
            Choices::Dynamic { next_window, .. } => next_window.as_deref().into_iter().collect(),
            Choices::Paths { next_window, .. } | Choices::InputChain { next_window, .. } => {
                vec![next_window.as_str()]
            }
        }
    }
}

/// Validated table of windows keyed by name
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, RawWindow>", into = "BTreeMap<String, RawWindow>")]
pub struct WindowSet {
    windows: BTreeMap<String, Window>,
}

impl WindowSet {
    pub fn get(&self, name: &str) -> Result<&Window, ConfigError> {
        self.windows
            .get(name)
            .ok_or_else(|| ConfigError::UnknownWindow(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Check that `home` exists and every transition lands on a known window
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.windows.contains_key(HOME) {
            return Err(ConfigError::UnknownWindow(HOME.to_string()));
        }
        for (name, window) in &self.windows {
            for target in window.targets() {
                if target != EXIT && !self.windows.contains_key(target) {
                    return Err(ConfigError::MalformedWindow {
                        window: name.clone(),
                        reason: format!("transition to unknown window {}", target),
                    });
                }
            }
        }
        Ok(())
    }
}

impl TryFrom<BTreeMap<String, Window>> for WindowSet {
    type Error = ConfigError;

    fn try_from(windows: BTreeMap<String, Window>) -> Result<Self, Self::Error> {
        let set = Self { windows };
        set.validate()?;
        Ok(set)
    }
}

impl TryFrom<BTreeMap<String, RawWindow>> for WindowSet {
    type Error = ConfigError;

    fn try_from(raw: BTreeMap<String, RawWindow>) -> Result<Self, Self::Error> {
        let windows = raw
            .into_iter()
            .map(|(name, record)| {
                let window = record.into_window(&name)?;
                Ok((name, window))
            })
            .collect::<Result<BTreeMap<_, _>, ConfigError>>()?;
        windows.try_into()
    }
}

impl From<WindowSet> for BTreeMap<String, RawWindow> {
    fn from(set: WindowSet) -> Self {
        set.windows
            .into_iter()
            .map(|(name, window)| (name, RawWindow::from(window)))
            .collect()
    }
}

/// A fixed choice or input prompt as written in the document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawChoice {
    /// `["label", "operation", "win_a,win_b"]` or `["prompt", "field"]`
    Tuple(Vec<String>),
    Object {
        label: String,
        #[serde(default)]
        function: String,
        #[serde(default)]
        next: String,
        #[serde(default)]
        write_to: String,
    },
}

/// Window record exactly as stored in the document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawWindow {
    pub prompt: String,
    #[serde(default = "default_prompt_type")]
    pub prompt_type: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub replacements: BTreeMap<String, String>,
    pub choice_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<RawChoice>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub filter: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub labels: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub write_to: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub function: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub next_window: String,
}

fn default_prompt_type() -> String {
    "static".to_string()
}

impl RawWindow {
    fn into_window(self, name: &str) -> Result<Window, ConfigError> {
        let malformed = |reason: String| ConfigError::MalformedWindow {
            window: name.to_string(),
            reason,
        };
        let wrap = |e: ConfigError| malformed(e.to_string());

        let prompt = match self.prompt_type.as_str() {
            "static" => Prompt::Static(self.prompt),
            "dynamic" => {
                let template = PromptTemplate::new(self.prompt).map_err(|e| malformed(e.to_string()))?;
                let replacements = self
                    .replacements
                    .iter()
                    .map(|(key, token)| Ok((key.clone(), token.parse::<Token>()?)))
                    .collect::<Result<BTreeMap<_, _>, ConfigError>>()
                    .map_err(wrap)?;
                if let Some(missing) = template.params.iter().find(|p| !replacements.contains_key(*p)) {
                    return Err(malformed(format!("no replacement for {{{}}}", missing)));
                }
                Prompt::Dynamic {
                    template,
                    replacements,
                }
            }
            other => return Err(malformed(format!("unknown prompt_type {}", other))),
        };

        let choices = match self.choice_type.as_str() {
            "static_numeric" => {
                let options = self
                    .choices
                    .into_iter()
                    .map(|choice| fixed_choice(choice).map_err(&malformed))
                    .collect::<Result<Vec<_>, _>>()?;
                Choices::Fixed {
                    options,
                    next_window: optional(self.next_window),
                }
            }
            "dynamic_numeric" => {
                let source = match self.source.strip_prefix(RUNTIME_PREFIX) {
                    Some(field) => ChoiceSource::Session(field.parse().map_err(wrap)?),
                    None => ChoiceSource::Index(self.source.parse().map_err(wrap)?),
                };
                let labels = match optional(self.labels) {
                    Some(field) => Some(
                        field
                            .parse::<EntityField>()
                            .map_err(|_| malformed(format!("unknown label field {}", field)))?,
                    ),
                    None => None,
                };
                let write_to: SessionField = self.write_to.parse().map_err(wrap)?;
                if !write_to.accepts(source.kind()) {
                    return Err(malformed(format!(
                        "{} values cannot be written to {}",
                        self.source, write_to
                    )));
                }
                Choices::Dynamic {
                    source,
                    filter: optional(self.filter)
                        .map(|f| f.parse())
                        .transpose()
                        .map_err(wrap)?,
                    labels,
                    write_to,
                    next_window: optional(self.next_window),
                }
            }
            "dynamic_paths" => {
                let indexes = self
                    .filters
                    .iter()
                    .map(|f| f.parse::<IndexList>())
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(wrap)?;
                if indexes.is_empty() || indexes.contains(&IndexList::Resources) {
                    return Err(malformed(
                        "filters must name project_paths, storys or tasks".to_string(),
                    ));
                }
                let write_to: SessionField = self.write_to.parse().map_err(wrap)?;
                if !write_to.accepts(FieldKind::Path) {
                    return Err(malformed(format!("paths cannot be written to {}", write_to)));
                }
                Choices::Paths {
                    indexes,
                    write_to,
                    operation: operation(&self.function).map_err(wrap)?,
                    next_window: optional(self.next_window).ok_or_else(|| {
                        malformed("dynamic_paths needs next_window".to_string())
                    })?,
                }
            }
            "input_chain" => {
                let prompts = self
                    .choices
                    .into_iter()
                    .map(|choice| input_prompt(choice).map_err(&malformed))
                    .collect::<Result<Vec<_>, _>>()?;
                if let Some(step) = prompts.iter().find(|p| p.write_to.kind() != FieldKind::Text) {
                    return Err(malformed(format!(
                        "typed input cannot be written to {}",
                        step.write_to
                    )));
                }
                Choices::InputChain {
                    prompts,
                    operation: operation(&self.function).map_err(wrap)?,
                    next_window: optional(self.next_window)
                        .ok_or_else(|| malformed("input_chain needs next_window".to_string()))?,
                }
            }
            other => return Err(malformed(format!("unknown choice_type {}", other))),
        };

        Ok(Window { prompt, choices })
    }
}

fn optional(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn operation(name: &str) -> Result<Option<Operation>, ConfigError> {
    if name.is_empty() {
        Ok(None)
    } else {
        name.parse().map(Some)
    }
}

fn split_chain(chain: &str) -> Vec<String> {
    chain
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn fixed_choice(choice: RawChoice) -> Result<FixedChoice, String> {
    let (label, function, next) = match choice {
        RawChoice::Tuple(parts) => {
            let mut parts = parts.into_iter();
            let label = parts.next().ok_or("empty choice")?;
            (
                label,
                parts.next().unwrap_or_default(),
                parts.next().unwrap_or_default(),
            )
        }
        RawChoice::Object {
            label,
            function,
            next,
            ..
        } => (label, function, next),
    };
    Ok(FixedChoice {
        label,
        operation: operation(&function).map_err(|e| e.to_string())?,
        chain: split_chain(&next),
    })
}

fn input_prompt(choice: RawChoice) -> Result<InputPrompt, String> {
    let (prompt, field) = match choice {
        RawChoice::Tuple(parts) => match parts.as_slice() {
            [prompt, field] => (prompt.clone(), field.clone()),
            _ => return Err("input prompts are [prompt, field] pairs".to_string()),
        },
        RawChoice::Object {
            label, write_to, ..
        } => (label, write_to),
    };
    Ok(InputPrompt {
        prompt,
        write_to: field.parse().map_err(|e: ConfigError| e.to_string())?,
    })
}

impl From<Window> for RawWindow {
    fn from(window: Window) -> Self {
        let mut raw = RawWindow::default();
        match window.prompt {
            Prompt::Static(text) => {
                raw.prompt = text;
                raw.prompt_type = "static".to_string();
            }
            Prompt::Dynamic {
                template,
                replacements,
            } => {
                raw.prompt = template.template;
                raw.prompt_type = "dynamic".to_string();
                raw.replacements = replacements
                    .into_iter()
                    .map(|(k, token)| (k, token.to_string()))
                    .collect();
            }
        }

        let op_name = |op: Option<Operation>| op.map(|o| o.to_string()).unwrap_or_default();
        match window.choices {
            Choices::Fixed {
                options,
                next_window,
            } => {
                raw.choice_type = "static_numeric".to_string();
                raw.choices = options
                    .into_iter()
                    .map(|o| RawChoice::Tuple(vec![o.label, op_name(o.operation), o.chain.join(",")]))
                    .collect();
                raw.next_window = next_window.unwrap_or_default();
            }
            Choices::Dynamic {
                source,
                filter,
                labels,
                write_to,
                next_window,
            } => {
                raw.choice_type = "dynamic_numeric".to_string();
                raw.source = match source {
                    ChoiceSource::Session(field) => format!("{}{}", RUNTIME_PREFIX, field),
                    ChoiceSource::Index(index) => index.to_string(),
                };
                raw.filter = filter.map(|f| f.to_string()).unwrap_or_default();
                raw.labels = labels.map(|l| l.to_string()).unwrap_or_default();
                raw.write_to = write_to.to_string();
                raw.next_window = next_window.unwrap_or_default();
            }
            Choices::Paths {
                indexes,
                write_to,
                operation,
                next_window,
            } => {
                raw.choice_type = "dynamic_paths".to_string();
                raw.filters = indexes.iter().map(ToString::to_string).collect();
                raw.write_to = write_to.to_string();
                raw.function = op_name(operation);
                raw.next_window = next_window;
            }
            Choices::InputChain {
                prompts,
                operation,
                next_window,
            } => {
                raw.choice_type = "input_chain".to_string();
                raw.choices = prompts
                    .into_iter()
                    .map(|p| RawChoice::Tuple(vec![p.prompt, p.write_to.to_string()]))
                    .collect();
                raw.function = op_name(operation);
                raw.next_window = next_window;
            }
        }
        raw
    }
}
