//! Per-field query validation for `/metrics-flow`.
//!
//! Every optional field is validated on its own. A bad field becomes an
//! `InvalidParam` (reported by the caller) and is left out of `ValidParams`;
//! the remaining fields are unaffected.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

static ENTRYPOINT: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_.:-]+$").ok());

static UTM: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_/.%-]+$").ok());

// Named services, or a 16 hex char OAuth client id.
static SERVICE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(sync|content-server|none|[0-9a-f]{16})$").ok());

/// Query fields understood by the endpoint. Anything else is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamName {
    Entrypoint,
    FormType,
    Service,
    UtmCampaign,
    UtmContent,
    UtmMedium,
    UtmSource,
    UtmTerm,
}

impl ParamName {
    pub const ALL: [ParamName; 8] = [
        ParamName::Entrypoint,
        ParamName::FormType,
        ParamName::Service,
        ParamName::UtmCampaign,
        ParamName::UtmContent,
        ParamName::UtmMedium,
        ParamName::UtmSource,
        ParamName::UtmTerm,
    ];

    /// Wire name as it appears in the query string.
    pub fn as_str(self) -> &'static str {
        match self {
            ParamName::Entrypoint => "entrypoint",
            ParamName::FormType => "form_type",
            ParamName::Service => "service",
            ParamName::UtmCampaign => "utm_campaign",
            ParamName::UtmContent => "utm_content",
            ParamName::UtmMedium => "utm_medium",
            ParamName::UtmSource => "utm_source",
            ParamName::UtmTerm => "utm_term",
        }
    }

    fn accepts(self, s: &str) -> bool {
        let re = match self {
            ParamName::FormType => return FormType::parse(s).is_some(),
            ParamName::Entrypoint => &*ENTRYPOINT,
            ParamName::Service => &*SERVICE,
            ParamName::UtmCampaign
            | ParamName::UtmContent
            | ParamName::UtmMedium
            | ParamName::UtmSource
            | ParamName::UtmTerm => &*UTM,
        };
        // A pattern that failed to compile rejects everything.
        re.as_ref().is_some_and(|re| re.is_match(s))
    }
}

/// Allowed `form_type` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormType {
    Email,
    Other,
}

impl FormType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "email" => Some(FormType::Email),
            "other" => Some(FormType::Other),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FormType::Email => "email",
            FormType::Other => "other",
        }
    }
}

/// A rejected field together with the raw value that was supplied.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidParam {
    pub param: ParamName,
    pub value: Value,
}

/// Fields that passed validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidParams {
    pub entrypoint: Option<String>,
    pub form_type: Option<FormType>,
    pub service: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_content: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_source: Option<String>,
    pub utm_term: Option<String>,
}

impl ValidParams {
    fn set(&mut self, param: ParamName, v: String) {
        let slot = match param {
            ParamName::FormType => {
                self.form_type = FormType::parse(&v);
                return;
            }
            ParamName::Entrypoint => &mut self.entrypoint,
            ParamName::Service => &mut self.service,
            ParamName::UtmCampaign => &mut self.utm_campaign,
            ParamName::UtmContent => &mut self.utm_content,
            ParamName::UtmMedium => &mut self.utm_medium,
            ParamName::UtmSource => &mut self.utm_source,
            ParamName::UtmTerm => &mut self.utm_term,
        };
        *slot = Some(v);
    }

    /// True when the email form is being shown (triggers the enter-email event).
    pub fn is_email_form(&self) -> bool {
        self.form_type == Some(FormType::Email)
    }
}

/// Outcome of validating a whole query: the valid fields plus one entry per
/// invalid field, in `ParamName::ALL` order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Validation {
    pub valid: ValidParams,
    pub invalid: Vec<InvalidParam>,
}

/// Validate a single raw value. Non-string values are always invalid.
pub fn validate_param(param: ParamName, raw: &Value) -> Result<String, InvalidParam> {
    match raw {
        Value::String(s) if param.accepts(s) => Ok(s.clone()),
        _ => Err(InvalidParam {
            param,
            value: raw.clone(),
        }),
    }
}

/// Validate every known field of `query`. A missing query is the same as an
/// empty one.
pub fn validate_query(query: Option<&Map<String, Value>>) -> Validation {
    let mut out = Validation::default();
    let Some(query) = query else {
        return out;
    };

    for param in ParamName::ALL {
        let Some(raw) = query.get(param.as_str()) else {
            continue;
        };
        match validate_param(param, raw) {
            Ok(v) => out.valid.set(param, v),
            Err(bad) => out.invalid.push(bad),
        }
    }
    out
}
