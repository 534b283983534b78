use std::fmt;

use article_analyst_contract::ContractError;

#[derive(Debug)]
pub enum AnalystError {
    MissingBody,
    OverlayNotInjected,
    InvalidConfiguration(String),
    Contract(ContractError),
    Stylesheet(String),
    Json(serde_json::Error),
    Io(std::io::Error),
}

impl fmt::Display for AnalystError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalystError::MissingBody => write!(f, "document has no <body> element"),
            AnalystError::OverlayNotInjected => write!(f, "overlay elements are not in the document"),
            AnalystError::InvalidConfiguration(message) => {
                write!(f, "invalid configuration: {}", message)
            }
            AnalystError::Contract(err) => write!(f, "analysis data error: {}", err),
            AnalystError::Stylesheet(message) => write!(f, "stylesheet error: {}", message),
            AnalystError::Json(err) => write!(f, "json error: {}", err),
            AnalystError::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

impl std::error::Error for AnalystError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AnalystError::Contract(err) => Some(err),
            AnalystError::Json(err) => Some(err),
            AnalystError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for AnalystError {
    fn from(value: std::io::Error) -> Self {
        AnalystError::Io(value)
    }
}

impl From<serde_json::Error> for AnalystError {
    fn from(value: serde_json::Error) -> Self {
        AnalystError::Json(value)
    }
}

impl From<ContractError> for AnalystError {
    fn from(value: ContractError) -> Self {
        AnalystError::Contract(value)
    }
}
