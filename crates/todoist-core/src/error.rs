use thiserror::Error;

/// Everything that can go wrong between a tool call and the Todoist API.
#[derive(Debug, Error)]
pub enum Error {
    /// TODOIST_API_TOKEN is not set. Fatal at startup, never retried.
    #[error("credential required: set TODOIST_API_TOKEN")]
    MissingCredential,

    /// Bad tool input, caught before any request goes out.
    #[error("{0}")]
    Validation(String),

    /// An id mapping or a named project does not exist upstream.
    #[error("{0}")]
    NotFound(String),

    /// Ownership guard tripped; the operation was refused, not attempted.
    #[error("{0}")]
    Guard(String),

    /// Todoist answered with a non-success status.
    #[error("Todoist API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Operation-level wrapper so every failure reads
    /// "Failed to <operation>: <cause>".
    #[error("Failed to {op}: {source}")]
    Op {
        op: &'static str,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// `map_err(Error::wrap("move task"))` turns any cause into
    /// "Failed to move task: <cause>". Already-wrapped errors are wrapped
    /// again on purpose: composite operations report their own name on top
    /// of the failing step's.
    pub fn wrap(op: &'static str) -> impl FnOnce(Error) -> Error {
        move |source| Error::Op {
            op,
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn op_wrapper_formats_failed_to() {
        let inner = Error::NotFound("no mapping found for tasks id 42".into());
        let wrapped = Error::wrap("convert ID")(inner);
        assert_eq!(
            wrapped.to_string(),
            "Failed to convert ID: no mapping found for tasks id 42"
        );
    }

    #[test]
    fn nested_wrapping_keeps_both_operations() {
        let inner = Error::Api {
            status: 500,
            body: "boom".into(),
        };
        let msg = Error::wrap("complete Becky task")(Error::wrap("move task")(inner)).to_string();
        assert_eq!(
            msg,
            "Failed to complete Becky task: Failed to move task: Todoist API returned 500: boom"
        );
    }
}
