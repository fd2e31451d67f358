/// Follow-up the alert offers besides dismissing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryAction {
    /// Run the pin's photo search again (map screen).
    FetchPin { pin_id: String },
    /// Discard and re-fetch the pin's photos (photo browser).
    NewCollection { pin_id: String },
}

/// Modal alert for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub message: String,
    pub retry: Option<RetryAction>,
}

impl Alert {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            title: "Error".to_string(),
            message: message.into(),
            retry: None,
        }
    }

    pub fn with_retry(mut self, action: RetryAction) -> Self {
        self.retry = Some(action);
        self
    }

    /// Alert for a failed operation; only retryable failures carry `retry`.
    pub fn failure(message: impl Into<String>, retryable: bool, retry: RetryAction) -> Self {
        let alert = Self::error(message);
        if retryable {
            alert.with_retry(retry)
        } else {
            alert
        }
    }

    pub fn button_titles(&self) -> Vec<&'static str> {
        match self.retry {
            Some(_) => vec!["Retry", "OK"],
            None => vec!["OK"],
        }
    }
}
