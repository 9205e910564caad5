use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{CapabilityResolutionError, CapabilityResolver};

/// What a traversal does when resolving one element fails
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TraversalPolicy {
    /// Stop at the first failure and return it
    #[default]
    Abort,
    /// Record the failure and move on to the next element
    Continue,
}

/// An element that could not be resolved under [TraversalPolicy::Continue]
#[derive(Debug)]
pub struct TraversalFailure {
    /// Position of the element in the list
    pub index: usize,
    /// Why it failed
    pub error: CapabilityResolutionError,
}

/// The outcome of a completed traversal
#[derive(Debug, Default)]
pub struct TraversalReport {
    /// Number of elements handed to the render callback
    pub rendered: usize,
    /// Elements skipped under [TraversalPolicy::Continue], in list order
    pub failures: Vec<TraversalFailure>,
}

impl TraversalReport {
    /// Whether every element was rendered
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

impl CapabilityResolver {
    /// Resolve the list capability at `list_url` to an array of capability
    /// URLs, then resolve each element in turn and hand it to
    /// `render(index, value)`.
    ///
    /// Elements are resolved strictly one after another, so `render` sees
    /// them in list order regardless of how long each takes.
    pub async fn traverse<F>(
        &self,
        list_url: &str,
        mut render: F,
    ) -> Result<TraversalReport, CapabilityResolutionError>
    where
        F: FnMut(usize, Value),
    {
        let elements = capability_list(self.fetch(list_url).await?)?;
        tracing::debug!(count = elements.len(), "Traversing capability list");

        let mut report = TraversalReport::default();
        for (index, element) in elements.iter().enumerate() {
            match self.fetch(element).await {
                Ok(value) => {
                    render(index, value);
                    report.rendered += 1;
                }
                Err(error) => match self.config().policy {
                    TraversalPolicy::Abort => {
                        tracing::warn!(index, %error, "Aborting traversal");
                        return Err(error);
                    }
                    TraversalPolicy::Continue => {
                        tracing::warn!(index, %error, "Skipping list element");
                        report.failures.push(TraversalFailure { index, error });
                    }
                },
            }
        }

        Ok(report)
    }
}

fn capability_list(value: Value) -> Result<Vec<String>, CapabilityResolutionError> {
    let Value::Array(elements) = value else {
        return Err(CapabilityResolutionError::NotAList(
            "expected a JSON array".into(),
        ));
    };

    elements
        .into_iter()
        .enumerate()
        .map(|(index, element)| match element {
            Value::String(url) => Ok(url),
            _ => Err(CapabilityResolutionError::NotAList(format!(
                "element {index} is not a string"
            ))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn it_accepts_an_array_of_strings() {
        let list = capability_list(json!(["https://host/a#1", "https://host/b#2"]));

        assert!(matches!(list, Ok(urls) if urls.len() == 2));
    }

    #[test]
    fn it_rejects_anything_else() {
        assert!(matches!(
            capability_list(json!({ "uri": "https://host/a#1" })),
            Err(CapabilityResolutionError::NotAList(_))
        ));
        assert!(matches!(
            capability_list(json!(["https://host/a#1", 2])),
            Err(CapabilityResolutionError::NotAList(_))
        ));
    }

    #[test]
    fn it_treats_an_empty_array_as_an_empty_list() {
        assert!(matches!(capability_list(json!([])), Ok(urls) if urls.is_empty()));
    }
}
