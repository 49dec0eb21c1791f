use consultkit::errors::ProviderError;
use consultkit::providers::ai::{AiProvider, TextStream};
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::{Arc, Mutex};

// --- Test Setup ---

/// Installs a compact tracing subscriber once per test binary.
pub fn setup_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .compact()
        .try_init();
}

// --- Mock AI Provider ---

/// What the mock does when a prompt matches.
#[derive(Clone, Debug)]
enum Script {
    Text(String),
    Fragments(Vec<Result<String, String>>),
    Fail(u16, String),
}

/// A recorded call to the mock.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedCall {
    pub model: String,
    pub prompt: String,
    pub use_search: bool,
    pub streaming: bool,
}

/// A scriptable `AiProvider`. Scripts are matched by prompt substring in
/// registration order, so the first matching key wins.
#[derive(Clone, Debug)]
pub struct MockAiProvider {
    scripts: Arc<Mutex<Vec<(String, Script)>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockAiProvider {
    pub fn new() -> Self {
        Self {
            scripts: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Pre-programs a complete response for prompts containing `key`.
    /// Streaming calls receive it as a single fragment.
    pub fn add_response(&self, key: &str, response: &str) {
        self.script(key, Script::Text(response.to_string()));
    }

    /// Pre-programs streamed fragments for prompts containing `key`.
    /// Non-streaming calls receive them concatenated.
    pub fn add_stream(&self, key: &str, fragments: &[&str]) {
        let fragments = fragments.iter().map(|f| Ok(f.to_string())).collect();
        self.script(key, Script::Fragments(fragments));
    }

    /// Pre-programs a stream that yields `fragments` and then fails with `error`.
    pub fn add_failing_stream(&self, key: &str, fragments: &[&str], error: &str) {
        let mut items: Vec<Result<String, String>> =
            fragments.iter().map(|f| Ok(f.to_string())).collect();
        items.push(Err(error.to_string()));
        self.script(key, Script::Fragments(items));
    }

    /// Pre-programs an API failure for prompts containing `key`.
    pub fn add_failure(&self, key: &str, status: u16, body: &str) {
        self.script(key, Script::Fail(status, body.to_string()));
    }

    /// Registers `script` for `key`, replacing an earlier script for the same key in place.
    fn script(&self, key: &str, script: Script) {
        let mut scripts = self.scripts.lock().unwrap();
        match scripts.iter_mut().find(|(existing, _)| existing == key) {
            Some((_, slot)) => *slot = script,
            None => scripts.push((key.to_string(), script)),
        }
    }

    /// Retrieves the recorded calls for assertion.
    pub fn get_calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, model: &str, prompt: &str, use_search: bool, streaming: bool) -> Script {
        self.calls.lock().unwrap().push(RecordedCall {
            model: model.to_string(),
            prompt: prompt.to_string(),
            use_search,
            streaming,
        });
        let scripts = self.scripts.lock().unwrap();
        scripts
            .iter()
            .find(|(key, _)| prompt.contains(key.as_str()))
            .map(|(_, script)| script.clone())
            .unwrap_or_else(|| {
                Script::Fail(
                    500,
                    format!("MockAiProvider: No response programmed for prompt. Got: '{prompt}'"),
                )
            })
    }
}

impl Default for MockAiProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AiProvider for MockAiProvider {
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        use_search: bool,
    ) -> Result<String, ProviderError> {
        match self.record(model, prompt, use_search, false) {
            Script::Text(text) => Ok(text),
            Script::Fragments(items) => items
                .into_iter()
                .collect::<Result<Vec<_>, _>>()
                .map(|parts| parts.concat())
                .map_err(ProviderError::Stream),
            Script::Fail(status, body) => Err(ProviderError::AiApi { status, body }),
        }
    }

    async fn generate_stream(
        &self,
        model: &str,
        prompt: &str,
        use_search: bool,
    ) -> Result<TextStream, ProviderError> {
        let items: Vec<Result<String, ProviderError>> =
            match self.record(model, prompt, use_search, true) {
                Script::Text(text) => vec![Ok(text)],
                Script::Fragments(items) => items
                    .into_iter()
                    .map(|item| item.map_err(ProviderError::Stream))
                    .collect(),
                Script::Fail(status, body) => return Err(ProviderError::AiApi { status, body }),
            };
        Ok(Box::pin(futures::stream::iter(items)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn overlapping_keys_resolve_to_the_first_registered() {
        let provider = MockAiProvider::new();
        provider.add_response("Acme", "first");
        provider.add_response("Acme Corp", "second");
        for _ in 0..20 {
            let text = provider.generate("m", "Report on Acme Corp", false).await.unwrap();
            assert_eq!(text, "first");
        }
    }

    #[tokio::test]
    async fn re_registering_a_key_replaces_its_script() {
        let provider = MockAiProvider::new();
        provider.add_response("Acme", "old");
        provider.add_response("Other", "other");
        provider.add_response("Acme", "new");
        let text = provider.generate("m", "Acme", false).await.unwrap();
        assert_eq!(text, "new");
    }
}
