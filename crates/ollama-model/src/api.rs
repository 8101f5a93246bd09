use std::future::poll_fn;
use std::pin::pin;
use std::time::Duration;

use local_agent_model::{
    ErrorKind, ModelMessage, ModelProvider, ModelRequest, ModelResponse,
    ModelResponseEvent, ResponseFormat,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::io::{Chunks, NdJson};
use crate::proto::{
    self, GenerateChunk, ModelInfo, PullChunk, PullProgress, PullRequest,
    TagsResponse, VersionResponse,
};
use crate::{Error, OllamaProvider, check_response};

const CONNECTION_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// System message used by [`OllamaProvider::ask_structured`] when the
/// caller doesn't supply one.
pub const DEFAULT_JSON_SYSTEM_MESSAGE: &str =
    "You are a helpful assistant. Provide your answer in JSON format.";

impl OllamaProvider {
    /// Checks whether the server is up and answering.
    ///
    /// Never fails: any transport error, timeout or error status is
    /// logged and reported as `false`.
    pub async fn check_connection(&self) -> bool {
        let resp = self
            .client
            .get(self.config.endpoint("/api/version"))
            .timeout(CONNECTION_CHECK_TIMEOUT)
            .send()
            .await;
        match resp {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                warn!("connection check got HTTP {}", resp.status());
                false
            }
            Err(err) => {
                warn!("connection check failed: {err}");
                false
            }
        }
    }

    /// Returns the server version string.
    pub async fn version(&self) -> Result<String, Error> {
        let resp: VersionResponse = self.get_json("/api/version").await?;
        Ok(resp.version)
    }

    /// Lists the models installed on the server.
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, Error> {
        let resp: TagsResponse = self.get_json("/api/tags").await?;
        Ok(resp.models)
    }

    /// Downloads `model` from the registry, reporting each progress line.
    pub async fn pull_model(
        &self,
        model: &str,
        mut on_progress: impl FnMut(&PullProgress),
    ) -> Result<(), Error> {
        let resp_fut = self
            .client
            .post(self.config.endpoint("/api/pull"))
            .json(&PullRequest {
                model,
                stream: true,
            })
            .send();
        let resp = check_response(resp_fut.await).await?;

        let mut lines = NdJson::new(Chunks::from_response(resp));
        while let Some(chunk) = next_record::<PullChunk>(&mut lines).await? {
            if let Some(error) = chunk.error {
                return Err(Error::new(error, ErrorKind::Other));
            }
            on_progress(&PullProgress {
                status: chunk.status,
                total: chunk.total,
                completed: chunk.completed,
            });
        }
        Ok(())
    }

    /// Generates a completion for a single prompt with `/api/generate`.
    ///
    /// `on_delta` sees every streamed piece of text, the full text is
    /// returned at the end.
    pub async fn generate(
        &self,
        prompt: &str,
        mut on_delta: impl FnMut(&str),
    ) -> Result<String, Error> {
        let generate_req = proto::create_generate_request(prompt, &self.config);
        let resp_fut = self
            .client
            .post(self.config.endpoint("/api/generate"))
            .json(&generate_req)
            .send();
        let resp = check_response(resp_fut.await).await?;

        let mut text = String::new();
        let mut lines = NdJson::new(Chunks::from_response(resp));
        while let Some(chunk) = next_record::<GenerateChunk>(&mut lines).await?
        {
            if let Some(error) = chunk.error {
                return Err(Error::new(error, ErrorKind::Other));
            }
            if !chunk.response.is_empty() {
                on_delta(&chunk.response);
                text.push_str(&chunk.response);
            }
            if chunk.done {
                break;
            }
        }
        Ok(text)
    }

    /// Asks the model in JSON mode and decodes its answer.
    ///
    /// The answer must be a valid JSON document. Otherwise the call fails
    /// with [`ErrorKind::InvalidResponse`] and the raw text in the error
    /// message, rather than returning partial data.
    pub async fn ask_structured(
        &self,
        prompt: &str,
        system_message: Option<&str>,
    ) -> Result<Value, Error> {
        let mut req = ModelRequest::with_messages([
            ModelMessage::System(
                system_message
                    .unwrap_or(DEFAULT_JSON_SYSTEM_MESSAGE)
                    .to_owned(),
            ),
            ModelMessage::User(prompt.to_owned()),
        ]);
        req.format = Some(ResponseFormat::Json);

        let resp = self.send_request(&req).await?;
        let text = collect_text(resp).await?;
        parse_structured(&text)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, Error> {
        let resp_fut = self.client.get(self.config.endpoint(path)).send();
        let resp = check_response(resp_fut.await).await?;
        resp.json().await.map_err(Error::from_reqwest)
    }
}

async fn next_record<T: DeserializeOwned>(
    lines: &mut NdJson,
) -> Result<Option<T>, Error> {
    let line = lines.next_line().await.map_err(|err| {
        Error::new(format!("{err:?}"), ErrorKind::InvalidResponse)
    })?;
    let Some(line) = line else {
        return Ok(None);
    };
    trace!("got line: {line}");
    serde_json::from_str(&line)
        .map(Some)
        .map_err(|err| Error::new(format!("{err}"), ErrorKind::InvalidResponse))
}

async fn collect_text<R: ModelResponse<Error = Error>>(
    resp: R,
) -> Result<String, Error> {
    let mut resp = pin!(resp);
    let mut text = String::new();
    while let Some(event) =
        poll_fn(|cx| resp.as_mut().poll_next_event(cx)).await?
    {
        if let ModelResponseEvent::MessageDelta(delta) = event {
            text.push_str(&delta);
        }
    }
    Ok(text)
}

pub(crate) fn parse_structured(text: &str) -> Result<Value, Error> {
    serde_json::from_str(text).map_err(|err| {
        warn!("model response was not valid JSON: {text}");
        Error::new(
            format!("response is not valid JSON ({err}): {text}"),
            ErrorKind::InvalidResponse,
        )
    })
}

#[cfg(test)]
mod tests {
    use local_agent_model::ModelProviderError;
    use serde_json::json;

    use super::*;
    use crate::OllamaConfigBuilder;

    #[test]
    fn test_parse_structured() {
        let value = parse_structured(
            r#"{"summary": "Containers package apps.", "benefits": ["a", "b", "c"]}"#,
        )
        .unwrap();
        assert_eq!(value["benefits"], json!(["a", "b", "c"]));

        let err = parse_structured(r#"{"summary": "cut off"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidResponse);
        assert!(err.message().contains("cut off"));

        let err = parse_structured("Sure! Here is the JSON:").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidResponse);
    }

    #[tokio::test]
    async fn test_check_connection_unreachable() {
        // Port 9 (discard) is not served on test machines.
        let provider = OllamaProvider::new(
            OllamaConfigBuilder::new()
                .with_host("http://127.0.0.1:9")
                .build(),
        );
        assert!(!provider.check_connection().await);
    }
}
