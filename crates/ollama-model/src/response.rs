use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll, ready};

use local_agent_model::{
    ErrorKind, ModelFinishReason, ModelResponse, ModelResponseEvent,
    OpaqueMessage, ToolCallRequest,
};
use pin_project_lite::pin_project;

use crate::Error;
use crate::io::NdJson;
use crate::proto::{ChatChunk, Message, ToolCall};

static NEXT_MESSAGE_ID: AtomicU64 = AtomicU64::new(0);

struct PartialState {
    lines: NdJson,
    content: String,
    tool_calls: Vec<ToolCall>,
    // Index of tool calls that are received but not yet handed out by
    // `poll_next_event`.
    pending_tool_call_idx: VecDeque<usize>,
    // Cleared after the response returns the complete event.
    pending_finish_reason: Option<ModelFinishReason>,
    done: bool,
}

impl PartialState {
    #[inline]
    fn finish(self) -> (String, Message) {
        let id = NEXT_MESSAGE_ID.fetch_add(1, Ordering::Relaxed);
        (
            format!("ollama:{id}"),
            Message::Assistant {
                content: self.content,
                tool_calls: if self.tool_calls.is_empty() {
                    None
                } else {
                    Some(self.tool_calls)
                },
            },
        )
    }
}

type PinnedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type NextEvent = Result<(Option<ModelResponseEvent>, PartialState), Error>;

pin_project! {
    /// A streamed `/api/chat` response.
    pub struct OllamaResponse {
        next_event_fut: Option<PinnedFuture<NextEvent>>,
        full_msg: Option<(String, Message)>,
    }
}

impl OllamaResponse {
    #[inline]
    pub(crate) fn from_lines(lines: NdJson) -> Self {
        let partial_state = PartialState {
            lines,
            content: Default::default(),
            tool_calls: Default::default(),
            pending_tool_call_idx: Default::default(),
            pending_finish_reason: Default::default(),
            done: false,
        };
        let next_event_fut = async move { next_event(partial_state).await };
        Self {
            next_event_fut: Some(Box::pin(next_event_fut)),
            full_msg: None,
        }
    }
}

impl ModelResponse for OllamaResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.project();
        let Some(next_event_fut) = this.next_event_fut else {
            return Poll::Ready(Ok(None));
        };
        let (event, partial_state) =
            match ready!(next_event_fut.as_mut().poll(cx)) {
                Ok((Some(event), partial_state)) => (event, partial_state),
                Ok((None, partial_state)) => {
                    *this.next_event_fut = None;
                    *this.full_msg = Some(partial_state.finish());
                    return Poll::Ready(Ok(None));
                }
                Err(err) => {
                    *this.next_event_fut = None;
                    return Poll::Ready(Err(err));
                }
            };

        let next_event_fut = async move { next_event(partial_state).await };
        *this.next_event_fut = Some(Box::pin(next_event_fut));

        Poll::Ready(Ok(Some(event)))
    }

    fn make_opaque_message(&self) -> Option<OpaqueMessage> {
        self.full_msg
            .as_ref()
            .map(|(id, msg)| OpaqueMessage::new(id, msg.clone()))
    }
}

async fn next_event(
    mut partial_state: PartialState,
) -> Result<(Option<ModelResponseEvent>, PartialState), Error> {
    let mut message_delta = None;

    while !partial_state.done {
        let line = match partial_state.lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                return Err(Error::new(
                    "stream ended before the response was done",
                    ErrorKind::InvalidResponse,
                ));
            }
            Err(err) => {
                return Err(Error::new(
                    format!("{err:?}"),
                    ErrorKind::InvalidResponse,
                ));
            }
        };
        trace!("got chat line: {line}");

        let chunk = serde_json::from_str::<ChatChunk>(&line).map_err(|err| {
            Error::new(format!("{err}"), ErrorKind::InvalidResponse)
        })?;
        if let Some(error) = chunk.error {
            return Err(Error::new(error, ErrorKind::Other));
        }

        if let Some(message) = chunk.message {
            if !message.content.is_empty() {
                partial_state.content.push_str(&message.content);
                message_delta = Some(message.content);
            }
            for tool_call in message.tool_calls.into_iter().flatten() {
                partial_state
                    .pending_tool_call_idx
                    .push_back(partial_state.tool_calls.len());
                partial_state.tool_calls.push(tool_call);
            }
        }

        if chunk.done {
            partial_state.done = true;
            let finish_reason = match chunk.done_reason.as_deref() {
                Some("length") => ModelFinishReason::Length,
                _ if !partial_state.tool_calls.is_empty() => {
                    ModelFinishReason::ToolCalls
                }
                _ => ModelFinishReason::Stop,
            };
            partial_state.pending_finish_reason = Some(finish_reason);
        }

        if message_delta.is_some() {
            break;
        }
    }

    // Always emit message delta first, then pending tool calls, and
    // finally the pending finish reason.

    if let Some(message_delta) = message_delta {
        return Ok((
            Some(ModelResponseEvent::MessageDelta(message_delta)),
            partial_state,
        ));
    }

    if let Some(idx) = partial_state.pending_tool_call_idx.pop_front() {
        let tool_call = &mut partial_state.tool_calls[idx];
        let id = tool_call
            .id
            .get_or_insert_with(|| format!("call_{idx}"))
            .clone();
        let event = ModelResponseEvent::ToolCall(ToolCallRequest {
            id,
            name: tool_call.function.name.clone(),
            arguments: tool_call.function.arguments.clone(),
        });
        return Ok((Some(event), partial_state));
    }

    if let Some(finish_reason) = partial_state.pending_finish_reason.take() {
        return Ok((
            Some(ModelResponseEvent::Completed(finish_reason)),
            partial_state,
        ));
    }

    Ok((None, partial_state))
}

#[cfg(test)]
mod tests {
    use std::future::poll_fn;
    use std::pin::pin;

    use bytes::Bytes;
    use local_agent_model::ModelProviderError;
    use serde_json::json;

    use super::*;
    use crate::io::Chunks;

    fn response_from(chunks: Vec<&'static [u8]>) -> OllamaResponse {
        let chunks = Chunks::from_vec_deque(
            chunks.into_iter().map(Bytes::from_static).collect(),
        );
        OllamaResponse::from_lines(NdJson::new(chunks))
    }

    async fn drain(
        resp: OllamaResponse,
    ) -> Result<(Vec<ModelResponseEvent>, Option<OpaqueMessage>), Error> {
        let mut resp = pin!(resp);
        let mut events = vec![];
        while let Some(event) =
            poll_fn(|cx| resp.as_mut().poll_next_event(cx)).await?
        {
            events.push(event);
        }
        Ok((events, resp.make_opaque_message()))
    }

    #[tokio::test]
    async fn test_tool_call_events() {
        let resp = response_from(vec![include_bytes!(
            "../fixtures/chat_tool_calls.ndjson"
        )]);
        let (events, opaque) = drain(resp).await.unwrap();

        assert_eq!(
            events,
            vec![
                ModelResponseEvent::MessageDelta("Let me ".to_owned()),
                ModelResponseEvent::MessageDelta("check.".to_owned()),
                ModelResponseEvent::ToolCall(ToolCallRequest {
                    id: "call_0".to_owned(),
                    name: "check_docker_status".to_owned(),
                    arguments: json!({}),
                }),
                ModelResponseEvent::ToolCall(ToolCallRequest {
                    id: "call_1".to_owned(),
                    name: "calculate".to_owned(),
                    arguments: json!({ "expression": "3.5 * 60" }),
                }),
                ModelResponseEvent::Completed(ModelFinishReason::ToolCalls),
            ]
        );

        let opaque = opaque.unwrap();
        let Message::Assistant {
            content,
            tool_calls,
        } = opaque.to_raw::<Message>().unwrap()
        else {
            panic!("expected an assistant message");
        };
        assert_eq!(content, "Let me check.");
        let tool_calls = tool_calls.as_ref().unwrap();
        assert_eq!(tool_calls[1].id.as_deref(), Some("call_1"));
    }

    #[tokio::test]
    async fn test_plain_answer() {
        let resp = response_from(vec![
            b"{\"message\":{\"role\":\"assistant\",\"content\":\"13884\"},\"done\":false}\n",
            b"{\"message\":{\"role\":\"assistant\",\"content\":\"\"},\"done\":true,\"done_reason\":\"stop\"}\n",
        ]);
        let (events, _) = drain(resp).await.unwrap();
        assert_eq!(
            events,
            vec![
                ModelResponseEvent::MessageDelta("13884".to_owned()),
                ModelResponseEvent::Completed(ModelFinishReason::Stop),
            ]
        );
    }

    #[tokio::test]
    async fn test_in_stream_error() {
        let resp = response_from(vec![
            b"{\"error\":\"model \\\"nope\\\" not found, try pulling it first\"}\n",
        ]);
        let err = drain(resp).await.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Other);
        assert!(err.message().contains("not found"));
    }

    #[tokio::test]
    async fn test_truncated_stream() {
        let resp = response_from(vec![
            b"{\"message\":{\"role\":\"assistant\",\"content\":\"Hel\"},\"done\":false}\n",
        ]);
        let err = drain(resp).await.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidResponse);
    }
}
