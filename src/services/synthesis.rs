use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::models::card::Card;
use crate::services::card_parser::parse_cards;
use crate::services::chunker::{cards_per_chunk, chunk_words};

const CHUNK_SYSTEM_PROMPT: &str = "You are an expert educator creating precise flashcards. Focus only on the academic content provided, not on meta-information or technical artifacts.";
const TOPIC_SYSTEM_PROMPT: &str = "You are an expert educator specializing in high-level conceptual flashcards that promote deep understanding and connections between ideas.";

/// Characters of normalized text handed to the topic-card request.
const TOPIC_EXCERPT_CHARS: usize = 500;

/// One chat-completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Opaque text-completion capability used to synthesize cards.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, SynthesisError>;
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(
        base_url: &str,
        api_key: &str,
        model: &str,
        timeout: Option<Duration>,
    ) -> Result<Self, SynthesisError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, SynthesisError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SynthesisError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let chat: ChatResponse = response.json().await?;
        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(SynthesisError::EmptyResponse)
    }
}

/// Tunables for [`CardSynthesizer`].
#[derive(Debug, Clone)]
pub struct SynthesisSettings {
    pub chunk_words: usize,
    /// Pause after each chunk request to stay under the provider's rate limit.
    pub call_delay: Duration,
}

/// Turns normalized document text into cards through a [`TextGenerator`].
pub struct CardSynthesizer {
    generator: Arc<dyn TextGenerator>,
    settings: SynthesisSettings,
}

impl CardSynthesizer {
    pub fn new(generator: Arc<dyn TextGenerator>, settings: SynthesisSettings) -> Self {
        Self {
            generator,
            settings,
        }
    }

    /// Generate cards for a whole document.
    ///
    /// `desired_cards` is spread over the chunks. Any chunk failure fails the
    /// document; the optional topic-card pass only logs its failures.
    pub async fn synthesize(
        &self,
        text: &str,
        desired_cards: u32,
        include_topic_cards: bool,
    ) -> Result<Vec<Card>, SynthesisError> {
        let chunks = chunk_words(text, self.settings.chunk_words);
        if chunks.is_empty() {
            return Err(SynthesisError::EmptyText);
        }

        let per_chunk = cards_per_chunk(desired_cards, chunks.len());
        let total = chunks.len();
        let mut cards = Vec::new();

        for (i, chunk) in chunks.iter().enumerate() {
            let request = chunk_request(per_chunk, i + 1, total, chunk);
            metrics::counter!("synthesis_requests_total").increment(1);

            let response = self
                .generator
                .complete(request)
                .await
                .map_err(|e| SynthesisError::Chunk {
                    index: i + 1,
                    total,
                    source: Box::new(e),
                })?;

            let parsed = parse_cards(&response).map_err(|e| SynthesisError::Chunk {
                index: i + 1,
                total,
                source: Box::new(e),
            })?;

            tracing::debug!(chunk = i + 1, total, cards = parsed.len(), "Chunk synthesized");
            cards.extend(parsed);

            if !self.settings.call_delay.is_zero() {
                tokio::time::sleep(self.settings.call_delay).await;
            }
        }

        if include_topic_cards && !cards.is_empty() {
            metrics::counter!("synthesis_requests_total").increment(1);
            let request = topic_request(desired_cards, text);
            match self.generator.complete(request).await.and_then(|r| parse_cards(&r)) {
                Ok(topic_cards) => cards.extend(topic_cards),
                Err(e) => tracing::warn!(error = %e, "Topic card generation failed, skipping"),
            }
        }

        Ok(cards)
    }
}

fn chunk_request(cards: u32, part: usize, parts: usize, chunk: &str) -> CompletionRequest {
    let prompt = format!(
        "Create {cards} high-quality flashcards from this academic text.

Requirements for the flashcards:
1. Focus ONLY on the actual content and concepts from the text
2. Each card should teach a specific concept, definition, or relationship
3. Questions should promote understanding and critical thinking
4. Use clear, academic language appropriate for the subject matter
5. Include relevant examples or applications when available
6. Ensure each card is unique and not redundant
7. Questions should be specific and unambiguous
8. Answers should be comprehensive yet concise

This is part {part} of {parts} from the document.

Format each card exactly as:
Q: [Question]
A: [Answer]

Text to process:
{chunk}"
    );

    CompletionRequest {
        system: CHUNK_SYSTEM_PROMPT.to_string(),
        prompt,
        max_tokens: 2000,
        temperature: 0.5,
    }
}

fn topic_request(cards: u32, text: &str) -> CompletionRequest {
    let excerpt: String = text.chars().take(TOPIC_EXCERPT_CHARS).collect();
    let prompt = format!(
        "Create {cards} high-level conceptual flashcards that connect and synthesize the main themes and concepts from this document.

Guidelines:
1. Focus on relationships between major concepts
2. Emphasize fundamental principles and their applications
3. Include cards that compare and contrast key ideas
4. Avoid surface-level or trivial information
5. Answers should provide clear, comprehensive explanations

Format each card exactly as:
Q: [Question]
A: [Answer]

Topics covered in the document:
{excerpt}"
    );

    CompletionRequest {
        system: TOPIC_SYSTEM_PROMPT.to_string(),
        prompt,
        max_tokens: 2000,
        temperature: 0.7,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error("HTTP request to text generation API failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("text generation API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("text generation API returned no content")]
    EmptyResponse,

    #[error("no valid cards found in response")]
    NoCardsParsed,

    #[error("no usable text to generate cards from")]
    EmptyText,

    #[error("chunk {index}/{total}: {source}")]
    Chunk {
        index: usize,
        total: usize,
        #[source]
        source: Box<SynthesisError>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct Scripted {
        responses: Mutex<VecDeque<Result<String, SynthesisError>>>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl Scripted {
        fn new(responses: Vec<Result<String, SynthesisError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl TextGenerator for Scripted {
        async fn complete(&self, request: CompletionRequest) -> Result<String, SynthesisError> {
            self.requests.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(SynthesisError::EmptyResponse))
        }
    }

    fn synthesizer(generator: Arc<Scripted>, chunk_words: usize) -> CardSynthesizer {
        CardSynthesizer::new(
            generator,
            SynthesisSettings {
                chunk_words,
                call_delay: Duration::ZERO,
            },
        )
    }

    #[tokio::test]
    async fn test_one_request_per_chunk() {
        let gen = Scripted::new(vec![
            Ok("Q: one?\nA: 1".to_string()),
            Ok("Q: two?\nA: 2".to_string()),
        ]);
        let cards = synthesizer(gen.clone(), 3)
            .synthesize("a b c d e", 4, false)
            .await
            .unwrap();

        assert_eq!(cards.len(), 2);
        let requests = gen.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].prompt.starts_with("Create 2 high-quality"));
        assert!(requests[1].prompt.contains("part 2 of 2"));
    }

    #[tokio::test]
    async fn test_chunk_failure_fails_document() {
        let gen = Scripted::new(vec![Ok("nothing useful".to_string())]);
        let err = synthesizer(gen, 1000)
            .synthesize("some text here", 5, false)
            .await
            .unwrap_err();
        assert!(matches!(err, SynthesisError::Chunk { index: 1, total: 1, .. }));
    }

    #[tokio::test]
    async fn test_topic_failure_is_not_fatal() {
        let gen = Scripted::new(vec![
            Ok("Q: kept?\nA: yes".to_string()),
            Err(SynthesisError::Api {
                status: 429,
                body: "rate limited".to_string(),
            }),
        ]);
        let cards = synthesizer(gen.clone(), 1000)
            .synthesize("document body", 5, true)
            .await
            .unwrap();

        assert_eq!(cards, vec![Card::new("kept?", "yes")]);
        assert_eq!(gen.requests.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_topic_cards_are_appended() {
        let gen = Scripted::new(vec![
            Ok("Q: detail?\nA: d".to_string()),
            Ok("Q: big picture?\nA: b".to_string()),
        ]);
        let cards = synthesizer(gen.clone(), 1000)
            .synthesize("document body", 3, true)
            .await
            .unwrap();

        assert_eq!(cards.len(), 2);
        assert_eq!(cards[1].question, "big picture?");
        let requests = gen.requests.lock().unwrap();
        assert!(requests[1].prompt.starts_with("Create 3 high-level"));
        assert!(requests[1].prompt.ends_with("document body"));
    }

    #[tokio::test]
    async fn test_empty_text_is_rejected_without_calls() {
        let gen = Scripted::new(vec![]);
        let err = synthesizer(gen.clone(), 1000)
            .synthesize("", 5, false)
            .await
            .unwrap_err();
        assert!(matches!(err, SynthesisError::EmptyText));
        assert!(gen.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_similar_questions_are_all_kept() {
        let response = "Q: Who proved Theorem 1?\nA: Alice\n\
                        Q: Who proved Theorem 2?\nA: Bob\n\
                        Q: Who proved Theorem 3?\nA: Carol\n";
        let gen = Scripted::new(vec![Ok(response.to_string())]);
        let cards = synthesizer(gen, 1000)
            .synthesize("three theorems and their authors", 3, false)
            .await
            .unwrap();

        assert_eq!(
            cards,
            vec![
                Card::new("Who proved Theorem 1?", "Alice"),
                Card::new("Who proved Theorem 2?", "Bob"),
                Card::new("Who proved Theorem 3?", "Carol"),
            ]
        );
    }
}
