use super::*;
use crate::config::OpenAiConfig;

fn configured() -> OpenAiConfig {
    OpenAiConfig {
        api_key: Some("sk-test".to_string()),
        api_base: "https://api.example.com/v1/".to_string(),
        embedding_model: "test-embed".to_string(),
        chat_model: "test-chat".to_string(),
    }
}

#[test]
fn client_configuration() {
    let client = OpenAiClient::from_config(&configured()).expect("key is set");

    assert_eq!(client.api_key, "sk-test");
    // Trailing slash is stripped so endpoint paths join cleanly.
    assert_eq!(client.api_base, "https://api.example.com/v1");
    assert_eq!(client.embedding_model, "test-embed");
    assert_eq!(client.chat_model, "test-chat");
    assert_eq!(client.retry_attempts, DEFAULT_RETRY_ATTEMPTS);
}

#[test]
fn client_requires_api_key() {
    let mut config = configured();
    config.api_key = None;
    assert!(OpenAiClient::from_config(&config).is_none());

    config.api_key = Some("   ".to_string());
    assert!(OpenAiClient::from_config(&config).is_none());
}

#[test]
fn client_builder_methods() {
    let client = OpenAiClient::from_config(&configured())
        .expect("key is set")
        .with_timeout(Duration::from_secs(60))
        .with_retry_attempts(5);

    assert_eq!(client.retry_attempts, 5);
}

#[test]
fn truncation_preserves_short_input() {
    let text = "short input";
    assert!(matches!(
        truncate_chars(text, EMBED_INPUT_MAX_CHARS),
        Cow::Borrowed(_)
    ));
}

#[test]
fn truncation_counts_chars_not_bytes() {
    // Multibyte characters must not be split mid-codepoint.
    let text = "é".repeat(EMBED_INPUT_MAX_CHARS + 10);
    let truncated = truncate_chars(&text, EMBED_INPUT_MAX_CHARS);
    assert_eq!(truncated.chars().count(), EMBED_INPUT_MAX_CHARS);
}
