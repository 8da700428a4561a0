use crate::config::CompletionConfig;
use crate::{logi, logw};
use anyhow::Result;
use reqwest::Client;
use serde_json::{Value, json};

const SYSTEM_PROMPT: &str = "Eres un maestro espiritual experto en mindfulness, ayurveda, hinduismo y filosofía védica. Generas frases profundas e inspiradoras en español sobre temas específicos de espiritualidad.";

pub fn build_prompt(topic: &str, count: usize) -> String {
    format!(
        "Genera exactamente {count} frases únicas y profundas en español sobre el tema:\n\nTEMA: {topic}\n\nLas frases deben:\n- Estar completamente relacionadas con \"{topic}\"\n- Ser inspiradoras, profundas y originales\n- Entre 12 y 25 palabras cada una\n- Ser completamente DIFERENTES entre sí (no repetir ideas)\n- Incluir conceptos específicos del tema\n- Ser calmantes y motivadoras\n- Usar vocabulario espiritual cuando sea apropiado\n\nResponde SOLO con un JSON en este formato exacto:\n{{\n  \"phrases\": [\n    \"frase 1 sobre {topic}\",\n    \"frase 2 sobre {topic}\",\n    ...\n  ]\n}}\n\nNo incluyas explicaciones, solo el JSON con las {count} frases."
    )
}

pub fn build_request_body(cfg: &CompletionConfig, topic: &str, count: usize) -> Value {
    json!({
        "model": cfg.model,
        "messages": [
            {"role": "system", "content": SYSTEM_PROMPT},
            {"role": "user", "content": build_prompt(topic, count)},
        ],
        "temperature": cfg.temperature,
        "max_tokens": cfg.max_tokens,
        "response_format": {"type": "json_object"},
    })
}

fn extract_message_content(resp_json: &str) -> Option<String> {
    let root: Value = serde_json::from_str(resp_json).ok()?;

    if let Some(err) = root.get("error") {
        if let Some(msg) = err.get("message").and_then(|v| v.as_str()) {
            logw(format!("Completion error message: {}", msg));
        }
        if let Some(typ) = err.get("type").and_then(|v| v.as_str()) {
            logw(format!("Completion error type: {}", typ));
        }
        return None;
    }

    root.get("choices")?
        .as_array()?
        .first()?
        .get("message")?
        .get("content")?
        .as_str()
        .map(str::to_string)
}

/// Pulls the phrase list out of the model's JSON answer. Fails when the key
/// is missing, an entry is not a string, or fewer than `count` non-empty
/// phrases came back; surplus phrases are dropped.
pub fn parse_phrases(content: &str, count: usize) -> Option<Vec<String>> {
    let root: Value = serde_json::from_str(content.trim()).ok()?;
    let list = root
        .get("phrases")
        .or_else(|| root.get("frases"))?
        .as_array()?;

    let mut phrases = Vec::with_capacity(list.len());
    for entry in list {
        let text = entry.as_str()?.trim();
        if !text.is_empty() {
            phrases.push(text.to_string());
        }
    }

    if phrases.len() < count {
        logw(format!(
            "Completion returned {} usable phrases, {} requested",
            phrases.len(),
            count
        ));
        return None;
    }
    phrases.truncate(count);
    Some(phrases)
}

/// One completion round-trip. `Ok(None)` covers every transient failure
/// (HTTP status, malformed body, timeout); the caller decides on back-off.
pub async fn request_phrases(
    client: &Client,
    cfg: &CompletionConfig,
    topic: &str,
    count: usize,
) -> Result<Option<Vec<String>>> {
    let body = build_request_body(cfg, topic, count);

    logi(format!("Calling completion API ({})...", cfg.model));
    let resp = match client
        .post(&cfg.endpoint)
        .bearer_auth(&cfg.api_key)
        .json(&body)
        .timeout(std::time::Duration::from_secs(cfg.timeout_secs))
        .send()
        .await
    {
        Ok(resp) => resp,
        Err(err) => {
            logw(format!("Completion request failed: {}", err));
            return Ok(None);
        }
    };

    let status = resp.status();
    let raw = resp.text().await.unwrap_or_default();

    if !status.is_success() {
        logw(format!("Completion HTTP {}", status.as_u16()));
        if !raw.is_empty() {
            let snippet = raw.chars().take(800).collect::<String>();
            logw(format!("Completion raw body: {}", snippet));
        }
        return Ok(None);
    }

    let Some(content) = extract_message_content(&raw) else {
        logw("Completion response parse failed.");
        return Ok(None);
    };

    Ok(parse_phrases(&content, count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_requests_exact_count_and_topic() {
        let prompt = build_prompt("Gratitud y abundancia", 7);
        assert!(prompt.starts_with("Genera exactamente 7 frases"));
        assert!(prompt.contains("TEMA: Gratitud y abundancia"));
        assert!(prompt.contains("solo el JSON con las 7 frases"));
        assert!(prompt.contains("\"phrases\""));
    }

    #[test]
    fn body_carries_model_and_json_directive() {
        let cfg = CompletionConfig::default();
        let body = build_request_body(&cfg, "Karma", 3);
        assert_eq!(body["model"], "llama-3.3-70b-versatile");
        assert_eq!(body["max_tokens"], 1500);
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["messages"][0]["role"], "system");
        assert!(
            body["messages"][1]["content"]
                .as_str()
                .unwrap()
                .contains("exactamente 3 frases")
        );
    }

    #[test]
    fn extracts_first_choice_content() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"{\"phrases\":[\"a\"]}"}}]}"#;
        assert_eq!(
            extract_message_content(raw).as_deref(),
            Some(r#"{"phrases":["a"]}"#)
        );
    }

    #[test]
    fn error_body_yields_nothing() {
        let raw = r#"{"error":{"message":"rate limited","type":"tokens"}}"#;
        assert!(extract_message_content(raw).is_none());
    }

    #[test]
    fn parses_and_truncates_phrases() {
        let content = r#"{"phrases": [" uno ", "dos", "tres", "cuatro"]}"#;
        assert_eq!(
            parse_phrases(content, 3).unwrap(),
            vec!["uno".to_string(), "dos".to_string(), "tres".to_string()]
        );
    }

    #[test]
    fn accepts_legacy_key() {
        let content = r#"{"frases": ["uno", "dos", "tres"]}"#;
        assert_eq!(parse_phrases(content, 3).unwrap().len(), 3);
    }

    #[test]
    fn rejects_short_or_malformed_answers() {
        assert!(parse_phrases(r#"{"phrases": ["uno", ""]}"#, 2).is_none());
        assert!(parse_phrases(r#"{"phrases": ["uno", 2, "tres"]}"#, 2).is_none());
        assert!(parse_phrases(r#"{"other": []}"#, 1).is_none());
        assert!(parse_phrases("not json", 1).is_none());
    }
}
