use anyhow::{Result, bail};

use lessonplan_core::payload::validate_generation_payload;
use lessonplan_core::prompt::compose;

/// Validate a request body and render the instruction the model would get.
pub fn render_prompt(body: &[u8]) -> Result<String> {
    match validate_generation_payload(body) {
        Ok(payload) => Ok(compose(&payload).to_text()),
        Err(err) => bail!("{}", err.caller_message()),
    }
}

#[cfg(test)]
mod tests {
    use lessonplan_test_utils::sample_request_bytes;

    use super::*;

    #[test]
    fn renders_both_instruction_parts() {
        let text = render_prompt(&sample_request_bytes()).unwrap();
        assert!(text.contains("Climate Change"));
        assert!(text.contains("45"));
        assert!(text.contains("mensagem_erro"));
    }

    #[test]
    fn invalid_body_is_an_error() {
        let msg = render_prompt(br#"{"main_theme": ""}"#).unwrap_err().to_string();
        assert!(msg.starts_with("Invalid request payload"), "{msg}");
        assert!(msg.contains("main_theme"), "{msg}");
    }
}
