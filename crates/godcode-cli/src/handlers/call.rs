//! `godcode call` - run one operation and print its envelope.

use anyhow::Result;
use serde_json::Value;

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Parse a `--payload` argument.
pub fn parse_payload(raw: Option<&str>) -> Result<Option<Value>, CliError> {
    raw.map(|text| {
        serde_json::from_str(text)
            .map_err(|e| CliError::Arguments(format!("payload is not valid JSON: {e}")))
    })
    .transpose()
}

/// Execute the call command.
///
/// The envelope is printed to stdout whether or not the operation succeeded;
/// a failed envelope additionally turns into [`CliError::Operation`] so the
/// process exits non-zero.
pub async fn execute(ctx: &CliContext, operation: &str, payload: Option<&str>) -> Result<()> {
    let payload = parse_payload(payload)?;
    let envelope = ctx.channel.call(operation, payload).await;

    println!("{}", serde_json::to_string_pretty(&envelope)?);

    if envelope.success {
        Ok(())
    } else {
        let message = envelope
            .error
            .unwrap_or_else(|| format!("{operation} failed"));
        Err(CliError::Operation(message).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_payload_is_none() {
        assert_eq!(parse_payload(None).unwrap(), None);
    }

    #[test]
    fn payload_is_decoded() {
        let payload = parse_payload(Some(r#"{"specName":"001"}"#)).unwrap();
        assert_eq!(payload, Some(json!({"specName": "001"})));
    }

    #[test]
    fn malformed_payload_is_an_argument_error() {
        let err = parse_payload(Some("{spec")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
