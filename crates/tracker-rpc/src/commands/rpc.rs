use crate::cli::{OutputFormat, RpcCommands};
use crate::config::Config;
use crate::rpc::{verifier_for, Dispatcher, RpcError};
use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use std::io::{BufRead, Write};
use tracing::{info, warn};
use tracker_core::TrackerClient;

pub fn handle_rpc(
    client: &dyn TrackerClient,
    config: &Config,
    action: &RpcCommands,
    format: OutputFormat,
) -> Result<()> {
    let dispatcher = Dispatcher::new(client, verifier_for(config.rpc.token.as_deref()))
        .with_request_timeout(config.request_timeout());

    match action {
        RpcCommands::Serve => {
            let stdin = std::io::stdin();
            let stdout = std::io::stdout();
            serve(&dispatcher, stdin.lock(), stdout.lock())
        }
        RpcCommands::Call { method, params } => handle_call(&dispatcher, config, method, params, format),
    }
}

/// Answer newline-delimited requests until the input ends.
pub fn serve<R: BufRead, W: Write>(dispatcher: &Dispatcher<'_>, input: R, mut output: W) -> Result<()> {
    info!("serving JSON-RPC on stdio");
    let mut handled = 0usize;

    for line in input.lines() {
        let line = line.context("Failed to read request")?;
        if line.trim().is_empty() {
            continue;
        }
        let response = dispatcher.handle_line(&line);
        if let Some(error) = &response.error {
            warn!(code = error.code, message = %error.message, "request failed");
        }
        let encoded = serde_json::to_string(&response).context("Failed to encode response")?;
        writeln!(output, "{}", encoded).context("Failed to write response")?;
        output.flush().context("Failed to write response")?;
        handled += 1;
    }

    info!(handled, "input closed, stopping");
    Ok(())
}

fn handle_call(
    dispatcher: &Dispatcher<'_>,
    config: &Config,
    method: &str,
    params: &str,
    format: OutputFormat,
) -> Result<()> {
    let mut params: Value =
        serde_json::from_str(params).with_context(|| format!("Invalid JSON params '{}'", params))?;
    inject_tracker(&mut params, config)?;

    let result = dispatcher.call(method, params).map_err(rpc_failure)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => match &result {
            Value::String(s) => println!("{}", s),
            other => println!("{}", serde_json::to_string_pretty(other)?),
        },
    }
    Ok(())
}

/// Fill in the configured tracker when the params name none.
fn inject_tracker(params: &mut Value, config: &Config) -> Result<()> {
    let Some(obj) = params.as_object_mut() else {
        return Ok(());
    };
    if obj.contains_key("tracker") || config.url.is_none() {
        return Ok(());
    }
    let tracker = serde_json::to_value(config.tracker()).context("Failed to encode tracker")?;
    obj.insert("tracker".to_string(), tracker);
    Ok(())
}

fn rpc_failure(error: RpcError) -> anyhow::Error {
    match error.data {
        Some(Value::String(detail)) => anyhow!("{} ({}): {}", error.message, error.code, detail),
        _ => anyhow!("{} ({})", error.message, error.code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::AllowAll;
    use redmine_backend::RedmineClient;
    use serde_json::json;

    #[test]
    fn serve_answers_each_line_in_order() {
        let client = RedmineClient::default();
        let dispatcher = Dispatcher::new(&client, Box::new(AllowAll));
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"API.Version"}"#,
            "\n\n",
            "not json\n",
            r#"{"jsonrpc":"2.0","id":"x","method":"Nope"}"#,
            "\n"
        );
        let mut output = Vec::new();

        serve(&dispatcher, input.as_bytes(), &mut output).unwrap();

        let lines: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["id"], 1);
        assert_eq!(lines[0]["result"], env!("CARGO_PKG_VERSION"));
        assert_eq!(lines[1]["error"]["code"], -32700);
        assert_eq!(lines[2]["id"], "x");
        assert_eq!(lines[2]["error"]["code"], -32601);
    }

    #[test]
    fn inject_tracker_only_when_absent() {
        let mut config = Config::default();
        config.merge_with_cli(Some("http://rm".into()), Some("alice".into()), None);

        let mut params = json!({"issue_id": 4});
        inject_tracker(&mut params, &config).unwrap();
        assert_eq!(params["tracker"]["url"], "http://rm");
        assert_eq!(params["tracker"]["type"], "REDMINE");

        let mut explicit = json!({"tracker": {"url": "http://other"}});
        inject_tracker(&mut explicit, &config).unwrap();
        assert_eq!(explicit["tracker"], json!({"url": "http://other"}));
    }

    #[test]
    fn rpc_failure_includes_detail() {
        let err = rpc_failure(RpcError {
            code: 101,
            message: "TRACKER_VALIDATION_ERROR".into(),
            data: Some(json!("Subject cannot be blank")),
        });
        assert_eq!(
            err.to_string(),
            "TRACKER_VALIDATION_ERROR (101): Subject cannot be blank"
        );
    }
}
