use serde_json::Value;

/// Machine-readable header carried by every injected script.
///
/// The header names the primitive and repeats its arguments, so log lines
/// and offline surfaces can identify a script without parsing JavaScript.
/// The arguments proper are always embedded in the script body as well; the
/// header is informational for real browsers.
#[derive(Clone, Debug, PartialEq)]
pub struct ScriptTag {
    pub name: String,
    pub args: Value,
}

/// Prefix `body` with a `/* pp:<name> <args> */` header line.
pub fn tag_script(name: &str, args: &Value, body: &str) -> String {
    // A "*/" inside serialized args would end the comment early.
    let args_text = args.to_string().replace("*/", "*\\/");
    format!("/* pp:{} {} */\n{}", name, args_text, body)
}

/// Parse the header line written by [`tag_script`], if present.
pub fn parse_tag(script: &str) -> Option<ScriptTag> {
    let first = script.trim_start().lines().next()?;
    let inner = first.strip_prefix("/* pp:")?.strip_suffix("*/")?.trim();
    let (name, rest) = match inner.split_once(' ') {
        Some((name, rest)) => (name, rest.trim()),
        None => (inner, ""),
    };
    if name.is_empty() {
        return None;
    }
    let args = if rest.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(rest).ok()?
    };
    Some(ScriptTag {
        name: name.to_string(),
        args,
    })
}
