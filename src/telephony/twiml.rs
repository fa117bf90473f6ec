//! Call-control markup (TwiML) generation.
//!
//! The carrier fetches this markup when the callee answers; it instructs the
//! carrier to open a media-stream socket back to the gateway, passing the
//! relay parameters through as named stream parameters. Missing parameters
//! render as empty values - the carrier proceeds regardless, so this path
//! has no failure mode.

/// Render the `<Connect><Stream>` document pointing the carrier at the
/// gateway's media-stream endpoint, passing the relay parameters through
/// as named stream parameters.
pub fn connect_stream(stream_url: &str, user_id: &str, prompt: &str, first_message: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Response>
    <Connect>
        <Stream url="{}">
            <Parameter name="user_id" value="{}" />
            <Parameter name="prompt" value="{}" />
            <Parameter name="first_message" value="{}" />
        </Stream>
    </Connect>
</Response>"#,
        xml_escape(stream_url),
        xml_escape(user_id),
        xml_escape(prompt),
        xml_escape(first_message),
    )
}

/// Escape a value for use in XML attribute position.
fn xml_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
