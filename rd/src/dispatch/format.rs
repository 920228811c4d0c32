//! Payload formatting

/// Token placed between the decorators and the raw payload
pub const SEPARATOR: &str = "___";

/// Compose the outbound text for one raw payload
pub fn format_payload(prefix: &str, raw: &str, suffix: &str) -> String {
    let mut text = String::with_capacity(prefix.len() + raw.len() + suffix.len() + 2 * SEPARATOR.len());
    text.push_str(prefix);
    text.push_str(SEPARATOR);
    text.push_str(raw);
    text.push_str(SEPARATOR);
    text.push_str(suffix);
    text
}
