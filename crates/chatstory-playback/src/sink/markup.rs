/// Escape the five HTML-significant characters
pub fn escape_html(text: &str) -> String {
	let mut escaped = String::with_capacity(text.len());
	for c in text.chars() {
		match c {
			'&' => escaped.push_str("&amp;"),
			'<' => escaped.push_str("&lt;"),
			'>' => escaped.push_str("&gt;"),
			'"' => escaped.push_str("&quot;"),
			'\'' => escaped.push_str("&#039;"),
			_ => escaped.push(c),
		}
	}
	escaped
}

/// Message body markup: blank-line separated text becomes trimmed `<p>` blocks,
/// anything else keeps its line breaks as `<br>`
pub fn format_message_text(text: &str) -> String {
	let paragraphs: Vec<&str> = text.split("\n\n").collect();
	if paragraphs.len() > 1 {
		return paragraphs.iter().map(|p| format!("<p>{}</p>", escape_html(p.trim()))).collect();
	}
	escape_html(text).replace('\n', "<br>")
}

/// Uppercased first character of a name, used when there is no avatar image
pub fn avatar_initial(name: &str) -> String {
	name.chars().next().map(|c| c.to_uppercase().collect()).unwrap_or_default()
}
