//! Basic tabular HTML rendering.

use std::io::Write;

use once_cell::sync::Lazy;
use regex::Regex;
use reinhardt_primitives::{Primitive, SerializationResult};

use crate::renderer::{RenderOptions, Renderer};

static URL_PATTERN: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r#"(?i)\b(?:https?://|www\.)[^\s<>"']+"#).expect("URL pattern is valid")
});

/// Escapes `text` and turns bare URLs into links.
///
/// # Examples
///
/// ```
/// use reinhardt_formats::html::urlize;
///
/// assert_eq!(
///     urlize("see www.example.com & more"),
///     "see <a href=\"http://www.example.com\">www.example.com</a> &amp; more"
/// );
/// ```
pub fn urlize(text: &str) -> String {
	let mut output = String::with_capacity(text.len());
	let mut last = 0;
	for found in URL_PATTERN.find_iter(text) {
		// trailing punctuation belongs to the sentence, not the URL
		let url = found.as_str().trim_end_matches(['.', ',', ':', ';', '!', '?', ')']);
		let end = found.start() + url.len();
		output.push_str(&html_escape::encode_text(&text[last..found.start()]));

		let href = if url.to_ascii_lowercase().starts_with("www.") {
			format!("http://{}", url)
		} else {
			url.to_string()
		};
		output.push_str(&format!(
			"<a href=\"{}\">{}</a>",
			html_escape::encode_double_quoted_attribute(&href),
			html_escape::encode_text(url)
		));
		last = end;
	}
	output.push_str(&html_escape::encode_text(&text[last..]));
	output
}

/// Renders mappings as `<table>` and sequences as `<ul>` lists.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlRenderer;

impl HtmlRenderer {
	pub fn new() -> Self {
		Self
	}

	fn write_node(&self, out: &mut dyn Write, data: &Primitive) -> SerializationResult<()> {
		match data {
			Primitive::Map(map) => {
				out.write_all(b"<table>\n")?;
				for (key, value) in map.iter() {
					write!(out, "<tr><td>{}</td><td>", html_escape::encode_text(key))?;
					self.write_node(out, value)?;
					out.write_all(b"</td></tr>\n")?;
				}
				out.write_all(b"</table>\n")?;
			}
			Primitive::Seq(seq) => {
				out.write_all(b"<ul>\n")?;
				for item in seq.items()? {
					out.write_all(b"<li>")?;
					self.write_node(out, item)?;
					out.write_all(b"</li>")?;
				}
				out.write_all(b"</ul>\n")?;
			}
			Primitive::Scalar(scalar) => out.write_all(urlize(&scalar.to_text()).as_bytes())?,
		}
		Ok(())
	}
}

impl Renderer for HtmlRenderer {
	fn media_type(&self) -> &str {
		"text/html; charset=utf-8"
	}

	fn render(
		&self,
		data: &Primitive,
		out: &mut dyn Write,
		_options: &RenderOptions,
	) -> SerializationResult<()> {
		self.write_node(out, data)
	}
}
