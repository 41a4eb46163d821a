//! # Reinhardt Formats
//!
//! Renderers and parsers that move primitive trees to and from bytes.
//!
//! ## Formats
//!
//! | Name | Renderer | Parser |
//! |------|----------|--------|
//! | `json` | [`JsonRenderer`] | [`JsonParser`] |
//! | `yaml` | [`YamlRenderer`] (feature `yaml`) | [`YamlParser`] |
//! | `xml` | [`XmlRenderer`], or [`DumpDataXmlRenderer`] for fixtures | [`DumpDataXmlParser`] |
//! | `csv` | [`CsvRenderer`] | - |
//! | `html` | [`HtmlRenderer`] | - |
//!
//! ## Example
//!
//! ```
//! use reinhardt_formats::{RenderOptions, RendererRegistry};
//! use reinhardt_primitives::Primitive;
//! use serde_json::json;
//!
//! let renderer = RendererRegistry::default().get("json").unwrap();
//! let data = Primitive::from(json!({"a": 1, "b": "foo", "c": true}));
//! let text = renderer.render_to_string(&data, &RenderOptions::new()).unwrap();
//! assert_eq!(text, r#"{"a": 1, "b": "foo", "c": true}"#);
//! ```

pub mod csv_renderer;
pub mod dumpdata;
pub mod format;
pub mod html;
pub mod json;
pub mod registry;
pub mod renderer;
pub mod xml;
#[cfg(feature = "yaml")]
pub mod yaml;

pub use csv_renderer::CsvRenderer;
pub use dumpdata::{DumpDataXmlParser, DumpDataXmlRenderer};
pub use format::Format;
pub use html::HtmlRenderer;
pub use json::{JsonParser, JsonRenderer};
pub use registry::{FIXTURE_FORMATS, PASSTHROUGH_FORMAT, ParserRegistry, RendererRegistry};
pub use renderer::{Parser, RenderOptions, Renderer, SortedKeys};
pub use xml::XmlRenderer;
#[cfg(feature = "yaml")]
pub use yaml::{YamlParser, YamlRenderer};
