//! Deploy report normalization.

use quick_xml::events::Event;
use quick_xml::{Reader, Writer};

use crate::error::{LifecycleError, Result};

/// Line ending used for written artifacts on this platform.
#[cfg(windows)]
pub const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_ENDING: &str = "\n";

/// Re-indent report XML with two spaces and platform line endings.
///
/// Whitespace-only text nodes are dropped so repeated formatting is stable.
pub fn format_report(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    loop {
        match reader.read_event()? {
            Event::Eof => break,
            event => writer.write_event(event)?,
        }
    }

    let formatted = String::from_utf8(writer.into_inner())
        .map_err(|e| LifecycleError::Xml(e.to_string()))?;
    Ok(normalize_line_endings(&formatted))
}

/// Convert any mix of `\r\n`, `\r` and `\n` to [`LINE_ENDING`].
pub fn normalize_line_endings(text: &str) -> String {
    let unix = text.replace("\r\n", "\n").replace('\r', "\n");
    if LINE_ENDING == "\n" {
        unix
    } else {
        unix.replace('\n', LINE_ENDING)
    }
}
