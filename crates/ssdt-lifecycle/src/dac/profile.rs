//! Publish profile summary.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::Result;

/// Render the `<PropertyGroup>` entries of a publish profile as
/// `Name = Value` lines, in document order.
pub fn summarize_publish_profile(profile_xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(profile_xml);
    reader.config_mut().trim_text(true);

    let mut lines = Vec::new();
    let mut in_property_group = false;
    let mut current: Option<(String, String)> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if name == "PropertyGroup" {
                    in_property_group = true;
                } else if in_property_group {
                    current = Some((name, String::new()));
                }
            }
            Event::Empty(e) if in_property_group => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                lines.push(format!("{} = ", name));
            }
            Event::Text(t) => {
                if let Some((_, value)) = current.as_mut() {
                    value.push_str(&t.unescape()?);
                }
            }
            Event::CData(t) => {
                if let Some((_, value)) = current.as_mut() {
                    value.push_str(&String::from_utf8_lossy(&t));
                }
            }
            Event::End(e) => {
                if e.local_name().as_ref() == b"PropertyGroup" {
                    in_property_group = false;
                } else if let Some((name, value)) = current.take() {
                    lines.push(format!("{} = {}", name, value));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(lines.join("\n"))
}
