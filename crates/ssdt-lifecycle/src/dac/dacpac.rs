//! Reading dacpac archives: the schema model and deployment scripts.
//!
//! A dacpac is a zip archive containing `model.xml` plus the optional
//! `predeploy.sql` / `postdeploy.sql` scripts.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::core::DefaultConstraint;
use crate::error::{LifecycleError, Result};

const MODEL_ENTRY: &str = "model.xml";
const PRE_DEPLOY_ENTRY: &str = "predeploy.sql";
const POST_DEPLOY_ENTRY: &str = "postdeploy.sql";

const DEFAULT_CONSTRAINT_TYPE: &[u8] = b"SqlDefaultConstraint";

/// Contents of a dacpac relevant to deployment.
#[derive(Debug, Clone, Default)]
pub struct DacpacContents {
    pub model: String,
    pub pre_deployment_script: Option<String>,
    pub post_deployment_script: Option<String>,
}

/// Read the model and deployment scripts from a dacpac.
pub fn read_dacpac(path: &Path) -> Result<DacpacContents> {
    let file = File::open(path)?;
    let mut archive = ZipArchive::new(file)?;

    let model = read_entry(&mut archive, MODEL_ENTRY)?.ok_or_else(|| {
        LifecycleError::Archive(format!("{} has no {}", path.display(), MODEL_ENTRY))
    })?;

    Ok(DacpacContents {
        model,
        pre_deployment_script: read_entry(&mut archive, PRE_DEPLOY_ENTRY)?,
        post_deployment_script: read_entry(&mut archive, POST_DEPLOY_ENTRY)?,
    })
}

fn read_entry(archive: &mut ZipArchive<File>, name: &str) -> Result<Option<String>> {
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut content = String::new();
    entry.read_to_string(&mut content)?;
    // model.xml is written with a byte order mark
    Ok(Some(content.trim_start_matches('\u{feff}').to_string()))
}

/// Default constraint under construction while walking the model.
#[derive(Default)]
struct PartialConstraint {
    name: Option<String>,
    table: Option<Vec<String>>,
    column: Option<Vec<String>>,
    relationship: Option<String>,
    nested_elements: usize,
}

impl PartialConstraint {
    fn finish(self) -> Option<DefaultConstraint> {
        let table = self.table?;
        let column = self.column?;
        let (schema_name, table_name) = match table.as_slice() {
            [schema, table] => (schema.clone(), table.clone()),
            _ => return None,
        };
        let column_name = column.last()?.clone();
        let constraint_name = self
            .name
            .as_deref()
            .map(split_identifier)
            .and_then(|parts| parts.last().cloned());

        Some(DefaultConstraint {
            schema_name,
            table_name,
            column_name,
            constraint_name,
        })
    }
}

/// Extract all default constraints from `model.xml` content.
///
/// Constraints without a `Name` attribute are the unnamed ones.
pub fn parse_default_constraints(model_xml: &str) -> Result<Vec<DefaultConstraint>> {
    let mut reader = Reader::from_str(model_xml);
    reader.config_mut().trim_text(true);

    let mut constraints = Vec::new();
    let mut current: Option<PartialConstraint> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match (&mut current, e.local_name().as_ref()) {
                (None, b"Element") => {
                    if attribute(&e, "Type")?.as_deref().map(str::as_bytes) == Some(DEFAULT_CONSTRAINT_TYPE) {
                        current = Some(PartialConstraint {
                            name: attribute(&e, "Name")?,
                            ..Default::default()
                        });
                    }
                }
                (Some(c), b"Element") => c.nested_elements += 1,
                (Some(c), b"Relationship") if c.nested_elements == 0 => {
                    c.relationship = attribute(&e, "Name")?;
                }
                (Some(c), b"References") => record_reference(c, &e)?,
                _ => {}
            },
            Event::Empty(e) => match (&mut current, e.local_name().as_ref()) {
                (Some(c), b"References") => record_reference(c, &e)?,
                (None, b"Element") => {}
                _ => {}
            },
            Event::End(e) => match (&mut current, e.local_name().as_ref()) {
                (Some(c), b"Element") if c.nested_elements > 0 => c.nested_elements -= 1,
                (Some(_), b"Element") => {
                    if let Some(constraint) = current.take().and_then(PartialConstraint::finish) {
                        constraints.push(constraint);
                    }
                }
                (Some(c), b"Relationship") if c.nested_elements == 0 => c.relationship = None,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(constraints)
}

fn record_reference(constraint: &mut PartialConstraint, e: &BytesStart<'_>) -> Result<()> {
    if constraint.nested_elements > 0 {
        return Ok(());
    }
    let Some(name) = attribute(e, "Name")? else {
        return Ok(());
    };
    match constraint.relationship.as_deref() {
        Some("DefiningTable") => constraint.table = Some(split_identifier(&name)),
        Some("ForColumn") => constraint.column = Some(split_identifier(&name)),
        _ => {}
    }
    Ok(())
}

fn attribute(e: &BytesStart<'_>, name: &str) -> Result<Option<String>> {
    match e.try_get_attribute(name)? {
        Some(attr) => Ok(Some(attr.unescape_value()?.into_owned())),
        None => Ok(None),
    }
}

/// Split `[dbo].[Book].[Price]` into its parts, honoring `]]` escapes.
pub fn split_identifier(name: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_brackets = false;
    let mut chars = name.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '[' if !in_brackets => in_brackets = true,
            ']' if in_brackets => {
                if chars.peek() == Some(&']') {
                    current.push(']');
                    chars.next();
                } else {
                    in_brackets = false;
                }
            }
            '.' if !in_brackets => parts.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    parts.push(current);
    parts
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;

    pub(crate) const MODEL: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<DataSchemaModel FileFormatVersion="1.2" SchemaVersion="2.9" DspName="Microsoft.Data.Tools.Schema.Sql.Sql150DatabaseSchemaProvider" xmlns="http://schemas.microsoft.com/sqlserver/dac/Serialization/2012/02">
  <Model>
    <Element Type="SqlTable" Name="[dbo].[Author]">
      <Relationship Name="Columns">
        <Entry>
          <Element Type="SqlSimpleColumn" Name="[dbo].[Author].[Birthday]">
            <Relationship Name="TypeSpecifier">
              <Entry>
                <Element Type="SqlTypeSpecifier">
                  <Relationship Name="Type">
                    <Entry>
                      <References ExternalSource="BuiltIns" Name="[date]" />
                    </Entry>
                  </Relationship>
                </Element>
              </Entry>
            </Relationship>
          </Element>
        </Entry>
      </Relationship>
    </Element>
    <Element Type="SqlDefaultConstraint">
      <Property Name="DefaultExpressionScript">
        <Value><![CDATA[GETDATE()]]></Value>
      </Property>
      <Relationship Name="DefiningTable">
        <Entry>
          <References Name="[dbo].[Author]" />
        </Entry>
      </Relationship>
      <Relationship Name="ForColumn">
        <Entry>
          <References Name="[dbo].[Author].[Birthday]" />
        </Entry>
      </Relationship>
    </Element>
    <Element Type="SqlDefaultConstraint" Name="[dbo].[DF_Book_Price]">
      <Relationship Name="DefiningTable">
        <Entry>
          <References Name="[dbo].[Book]" />
        </Entry>
      </Relationship>
      <Relationship Name="ForColumn">
        <Entry>
          <References Name="[dbo].[Book].[Price]" />
        </Entry>
      </Relationship>
    </Element>
  </Model>
</DataSchemaModel>"#;

    pub(crate) fn write_dacpac(path: &Path, model: &str, pre_deploy: Option<&str>) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::FileOptions::default();
        zip.start_file(MODEL_ENTRY, options).unwrap();
        zip.write_all(model.as_bytes()).unwrap();
        if let Some(script) = pre_deploy {
            zip.start_file(PRE_DEPLOY_ENTRY, options).unwrap();
            zip.write_all(script.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_parse_default_constraints() {
        let constraints = parse_default_constraints(MODEL).unwrap();
        assert_eq!(
            constraints,
            vec![
                DefaultConstraint::new("dbo", "Author", "Birthday", None),
                DefaultConstraint::new("dbo", "Book", "Price", Some("DF_Book_Price".into())),
            ]
        );
    }

    #[test]
    fn test_split_identifier() {
        assert_eq!(split_identifier("[dbo].[Book].[Price]"), vec!["dbo", "Book", "Price"]);
        assert_eq!(split_identifier("[dbo].[We]]ird.Name]"), vec!["dbo", "We]ird.Name"]);
    }

    #[test]
    fn test_read_dacpac() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Db.dacpac");
        write_dacpac(&path, MODEL, Some("PRINT N'pre';"));

        let contents = read_dacpac(&path).unwrap();
        assert!(contents.model.contains("SqlDefaultConstraint"));
        assert_eq!(contents.pre_deployment_script.as_deref(), Some("PRINT N'pre';"));
        assert!(contents.post_deployment_script.is_none());
    }

    #[test]
    fn test_read_dacpac_without_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Broken.dacpac");
        let mut zip = zip::ZipWriter::new(File::create(&path).unwrap());
        zip.start_file("Origin.xml", zip::write::FileOptions::default()).unwrap();
        zip.finish().unwrap();

        assert!(matches!(read_dacpac(&path), Err(LifecycleError::Archive(_))));
    }
}
