//! Custom header and footer.
//!
//! Both texts may use `{PREVIOUS_VERSION}` and `{NEXT_VERSION}`; the latter
//! is `latest` for create-latest runs.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{ModifierOutcome, ModifierPriority, ScriptModifier};
use crate::error::Result;
use crate::script::pipeline::ScriptModificationModel;

const PREVIOUS_VERSION_KEYWORD: &str = "{PREVIOUS_VERSION}";
const NEXT_VERSION_KEYWORD: &str = "{NEXT_VERSION}";

fn substitute_keywords(text: &str, model: &ScriptModificationModel) -> Result<String> {
    Ok(text
        .replace(PREVIOUS_VERSION_KEYWORD, &model.formatted_previous_version())
        .replace(NEXT_VERSION_KEYWORD, &model.formatted_next_version()?))
}

pub struct CustomHeaderModifier;

#[async_trait]
impl ScriptModifier for CustomHeaderModifier {
    fn priority(&self) -> ModifierPriority {
        ModifierPriority::AddCustomHeader
    }

    async fn modify(
        &self,
        script: String,
        model: &ScriptModificationModel,
        _cancel: &CancellationToken,
    ) -> Result<ModifierOutcome> {
        let header = substitute_keywords(&model.configuration.custom_header, model)?;
        let mut modified = String::with_capacity(header.len() + script.len() + 1);
        modified.push_str(&header);
        if !header.ends_with('\n') {
            modified.push('\n');
        }
        modified.push_str(&script);
        Ok(ModifierOutcome::Modified(modified))
    }
}

pub struct CustomFooterModifier;

#[async_trait]
impl ScriptModifier for CustomFooterModifier {
    fn priority(&self) -> ModifierPriority {
        ModifierPriority::AddCustomFooter
    }

    async fn modify(
        &self,
        mut script: String,
        model: &ScriptModificationModel,
        _cancel: &CancellationToken,
    ) -> Result<ModifierOutcome> {
        let footer = substitute_keywords(&model.configuration.custom_footer, model)?;
        if !script.is_empty() && !script.ends_with('\n') {
            script.push('\n');
        }
        script.push_str(&footer);
        Ok(ModifierOutcome::Modified(script))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::pipeline::tests::model;

    #[tokio::test]
    async fn test_header_substitutes_versions() {
        let mut model = model("PRINT 1;\n");
        model.configuration.custom_header = "-- {PREVIOUS_VERSION} -> {NEXT_VERSION}".to_string();

        let outcome = CustomHeaderModifier
            .modify("PRINT 1;\n".to_string(), &model, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(
            outcome,
            ModifierOutcome::Modified("-- 1.0.0.0 -> 1.1.0.0\nPRINT 1;\n".to_string())
        );
    }

    #[tokio::test]
    async fn test_footer_for_latest() {
        let mut model = model("PRINT 1;");
        model.create_latest = true;
        model.configuration.custom_footer = "-- next: {NEXT_VERSION}\n".to_string();

        let outcome = CustomFooterModifier
            .modify("PRINT 1;".to_string(), &model, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(
            outcome,
            ModifierOutcome::Modified("PRINT 1;\n-- next: latest\n".to_string())
        );
    }
}
