use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::query::TreeNode;

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let Some(data_value) = data {
                response["data"] = data_value;
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an empty collection in the appropriate format
pub fn output_empty_collection(output_format: &OutputFormat, collection_name: &str, message: &str) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    collection_name: []
                }))?
            );
        }
        OutputFormat::Text => {
            println!("{}", message);
        }
    }
    Ok(())
}

/// Indented text rendering of a forest, one node per line
pub fn format_forest(forest: &[TreeNode]) -> String {
    let mut out = String::new();
    let mut stack: Vec<(&TreeNode, usize)> = forest.iter().rev().map(|root| (root, 0)).collect();

    while let Some((tree, depth)) = stack.pop() {
        out.push_str(&"  ".repeat(depth));
        out.push_str(&format!(
            "{} [{}, level {}] {}\n",
            tree.node.name, tree.node.kind, tree.node.level, tree.node.id
        ));
        stack.extend(tree.children.iter().rev().map(|child| (child, depth + 1)));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CreateObjectInput, ObjectKind, ObjectNode};
    use crate::query::build_forest;

    #[test]
    fn forest_text_indents_children() {
        let now = chrono::Utc::now();
        let root = ObjectNode::from_input(CreateObjectInput::new("Plant", ObjectKind::Organization, 0), now);
        let child = ObjectNode::from_input(
            CreateObjectInput::new("Line 1", ObjectKind::Unit, 1).with_parent(root.id),
            now + chrono::Duration::seconds(1),
        );

        let text = format_forest(&build_forest(&[root, child]));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Plant [Organization, level 0]"));
        assert!(lines[1].starts_with("  Line 1 [Unit, level 1]"));
    }
}
