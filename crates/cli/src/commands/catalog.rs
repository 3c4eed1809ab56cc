//! Category tree output.

use std::fmt::Write;

use saleso_core::catalog::CategoryTree;
use saleso_core::{Category, CategoryId};

use super::{CliError, client};

/// Print the category tree, or the breadcrumb to one category.
#[allow(clippy::print_stdout)]
pub async fn categories(path_to: Option<&str>) -> Result<(), CliError> {
    let tree = client()?.categories().await?;

    if let Some(id) = path_to {
        let id = CategoryId::new(id);
        let path = tree
            .path_to(&id)
            .ok_or_else(|| CliError::InvalidInput(format!("unknown category '{id}'")))?;
        let names: Vec<&str> = path.iter().map(|c| c.name.as_str()).collect();
        println!("{}", names.join(" > "));
        return Ok(());
    }

    print!("{}", render(&tree));
    Ok(())
}

fn render(tree: &CategoryTree) -> String {
    fn walk(out: &mut String, nodes: &[Category], depth: usize) {
        for node in nodes {
            let _ = writeln!(out, "{:indent$}{} ({})", "", node.name, node.id, indent = depth * 2);
            walk(out, &node.children, depth + 1);
        }
    }

    let mut out = String::new();
    walk(&mut out, tree.roots(), 0);
    out
}
