use anyhow::Result;
use colored::Colorize;
use power_probe::{DeviceTree, NodeId, Session, TargetStatus};

#[derive(clap::Parser)]
pub struct Cmd {}

impl Cmd {
    pub fn run(&self, session: &Session) -> Result<usize> {
        let tree = session.tree();
        let mut shown = 0;
        print_node(tree, tree.root(), 0, &mut shown)?;

        println!();
        println!("Note that only selected targets will be shown above. If none are shown");
        println!("try adding '-a' to select all targets.");

        Ok(shown)
    }
}

/// Print a node and recurse into its children. Disabled subtrees are
/// skipped entirely. Hidden nodes are not printed, but their children
/// still are, one level deeper.
fn print_node(tree: &DeviceTree, node: NodeId, level: usize, shown: &mut usize) -> Result<()> {
    let status = tree.status(node)?;
    if status == TargetStatus::Disabled || status == TargetStatus::Nonexistent {
        return Ok(());
    }

    if status != TargetStatus::Hidden {
        let indent = "    ".repeat(level);
        let prefix = match tree.class_name(node) {
            "pib" => Some('p'),
            "chiplet" => Some('c'),
            "thread" => Some('t'),
            _ => None,
        };
        match prefix {
            Some(class) if tree.index(node) >= 0 => {
                let label = format!("{class}{}:", tree.index(node));
                println!("{indent}{} {}", label.cyan(), tree.name(node));
            }
            _ => println!("{indent}{}", tree.name(node)),
        }
        // The root is always printed; it does not count as a found target.
        if node != tree.root() {
            *shown += 1;
        }
    }

    for &child in tree.children(node) {
        print_node(tree, child, level + 1, shown)?;
    }

    Ok(())
}
